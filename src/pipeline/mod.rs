pub mod reject; // Stale draft rejection
pub mod sync; // Drive folders -> spec records
pub mod table; // Metadata table extraction + layouts
