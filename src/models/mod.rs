pub mod filters;
pub mod spec;

pub use filters::*;
pub use spec::*;
