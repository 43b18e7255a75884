use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecOrderBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Team,
    Id,
}

impl SpecOrderBy {
    /// Column the ordering maps to. Created/updated order by the source
    /// document timestamps, not the local row timestamps.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "google_doc_created_at",
            Self::UpdatedAt => "google_doc_updated_at",
            Self::Title => "title",
            Self::Team => "team",
            Self::Id => "id",
        }
    }

    pub fn default_direction(&self) -> SortDirection {
        match self {
            Self::CreatedAt | Self::UpdatedAt => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

impl FromStr for SpecOrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "title" => Ok(Self::Title),
            "team" => Ok(Self::Team),
            "id" => Ok(Self::Id),
            other => Err(format!(
                "unknown order field {other:?} (expected created_at, updated_at, title, team, id)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction {other:?} (expected asc, desc)")),
        }
    }
}

/// Filter, sort and paging options for listing specs.
#[derive(Debug, Clone, Default)]
pub struct SpecQuery {
    pub limit: Option<u32>,
    pub offset: u32,
    pub order_by: SpecOrderBy,
    pub order_dir: Option<SortDirection>,
    pub title: Option<String>,
    pub team: Option<String>,
    pub spec_types: Vec<String>,
    pub statuses: Vec<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

impl SpecQuery {
    /// Limit clamped into `1..=MAX_PAGE_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn effective_direction(&self) -> SortDirection {
        self.order_dir
            .unwrap_or_else(|| self.order_by.default_direction())
    }
}
