//! Command-line arguments.
use clap::{Parser, Subcommand};

use specs_sync::models::{SortDirection, SpecOrderBy, SpecQuery};

#[derive(Parser, Debug)]
#[command(
    name = "specs-sync",
    version,
    about = "Sync spec metadata from Google Drive and reject stale drafts",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest every spec document under the root folder
    Sync(SyncArgs),
    /// Mark long-idle drafts as rejected
    Reject(RejectArgs),
    /// Print a page of stored specs as JSON
    Specs(SpecsArgs),
    /// Print every distinct author as JSON
    Authors,
    /// Print every distinct team as JSON
    Teams,
}

#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Re-extract every document, even when unchanged since the last sync
    #[arg(long)]
    pub force: bool,

    /// Run a single traversal and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Debug)]
pub struct RejectArgs {
    /// Log what would be rejected without touching documents or the database
    #[arg(long)]
    pub dry_run: bool,

    /// Reject the spec stored for one Google Doc id
    #[arg(long, value_name = "ID")]
    pub doc_id: Option<String>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Debug)]
pub struct SpecsArgs {
    /// Page size, 1 to 100
    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// created_at, updated_at, title, team or id
    #[arg(long, default_value = "created_at")]
    pub order_by: SpecOrderBy,

    /// asc or desc; timestamps default to desc, other fields to asc
    #[arg(long)]
    pub order_dir: Option<SortDirection>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub team: Option<String>,

    /// Spec type, repeatable or comma-separated
    #[arg(long = "type", value_delimiter = ',')]
    pub spec_types: Vec<String>,

    /// Status, case-insensitive, repeatable or comma-separated
    #[arg(long = "status", value_delimiter = ',')]
    pub statuses: Vec<String>,

    #[arg(long)]
    pub author: Option<String>,

    /// Free text over id, title, team and document name
    #[arg(long)]
    pub search: Option<String>,
}

impl SpecsArgs {
    pub fn into_query(self) -> SpecQuery {
        SpecQuery {
            limit: self.limit,
            offset: self.offset,
            order_by: self.order_by,
            order_dir: self.order_dir,
            title: self.title,
            team: self.team,
            spec_types: self.spec_types,
            statuses: self.statuses,
            author: self.author,
            search: self.search,
        }
    }
}
