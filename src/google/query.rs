//! Drive `q` search expression builder.

pub const MIME_TYPE_FOLDER: &str = "application/vnd.google-apps.folder";
pub const MIME_TYPE_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const MIME_TYPE_HTML: &str = "text/html";

/// Conditions joined with `and`.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    conditions: Vec<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.conditions
            .push(format!("mimeType = '{}'", escape(mime_type)));
        self
    }

    pub fn is_folder(self) -> Self {
        self.mime_type(MIME_TYPE_FOLDER)
    }

    pub fn in_parent(mut self, parent_id: &str) -> Self {
        self.conditions
            .push(format!("'{}' in parents", escape(parent_id)));
        self
    }

    pub fn not_trashed(mut self) -> Self {
        self.conditions.push("trashed = false".to_string());
        self
    }

    pub fn build(&self) -> String {
        self.conditions.join(" and ")
    }
}

/// Query for the immediate subfolders of `parent_id`.
pub fn subfolders_query(parent_id: &str) -> String {
    QueryBuilder::new().is_folder().in_parent(parent_id).not_trashed().build()
}

/// Query for the Google Docs directly inside `parent_id`.
pub fn documents_query(parent_id: &str) -> String {
    QueryBuilder::new()
        .not_trashed()
        .in_parent(parent_id)
        .mime_type(MIME_TYPE_DOCUMENT)
        .build()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
