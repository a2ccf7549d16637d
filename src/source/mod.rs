//! Where records come from.
//!
//! A refresh cycle asks its source for the full current record set; sources
//! never filter or aggregate.

mod documents;
mod json_file;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::{Database, Record};

pub use documents::{parse_document, parse_timestamp_value, DEFAULT_VALUE_FIELD};
pub use json_file::{import_documents, JsonFileSource};

#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<Record>>;

    /// Short human-readable name for logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl RecordSource for Database {
    async fn fetch_records(&self) -> Result<Vec<Record>> {
        self.list_records().await
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path().display())
    }
}
