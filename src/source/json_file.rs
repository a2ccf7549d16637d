use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::info;
use serde_json::Value;

use super::{documents::parse_document, RecordSource};
use crate::db::{Database, Record};

/// Reads a JSON export (an array of documents) on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    value_field: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, value_field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value_field: value_field.into(),
        }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch_records(&self) -> Result<Vec<Record>> {
        read_documents(&self.path, &self.value_field).await
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// Loads a JSON export into the store. Returns how many records were written.
pub async fn import_documents(db: &Database, path: &Path, value_field: &str) -> Result<usize> {
    let records = read_documents(path, value_field).await?;
    let undated = records.iter().filter(|r| r.timestamp.is_none()).count();
    let stored = db.insert_records(records).await?;

    info!(
        "Imported {} records from {} ({} without a usable timestamp)",
        stored.len(),
        path.display(),
        undated
    );
    Ok(stored.len())
}

async fn read_documents(path: &Path, value_field: &str) -> Result<Vec<Record>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read documents from {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse documents in {}", path.display()))?;

    let documents = match parsed {
        Value::Array(documents) => documents,
        Value::Object(mut wrapper) => match wrapper.remove("documents") {
            Some(Value::Array(documents)) => documents,
            _ => bail!(
                "{} must contain an array of documents or a \"documents\" array",
                path.display()
            ),
        },
        _ => bail!("{} must contain an array of documents", path.display()),
    };

    Ok(documents
        .iter()
        .map(|document| parse_document(document, value_field))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DEFAULT_VALUE_FIELD;
    use tempfile::TempDir;

    const EXPORT: &str = r#"[
        {"timestamp": "2024-03-04T10:00:00Z", "TOXCITY_SCORE": 0.2},
        {"timestamp": {"seconds": 1709546400, "nanoseconds": 0}, "TOXCITY_SCORE": 0.8},
        {"timestamp": "garbage", "TOXCITY_SCORE": 0.4},
        {"text": "no timestamp at all"}
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn fetch_keeps_malformed_documents_as_partial_records() {
        let dir = TempDir::new().unwrap();
        let source = JsonFileSource::new(write(&dir, "tweets.json", EXPORT), DEFAULT_VALUE_FIELD);

        let records = source.fetch_records().await.unwrap();
        assert_eq!(records.len(), 4);
        assert!(records[0].timestamp.is_some());
        assert_eq!(records[1].value, Some(0.8));
        assert_eq!(records[2].timestamp, None);
        assert_eq!(records[3].value, None);
        assert!(source.describe().starts_with("json:"));
    }

    #[tokio::test]
    async fn wrapped_document_arrays_are_accepted() {
        let dir = TempDir::new().unwrap();
        let wrapped = format!("{{\"documents\": {EXPORT}}}");
        let source = JsonFileSource::new(write(&dir, "wrapped.json", &wrapped), DEFAULT_VALUE_FIELD);

        assert_eq!(source.fetch_records().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unreadable_file_fails_the_fetch() {
        let dir = TempDir::new().unwrap();
        let missing = JsonFileSource::new(dir.path().join("absent.json"), DEFAULT_VALUE_FIELD);
        assert!(missing.fetch_records().await.is_err());

        let scalar = JsonFileSource::new(write(&dir, "scalar.json", "42"), DEFAULT_VALUE_FIELD);
        assert!(scalar.fetch_records().await.is_err());
    }

    #[tokio::test]
    async fn import_writes_every_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tweets.json", EXPORT);
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();

        let imported = import_documents(&db, &path, DEFAULT_VALUE_FIELD).await.unwrap();
        assert_eq!(imported, 4);
        assert_eq!(db.fetch_records().await.unwrap().len(), 4);
    }
}
