use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::{
    helpers::parse_datetime,
    models::{Record, StoredRecord},
    Database,
};

impl Database {
    pub async fn insert_record(&self, record: &Record) -> Result<StoredRecord> {
        let mut stored = self.insert_records(vec![record.clone()]).await?;
        stored
            .pop()
            .context("record insert returned no rows")
    }

    /// Inserts `records` in one transaction, preserving their order.
    pub async fn insert_records(&self, records: Vec<Record>) -> Result<Vec<StoredRecord>> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open record insert transaction")?;
            let mut next_seq = next_seq(&tx)?;
            let created_at = Utc::now();
            let mut stored = Vec::with_capacity(records.len());

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO records (id, seq, timestamp, value, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for record in records {
                    let id = Uuid::new_v4().to_string();
                    stmt.execute(params![
                        id,
                        next_seq,
                        record.timestamp.map(|ts| ts.to_rfc3339()),
                        record.value,
                        created_at.to_rfc3339(),
                    ])
                    .with_context(|| "failed to insert record")?;
                    next_seq += 1;
                    stored.push(StoredRecord {
                        id,
                        record,
                        created_at,
                    });
                }
            }

            tx.commit().context("failed to commit record insert")?;
            Ok(stored)
        })
        .await
    }

    /// All records in insertion order. A stored timestamp that no longer
    /// parses comes back as `None` so the record is excluded downstream.
    pub async fn list_records(&self) -> Result<Vec<Record>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, value
                 FROM records
                 ORDER BY seq ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                let timestamp: Option<String> = row.get(1)?;
                let value: Option<f64> = row.get(2).unwrap_or(None);

                records.push(Record {
                    timestamp: timestamp.and_then(|raw| tolerant_timestamp(&id, &raw)),
                    value,
                });
            }

            Ok(records)
        })
        .await
    }

    pub async fn get_record(&self, id: &str) -> Result<Option<StoredRecord>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, timestamp, value, created_at FROM records WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<f64>>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, timestamp, value, created_at)) = row else {
                return Ok(None);
            };

            Ok(Some(StoredRecord {
                record: Record {
                    timestamp: timestamp.and_then(|raw| tolerant_timestamp(&id, &raw)),
                    value,
                },
                created_at: parse_datetime(&created_at, "created_at")?,
                id,
            }))
        })
        .await
    }

    pub async fn count_records(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}

fn next_seq(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM records", [], |row| {
        row.get(0)
    })
    .context("failed to read next record sequence")
}

fn tolerant_timestamp(id: &str, raw: &str) -> Option<DateTime<Utc>> {
    match parse_datetime(raw, "timestamp") {
        Ok(ts) => Some(ts),
        Err(err) => {
            warn!("record {id} has an unreadable timestamp '{raw}': {err:#}");
            None
        }
    }
}
