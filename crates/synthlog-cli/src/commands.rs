//! Subcommand implementations
//!
//! Each command writes its result to the given writer so it can run against
//! any store and be checked without spawning the binary.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::io::Write;
use synthlog_session::{ChunkedLog, ExportReport, LogRecord, SessionDirectory};
use synthlog_storage::KeyValueStore;

/// Output encoding for `export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// A single JSON array
    #[default]
    Json,
    /// One record per line
    Jsonl,
}

/// Parse a record given on the command line
///
/// With `generate_id`, an object without an `id` gets a fresh UUID v4.
pub fn parse_record(raw: &str, generate_id: bool) -> Result<LogRecord> {
    let mut value: Value = serde_json::from_str(raw).context("Record is not valid JSON")?;

    if generate_id
        && let Value::Object(object) = &mut value
        && !object.contains_key("id")
    {
        object.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }

    Ok(LogRecord::from_value(value)?)
}

pub fn list_sessions<S: KeyValueStore>(log: &ChunkedLog<S>, out: &mut impl Write) -> Result<()> {
    for session_uid in log.list_sessions() {
        writeln!(out, "{}", session_uid)?;
    }
    Ok(())
}

pub fn count<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{}", log.total_count(session_uid))?;
    Ok(())
}

pub fn page<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    page: u64,
    page_size: u64,
    out: &mut impl Write,
) -> Result<()> {
    let records: Vec<Value> = log
        .get_logs(session_uid, page, page_size)
        .iter()
        .map(LogRecord::to_value)
        .collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)?;
    Ok(())
}

/// Export every readable record, oldest first
///
/// Chunks that could not be read are left out and listed in the report.
pub fn export<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    format: ExportFormat,
    out: &mut impl Write,
) -> Result<ExportReport> {
    let report = log
        .export_session(session_uid)
        .with_context(|| format!("Failed to export session {}", session_uid))?;

    match format {
        ExportFormat::Json => {
            let records: Vec<Value> = report.records.iter().map(LogRecord::to_value).collect();
            serde_json::to_writer_pretty(&mut *out, &records)?;
            writeln!(out)?;
        }
        ExportFormat::Jsonl => {
            for record in &report.records {
                serde_json::to_writer(&mut *out, &record.to_value())?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;

    Ok(report)
}

pub fn append<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    raw: &str,
    generate_id: bool,
    out: &mut impl Write,
) -> Result<()> {
    let record = parse_record(raw, generate_id)?;
    let id = record.id.clone();
    let receipt = log.append(session_uid, record)?;

    tracing::info!(session_uid = %session_uid, record_id = %id, chunk_id = receipt.chunk_id, "Record appended");
    writeln!(
        out,
        "{}",
        json!({
            "id": id,
            "chunkId": receipt.chunk_id,
            "offset": receipt.offset,
            "totalCount": receipt.total_count,
        })
    )?;
    Ok(())
}

/// Replace the record with the same id; returns whether one was found
pub fn update<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    raw: &str,
    out: &mut impl Write,
) -> Result<bool> {
    let record = parse_record(raw, false)?;
    let id = record.id.clone();
    let found = log.update_log(session_uid, record)?;

    if found {
        writeln!(out, "updated {}", id)?;
    } else {
        writeln!(out, "no record with id {} in session {}", id, session_uid)?;
    }
    Ok(found)
}

pub fn clear<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    out: &mut impl Write,
) -> Result<()> {
    log.clear_session(session_uid)?;
    tracing::info!(session_uid = %session_uid, "Session cleared");
    writeln!(out, "cleared {}", session_uid)?;
    Ok(())
}

pub fn stats<S: KeyValueStore>(
    log: &ChunkedLog<S>,
    session_uid: &str,
    out: &mut impl Write,
) -> Result<()> {
    let summary = match log.session_stats(session_uid)? {
        Some(stats) => json!({
            "session": session_uid,
            "totalCount": stats.total_count,
            "lastChunkId": stats.last_chunk_id,
            "chunkCount": stats.chunk_count,
            "chunkCapacity": log.config().chunk_capacity,
            "legacyIndex": stats.legacy_index,
        }),
        None => json!({
            "session": session_uid,
            "totalCount": 0,
            "chunkCount": 0,
        }),
    };
    serde_json::to_writer_pretty(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(())
}
