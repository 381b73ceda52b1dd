//! End-to-end behaviour of the chunked session log

use serde_json::json;
use synthlog_session::{
    ChunkedLog, LogConfig, LogRecord, RecordId, SessionDirectory, SessionIndex,
};
use synthlog_storage::{FileStore, KeyValueStore, MemoryStore};
use tempfile::TempDir;

fn log_with_capacity(capacity: usize) -> ChunkedLog<MemoryStore> {
    ChunkedLog::with_config(MemoryStore::new(), LogConfig::with_chunk_capacity(capacity))
        .expect("valid config")
}

fn named(name: &str) -> LogRecord {
    LogRecord::new(name).with_field("prompt", format!("prompt for {name}"))
}

fn ids(records: &[LogRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.to_string()).collect()
}

fn raw_chunk(store: &impl KeyValueStore, key: &str) -> Vec<String> {
    let value = store.get(key).expect("chunk should exist");
    let records: Vec<LogRecord> = serde_json::from_str(&value).expect("chunk should decode");
    ids(&records)
}

#[test]
fn appends_are_counted_and_exported_in_order() {
    let log = log_with_capacity(50);
    let names: Vec<String> = (0..137).map(|i| format!("r{i}")).collect();

    for name in &names {
        log.append("session", named(name)).unwrap();
    }

    assert_eq!(log.total_count("session"), 137);
    assert_eq!(ids(&log.get_all_logs("session")), names);

    let stats = log.session_stats("session").unwrap().unwrap();
    assert_eq!(stats.last_chunk_id, 2);
    assert_eq!(stats.chunk_count, 3);
}

#[test]
fn full_chunks_roll_over() {
    let log = log_with_capacity(2);
    for name in ["a", "b", "c"] {
        log.append("s", named(name)).unwrap();
    }

    assert_eq!(raw_chunk(log.store(), "synth_logs_s_chunk_0"), vec!["a", "b"]);
    assert_eq!(raw_chunk(log.store(), "synth_logs_s_chunk_1"), vec!["c"]);

    let index: SessionIndex =
        serde_json::from_str(&log.store().get("synth_logs_s_index").unwrap()).unwrap();
    assert_eq!(index.total_count, 3);
    assert_eq!(index.last_chunk_id, Some(1));
}

#[test]
fn pages_partition_newest_first() {
    let log = log_with_capacity(2);
    for name in ["a", "b", "c", "d", "e"] {
        log.append("s", named(name)).unwrap();
    }

    assert_eq!(ids(&log.get_logs("s", 1, 2)), vec!["e", "d"]);
    assert_eq!(ids(&log.get_logs("s", 2, 2)), vec!["c", "b"]);
    assert_eq!(ids(&log.get_logs("s", 3, 2)), vec!["a"]);
    assert!(log.get_logs("s", 4, 2).is_empty());
}

#[test]
fn pages_cover_every_record_exactly_once() {
    for capacity in [1, 3, 7, 50] {
        let log = log_with_capacity(capacity);
        let names: Vec<String> = (0..41).map(|i| format!("r{i}")).collect();
        for name in &names {
            log.append("s", named(name)).unwrap();
        }

        for page_size in [1, 4, 10, 41, 100] {
            let mut collected = Vec::new();
            let mut page = 1;
            loop {
                let records = log.get_logs("s", page, page_size);
                if records.is_empty() {
                    break;
                }
                assert!(records.len() as u64 <= page_size);
                collected.extend(ids(&records));
                page += 1;
            }

            let mut newest_first = names.clone();
            newest_first.reverse();
            assert_eq!(
                collected, newest_first,
                "capacity {capacity}, page size {page_size}"
            );
        }
    }
}

#[test]
fn update_preserves_count_and_position() {
    let log = log_with_capacity(2);
    for id in 1..=3_i64 {
        log.append("s", LogRecord::new(id).with_field("payload", format!("p{id}")))
            .unwrap();
    }

    let replacement = LogRecord::new(2_i64).with_field("payload", "x");
    assert!(log.update_log("s", replacement.clone()).unwrap());

    let all = log.get_all_logs("s");
    assert_eq!(log.total_count("s"), 3);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].field("payload"), Some(&json!("p1")));
    assert_eq!(all[1], replacement);
    assert_eq!(all[2].field("payload"), Some(&json!("p3")));
}

#[test]
fn update_of_unknown_id_changes_nothing() {
    let log = log_with_capacity(2);
    for id in 1..=3_i64 {
        log.append("s", LogRecord::new(id)).unwrap();
    }
    let snapshot: Vec<Option<String>> = log
        .store()
        .list_keys()
        .iter()
        .map(|k| log.store().get(k))
        .collect();

    assert!(!log.update_log("s", LogRecord::new(42_i64)).unwrap());
    // A numeric id never matches a textual one
    assert!(!log.update_log("s", LogRecord::new("1")).unwrap());

    let after: Vec<Option<String>> = log
        .store()
        .list_keys()
        .iter()
        .map(|k| log.store().get(k))
        .collect();
    assert_eq!(snapshot.len(), after.len());
    for value in &snapshot {
        assert!(after.contains(value));
    }
}

#[test]
fn clear_then_append_starts_fresh() {
    let log = log_with_capacity(2);
    for name in ["a", "b", "c"] {
        log.append("s", named(name)).unwrap();
    }

    log.clear_session("s").unwrap();
    assert_eq!(log.total_count("s"), 0);
    assert!(log.get_all_logs("s").is_empty());
    assert!(log.store().list_keys().is_empty());

    let receipt = log.append("s", named("z")).unwrap();
    assert_eq!(receipt.chunk_id, 0);
    assert_eq!(raw_chunk(log.store(), "synth_logs_s_chunk_0"), vec!["z"]);
    assert_eq!(log.total_count("s"), 1);
}

#[test]
fn legacy_index_is_recovered_on_export() {
    let log = log_with_capacity(2);
    let store = log.store();
    store
        .set("synth_logs_legacy_index", r#"{"totalCount":5}"#.to_string())
        .unwrap();
    store
        .set("synth_logs_legacy_chunk_0", json!([{"id": 1}, {"id": 2}]).to_string())
        .unwrap();
    store
        .set("synth_logs_legacy_chunk_1", json!([{"id": 3}, {"id": 4}]).to_string())
        .unwrap();
    store
        .set("synth_logs_legacy_chunk_2", json!([{"id": 5}]).to_string())
        .unwrap();

    let report = log.export_session("legacy").unwrap();
    assert!(report.is_complete());
    assert_eq!(ids(&report.records), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(report.chunks_read, 3);
}

#[test]
fn cleared_sessions_leave_the_directory() {
    let log = log_with_capacity(2);
    log.append("s1", named("a")).unwrap();
    log.append("s2", named("b")).unwrap();

    log.clear_session("s1").unwrap();

    let sessions: Vec<String> = log.list_sessions().into_iter().collect();
    assert_eq!(sessions, vec!["s2".to_string()]);
}

#[test]
fn sessions_do_not_interfere() {
    let log = log_with_capacity(2);
    for i in 0..5_i64 {
        log.append("left", LogRecord::new(i)).unwrap();
        log.append("right", LogRecord::new(100 + i)).unwrap();
    }

    assert!(log.update_log("left", LogRecord::new(100_i64)).is_ok_and(|found| !found));
    assert_eq!(log.get_logs("right", 1, 1)[0].id, RecordId::from(104_i64));
    assert_eq!(log.total_count("left"), 5);
}

#[test]
fn file_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logs.json");
    let config = LogConfig::with_chunk_capacity(3);

    {
        let log = ChunkedLog::with_config(FileStore::open(&path).unwrap(), config.clone()).unwrap();
        for i in 0..7_i64 {
            log.append("persisted", LogRecord::new(i)).unwrap();
        }
        assert!(log
            .update_log("persisted", LogRecord::new(3_i64).with_field("retried", true))
            .unwrap());
    }

    let log = ChunkedLog::with_config(FileStore::open(&path).unwrap(), config).unwrap();
    assert_eq!(log.total_count("persisted"), 7);
    assert_eq!(
        ids(&log.get_logs("persisted", 1, 3)),
        vec!["6", "5", "4"]
    );
    assert_eq!(
        log.get_all_logs("persisted")[3].field("retried"),
        Some(&json!(true))
    );

    let sessions: Vec<String> = log.list_sessions().into_iter().collect();
    assert_eq!(sessions, vec!["persisted".to_string()]);
}

#[test]
fn reads_data_written_by_the_browser_app() {
    // Values exactly as the browser app writes them
    let store = MemoryStore::new();
    store
        .set(
            "synth_logs_8f3c_index",
            r#"{"totalCount":2,"lastChunkId":0}"#.to_string(),
        )
        .unwrap();
    store
        .set(
            "synth_logs_8f3c_chunk_0",
            json!([
                {"id": 1718000000001_u64, "status": "success", "output": "hello"},
                {"id": 1718000000002_u64, "status": "error", "error": "timeout"}
            ])
            .to_string(),
        )
        .unwrap();

    let log = ChunkedLog::new(store);
    let newest = log.get_logs("8f3c", 1, 50);
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[0].field("status"), Some(&json!("error")));

    assert!(log
        .update_log(
            "8f3c",
            LogRecord::new(1718000000002_u64).with_field("status", "success")
        )
        .unwrap());
    assert_eq!(log.get_all_logs("8f3c")[1].field("status"), Some(&json!("success")));
}
