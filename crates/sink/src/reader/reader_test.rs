use super::*;
use crate::append::{AppendOptions, append_batch};
use crate::entry::Severity;
use chrono::Days;
use logjar_config::FileFormat;
use tempfile::TempDir;

fn entry(msg: &str) -> LogEntry {
    LogEntry::new(Severity::Error, msg).unwrap()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn write(dir: &Path, name: &str, batch: &[LogEntry], format: FileFormat) {
    let options = AppendOptions {
        format,
        ..AppendOptions::default()
    };
    append_batch(dir, name, batch, &options).unwrap();
}

// =============================================================================
// parse_entries
// =============================================================================

#[test]
fn test_parse_array() {
    let entries = vec![entry("a"), entry("b")];
    let bytes = serde_json::to_vec_pretty(&entries).unwrap();
    assert_eq!(parse_entries(&bytes).unwrap(), entries);
}

#[test]
fn test_parse_lines() {
    let a = entry("a");
    let b = entry("b");
    let text = format!(
        "{}\n\n{}\n",
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert_eq!(parse_entries(text.as_bytes()).unwrap(), vec![a, b]);
}

#[test]
fn test_parse_blank_is_empty() {
    assert!(parse_entries(b"").unwrap().is_empty());
    assert!(parse_entries(b" \n\t").unwrap().is_empty());
}

#[test]
fn test_parse_missing_optional_fields() {
    let json = r#"[{"Date":"2024-05-01T10:00:00Z","Type":"Warning","Message":"low disk"}]"#;
    let entries = parse_entries(json.as_bytes()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity(), Severity::Warning);
    assert_eq!(entries[0].source(), None);
    assert_eq!(entries[0].target_site(), None);
}

#[test]
fn test_parse_truncated_array_fails() {
    let result = parse_entries(br#"[{"Date":"2024-05-01T10:00:00Z","#);
    assert!(matches!(result, Err(SinkError::Serialization(_))));
}

// =============================================================================
// LogReader
// =============================================================================

#[test]
fn test_missing_directory_is_empty() {
    let temp = TempDir::new().unwrap();
    let reader = LogReader::new(temp.path().join("nope"));
    assert!(reader.files().unwrap().is_empty());
    assert!(reader.by_date(today()).unwrap().is_empty());
}

#[test]
fn test_by_date_round_trip() {
    let temp = TempDir::new().unwrap();
    let first = vec![entry("one"), entry("two")];
    let second = vec![entry("three")];
    write(temp.path(), "log_a.json", &first, FileFormat::JsonArray);
    write(temp.path(), "log_a.json", &second, FileFormat::JsonArray);

    let reader = LogReader::new(temp.path());
    let files = reader.by_date(today()).unwrap();
    assert_eq!(files.len(), 1);

    let (info, entries) = files.iter().next().unwrap();
    assert_eq!(info.name, "log_a.json");
    assert_eq!(info.size, std::fs::metadata(&info.path).unwrap().len());
    assert_eq!(entries, &[first, second].concat());
}

#[test]
fn test_by_date_excludes_other_days() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "log.json", &[entry("x")], FileFormat::JsonArray);

    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    let reader = LogReader::new(temp.path());
    assert!(reader.by_date(yesterday).unwrap().is_empty());
}

#[test]
fn test_by_range_inclusive() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.json", &[entry("a")], FileFormat::JsonArray);
    write(temp.path(), "b.jsonl", &[entry("b")], FileFormat::JsonLines);

    let reader = LogReader::new(temp.path());
    assert_eq!(reader.by_range(today(), today()).unwrap().len(), 2);

    let tomorrow = today().checked_add_days(Days::new(1)).unwrap();
    let later = today().checked_add_days(Days::new(3)).unwrap();
    assert!(reader.by_range(tomorrow, later).unwrap().is_empty());
    assert!(reader.by_range(tomorrow, today()).unwrap().is_empty());
}

#[test]
fn test_by_name_exact() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "log_20240501.json", &[entry("may")], FileFormat::JsonArray);
    write(temp.path(), "log_20240502.json", &[entry("later")], FileFormat::JsonArray);

    let reader = LogReader::new(temp.path());
    let files = reader.by_name("log_20240501.json").unwrap();
    assert_eq!(files.len(), 1);
    let entries = files.values().next().unwrap();
    assert_eq!(entries[0].message(), "may");

    assert!(reader.by_name("log_20240501").unwrap().is_empty());
}

#[test]
fn test_malformed_file_skipped() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "good.json", &[entry("fine")], FileFormat::JsonArray);
    std::fs::write(temp.path().join("bad.json"), "[{\"Message\": ").unwrap();

    let files = LogReader::new(temp.path()).by_date(today()).unwrap();
    let names: Vec<_> = files.keys().map(|info| info.name.as_str()).collect();
    assert_eq!(names, vec!["good.json"]);
}

#[test]
fn test_subdirectories_ignored() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("archive")).unwrap();
    write(temp.path(), "log.json", &[entry("x")], FileFormat::JsonArray);

    let files = LogReader::new(temp.path()).files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "log.json");
}

#[test]
fn test_read_entries_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let err = read_entries(&path).unwrap_err();
    assert!(matches!(err, SinkError::MalformedFile { .. }));
    assert!(err.to_string().contains("bad.json"));
}
