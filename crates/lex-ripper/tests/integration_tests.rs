//! Integration tests for the text ripper.
//!
//! These tests run whole file-backed jobs against the fixtures and check the
//! CSV that lands on disk.

use lex_ripper::filters::{BaseForm, KeepPartsOfSpeech, NormalizeWhitespace, Uppercase};
use lex_ripper::{
    ClosureProgressReporter, CsvSource, FilterError, FilterSet, FnTextFilter, Header,
    LogProgressReporter, MemorySink, MemorySource, OutputMode, Record, Ripper, RipperConfig,
    RipperError, RipperState, run,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_path().join(name)
}

/// Fresh output path that no other test uses.
fn temp_output(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lex-ripper-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn base_config(output: &PathBuf) -> lex_ripper::RipperConfigBuilder {
    RipperConfig::builder()
        .input(fixture("reviews.csv"))
        .output(output)
        .column("text")
        .progress_interval_secs(0)
}

fn read(path: &PathBuf) -> String {
    std::fs::read_to_string(path).expect("Failed to read output")
}

// ============================================================================
// End-to-end runs
// ============================================================================

#[test]
fn test_append_mode_end_to_end() {
    let output = temp_output("append.csv");
    let config = base_config(&output).build().unwrap();

    let summary = run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap();

    assert_eq!(summary.rows_processed, 3);
    assert!(!summary.replace);
    assert_eq!(
        read(&output),
        "id,text,rating,text_tokenized\n\
         1,house cat,5,house cat\n\
         2,\"The cat sat, quietly.\",4,\"The cat sat , quietly .\"\n\
         3,猫が好きです,5,猫 が 好き です\n"
    );
}

#[test]
fn test_replace_mode_with_quoted_column() {
    let output = temp_output("replace.csv");
    let config = base_config(&output)
        .replace(true)
        .quote_columns(["text"])
        .build()
        .unwrap();

    run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap();

    assert_eq!(
        read(&output),
        "id,text,rating\n\
         1,\"house cat\",5\n\
         2,\"The cat sat , quietly .\",4\n\
         3,\"猫 が 好き です\",5\n"
    );
}

#[test]
fn test_stopwords_file_removes_words() {
    let output = temp_output("stopwords.csv");
    let config = base_config(&output)
        .stopwords(fixture("stopwords.txt"))
        .separator("|")
        .build()
        .unwrap();

    run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap();

    let text = read(&output);
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows[1], "1,house cat,5,house");
    assert_eq!(rows[2], "2,\"The cat sat, quietly.\",4,\"sat|,|quietly|.\"");
}

#[test]
fn test_run_registers_filter_set() {
    let output = temp_output("filter_set.csv");
    let config = base_config(&output)
        .replace(true)
        .stopwords(fixture("stopwords.txt"))
        .build()
        .unwrap();
    let filters = FilterSet::new()
        .pre_filter(NormalizeWhitespace)
        .plugin(KeepPartsOfSpeech::new(["determiner"], true))
        .post_filter(Uppercase);

    let summary = run(&config, filters, Arc::new(LogProgressReporter)).unwrap();

    assert_eq!(summary.rows_processed, 3);
    assert_eq!(
        read(&output),
        "id,text,rating\n\
         1,HOUSE,5\n\
         2,\"SAT , QUIETLY .\",4\n\
         3,猫 好き,5\n"
    );
}

#[test]
fn test_custom_dictionary_with_token_filters() {
    let sink = MemorySink::new();
    let mut ripper = Ripper::builder()
        .source(CsvSource::open(fixture("reviews.csv")).unwrap())
        .sink(sink.clone())
        .column("text")
        .dictionary_path(fixture("dictionary.csv"))
        .progress_interval(Duration::ZERO)
        .build()
        .unwrap();

    ripper.add_pre_filter(NormalizeWhitespace).unwrap();
    ripper
        .add_plugin(KeepPartsOfSpeech::new(["noun", "adjective"], false))
        .unwrap();
    ripper.add_post_filter(BaseForm).unwrap();
    ripper.write_header(OutputMode::Replace).unwrap();
    ripper.process_stream().unwrap();
    ripper.close().unwrap();

    let texts: Vec<String> = sink
        .rows()
        .iter()
        .map(|r| r.cells[1].value.clone())
        .collect();
    assert_eq!(texts, vec!["", "", "猫 好き"]);
}

#[test]
fn test_discard_mode_with_show() {
    let config = RipperConfig::builder()
        .input(fixture("reviews.csv"))
        .column("text")
        .show(true)
        .progress_interval_secs(0)
        .build()
        .unwrap();

    let summary = run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap();
    assert_eq!(summary.rows_processed, 3);
    assert_eq!(summary.output, None);
}

#[test]
fn test_config_from_json_file() {
    let output = temp_output("from_json.csv");
    let config_path = temp_output("config.json");
    let json = serde_json::json!({
        "input": fixture("reviews.csv"),
        "output": &output,
        "column": "text",
        "mode": "replace",
        "progress_interval_secs": 0
    });
    std::fs::write(&config_path, json.to_string()).unwrap();

    let config = RipperConfig::from_json_file(&config_path).unwrap();
    let summary = run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap();

    assert!(summary.replace);
    assert!(read(&output).starts_with("id,text,rating\n1,house cat,5\n"));
}

// ============================================================================
// Setup failures
// ============================================================================

#[test]
fn test_missing_column_creates_no_output() {
    let output = temp_output("missing_column.csv");
    let config = base_config(&output).column("body").build().unwrap();

    let err = Ripper::from_config(&config).unwrap_err();

    assert!(matches!(err, RipperError::ColumnNotFound(ref c) if c == "body"));
    assert!(err.is_setup_error());
    assert!(!output.exists());
}

#[test]
fn test_malformed_dictionary_creates_no_output() {
    let output = temp_output("bad_dictionary.csv");
    let config = base_config(&output)
        .dictionary(fixture("bad_dictionary.csv"))
        .build()
        .unwrap();

    let err = Ripper::from_config(&config).unwrap_err();

    assert_eq!(err.error_code(), "DICTIONARY_LOAD_ERROR");
    assert!(err.to_string().contains("line 2"));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_file() {
    let output = temp_output("missing_input.csv");
    let config = base_config(&output)
        .input(fixture("does_not_exist.csv"))
        .build()
        .unwrap();

    let err = run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap_err();
    assert_eq!(err.error_code(), "SOURCE_READ_ERROR");
}

// ============================================================================
// Failures during processing
// ============================================================================

#[test]
fn test_ragged_row_fails_and_keeps_earlier_rows() {
    let output = temp_output("ragged.csv");
    let config = base_config(&output)
        .input(fixture("ragged.csv"))
        .replace(true)
        .build()
        .unwrap();

    let err = run(&config, FilterSet::default(), Arc::new(LogProgressReporter)).unwrap_err();

    assert_eq!(err.error_code(), "SOURCE_READ_ERROR");
    assert!(err.to_string().contains("row 2"));
    assert_eq!(read(&output), "id,text\n1,house cat\n");
}

#[test]
fn test_filter_failure_reports_unit_and_row() {
    let sink = MemorySink::new();
    let mut ripper = Ripper::builder()
        .source(CsvSource::open(fixture("reviews.csv")).unwrap())
        .sink(sink.clone())
        .column("text")
        .progress_interval(Duration::ZERO)
        .build()
        .unwrap();

    ripper
        .add_pre_filter(FnTextFilter::new("ascii-only", |text: String| {
            if text.is_ascii() {
                Ok(text)
            } else {
                Err(FilterError::new("non-ascii text"))
            }
        }))
        .unwrap();
    ripper.write_header(OutputMode::Append).unwrap();

    let err = ripper.process_stream().unwrap_err();

    assert_eq!(
        err.to_string(),
        "pre-filter 'ascii-only' failed at row 3: non-ascii text"
    );
    assert_eq!(sink.rows().len(), 2);
    assert_eq!(ripper.get_current_position(), 2);
    assert_eq!(ripper.state(), RipperState::Failed);
    assert!(ripper.is_closed());
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn test_progress_reports_while_processing() {
    let samples = Arc::new(AtomicUsize::new(0));
    let last_position = Arc::new(AtomicU64::new(0));
    let samples_clone = samples.clone();
    let last_clone = last_position.clone();

    let records: Vec<Record> = (0..20).map(|i| Record::new([format!("word {i}")])).collect();
    let mut ripper = Ripper::builder()
        .source(MemorySource::new(Header::new(["text"]), records))
        .sink(MemorySink::new())
        .column("text")
        .progress_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    ripper
        .set_progress_reporter(Arc::new(ClosureProgressReporter::new(move |sample| {
            samples_clone.fetch_add(1, Ordering::SeqCst);
            last_clone.store(sample.position, Ordering::SeqCst);
        })))
        .unwrap();
    ripper
        .add_pre_filter(FnTextFilter::new("slow", |text: String| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(text)
        }))
        .unwrap();

    ripper.write_header(OutputMode::Replace).unwrap();
    let counter = ripper.position_counter();
    let observer = std::thread::spawn(move || counter.get());

    let rows = ripper.process_stream().unwrap();
    let seen_early = observer.join().unwrap();

    assert_eq!(rows, 20);
    assert!(seen_early <= 20);
    assert!(samples.load(Ordering::SeqCst) >= 1);
    assert!(last_position.load(Ordering::SeqCst) <= 20);

    // the monitor is stopped once processing returns
    let after = samples.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(samples.load(Ordering::SeqCst), after);
}
