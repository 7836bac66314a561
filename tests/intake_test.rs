mod common;

use agenda_staging::config::ProjectLayout;
use agenda_staging::intake::{ingest_payload, MountedDirectory};
use agenda_staging::reporter::{MemoryReporter, ReportLevel};
use common::{config_from_json, create_test_dir, write_file};

const CONFIG: &str = r#"{
    "event": {"name": "bva"},
    "input_files": {
        "main_event_registration": "data/bva/20250609_registration_BVA24_BVA25.json",
        "main_event_demographic": "data/bva/20250609_demographics_BVA24_BVA25.json"
    },
    "scan_files": {"seminars_scan_reference_past": "data/bva/scans/past_scans.csv"},
    "neo4j": {"job_stream_mapping": {"file": "data/bva/csv/job_to_stream.csv"}}
}"#;

#[tokio::test]
async fn test_ingest_routes_declared_files() {
    let temp_dir = create_test_dir();
    let payload = temp_dir.path().join("payload");
    write_file(&payload, "20250609_registration_BVA24_BVA25.json", "[]");
    write_file(&payload, "nested/past_scans.csv", "id\n");
    write_file(&payload, "Job_To_Stream.csv", "job,stream\n");
    write_file(&payload, "extra_notes.txt", "notes");

    let root = temp_dir.path().join("steps");
    let layout = ProjectLayout::new(&root);
    let data_dir = layout.data_dir();
    let reporter = MemoryReporter::new();

    let result = ingest_payload(
        &config_from_json(CONFIG),
        &layout,
        &MountedDirectory::new(&payload),
        &data_dir,
        &reporter,
    )
    .await
    .expect("Should ingest payload");

    assert_eq!(result.copied.len(), 4);
    assert!(root.join("data/bva/20250609_registration_BVA24_BVA25.json").is_file());
    assert!(root.join("data/bva/scans/past_scans.csv").is_file());
    assert!(root.join("data/bva/csv/job_to_stream.csv").is_file());
    assert!(root.join("data/bva/extra_notes.txt").is_file());

    assert_eq!(result.missing.len(), 1);
    assert_eq!(
        result.missing[0].relative_path,
        "data/bva/20250609_demographics_BVA24_BVA25.json"
    );
    assert_eq!(result.missing[0].section, "input_files");

    assert!(reporter.contains(ReportLevel::Info, "Tracking 4 config-defined input files"));
    assert!(reporter.contains(ReportLevel::Info, "Copied unmapped file"));
    assert!(reporter.contains(ReportLevel::Warn, "(section: input_files)"));
    assert!(reporter.contains(ReportLevel::Info, "Successfully processed 4 files"));
}

#[tokio::test]
async fn test_ingest_without_declarations_places_files_under_event() {
    let temp_dir = create_test_dir();
    let payload = temp_dir.path().join("payload");
    write_file(&payload, "a.csv", "a");

    let layout = ProjectLayout::new(temp_dir.path().join("steps"));
    let data_dir = layout.data_dir();
    let reporter = MemoryReporter::new();

    let result = ingest_payload(
        &config_from_json(r#"{"event": {"name": "lva"}}"#),
        &layout,
        &MountedDirectory::new(&payload),
        &data_dir,
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(result.copied, vec![data_dir.join("lva/a.csv")]);
    assert!(result.missing.is_empty());
    assert!(reporter.contains(ReportLevel::Warn, "No config-driven input files detected"));
}
