use std::fs::File;
use std::io::Write;
use std::path::Path;

use flight_fare::app::pipeline::DataIngestionPipeline;
use flight_fare::app::registry::{RunLock, RunRegistry};
use flight_fare::app::{HISTORY_FILE_NAME, ingest};
use flight_fare::domain::{IngestionConfig, ParsedRecord, SplitConfig, Stage};
use flight_fare::error::{IngestError, exit_code};
use flight_fare::features::bin_price;

const HEADER: &str =
    "Airline,Date_of_Journey,Source,Destination,Route,Dep_Time,Arrival_Time,Duration,Total_Stops,Additional_Info,Price";

/// Ten listings from two airlines: six priced in stratum 1, four in stratum 2.
fn ten_rows() -> Vec<String> {
    let prices = [1200, 1500, 1759, 900, 1650, 1100, 3897, 5277, 4100, 2500];
    let durations = ["2h 50m", "4h", "30m", "1h 5m", "19h", "2h 15m", "7h 25m", "5m", "3h", "12h 40m"];
    prices
        .iter()
        .zip(durations)
        .enumerate()
        .map(|(i, (price, duration))| {
            let airline = if i % 2 == 0 { "IndiGo" } else { "Air India" };
            let stops = if i % 3 == 0 { "non-stop" } else { "1 stop" };
            format!(
                "{airline},{day}/03/2019,Banglore,New Delhi,BLR → DEL,22:{min:02},01:10 {day} Mar,{duration},{stops},No info,{price}",
                day = i + 1,
                min = i * 5,
            )
        })
        .collect()
}

fn write_archive(path: &Path, entry: &str, rows: &[String]) {
    let mut body = String::from(HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }

    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    zip.start_file(entry, zip::write::FileOptions::default()).unwrap();
    zip.write_all(body.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn config_in(root: &Path, archive: &Path) -> IngestionConfig {
    IngestionConfig {
        source_url: archive.display().to_string(),
        download_dir: root.join("tgz_data"),
        archive_file_name: "flight.zip".to_string(),
        raw_data_dir: root.join("raw_data"),
        dataset_file: None,
        train_dir: root.join("ingested_data").join("train"),
        test_dir: root.join("ingested_data").join("test"),
        split: SplitConfig::default(),
    }
}

fn read_back(path: &Path) -> Vec<ParsedRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn ten_row_dataset_splits_eight_two_with_both_strata_on_each_side() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "Data_Train.csv", &ten_rows());

    let mut stages = Vec::new();
    let mut pipeline = DataIngestionPipeline::new(config_in(&dir.path().join("run"), &archive));
    let result = pipeline.run_observed(|s| stages.push(s)).unwrap();

    assert!(result.succeeded);
    assert_eq!(result.train_records.len(), 8);
    assert_eq!(result.test_records.len(), 2);
    for label in [1, 2] {
        assert!(result.train_records.iter().any(|r| bin_price(r.price).label() == label));
        assert!(result.test_records.iter().any(|r| bin_price(r.price).label() == label));
    }

    assert_eq!(
        stages,
        [
            Stage::Downloading,
            Stage::Extracting,
            Stage::Parsing,
            Stage::Binning,
            Stage::Splitting,
            Stage::Persisting,
            Stage::Done,
        ]
    );
    assert_eq!(pipeline.stage(), Stage::Done);

    assert!(result.train_file_path.ends_with("ingested_data/train/Data_Train.csv"));
    assert!(result.test_file_path.ends_with("ingested_data/test/Data_Train.csv"));
    assert_eq!(read_back(&result.train_file_path), result.train_records);
    assert_eq!(read_back(&result.test_file_path), result.test_records);

    let mut prices: Vec<i64> = result
        .train_records
        .iter()
        .chain(&result.test_records)
        .map(|r| r.price)
        .collect();
    prices.sort_unstable();
    assert_eq!(prices, [900, 1100, 1200, 1500, 1650, 1759, 2500, 3897, 4100, 5277]);
}

#[test]
fn parsed_fields_follow_the_raw_listing() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());

    let result = DataIngestionPipeline::new(config_in(dir.path(), &archive)).run().unwrap();
    let all: Vec<&ParsedRecord> = result.train_records.iter().chain(&result.test_records).collect();

    let minutes_only = all.iter().find(|r| r.price == 5277).unwrap();
    assert_eq!((minutes_only.duration_hours, minutes_only.duration_mins), (0, 5));
    assert_eq!((minutes_only.journey_date, minutes_only.journey_month), (8, 3));
    assert_eq!((minutes_only.dep_hour, minutes_only.dep_min), (22, 35));

    let hours_only = all.iter().find(|r| r.price == 1650).unwrap();
    assert_eq!((hours_only.duration_hours, hours_only.duration_mins), (19, 0));
    assert_eq!((hours_only.arrival_hour, hours_only.arrival_min), (1, 10));
    assert_eq!(hours_only.total_stops, 1);

    assert!(all.iter().all(|r| r.journey_month == 3));
}

#[test]
fn same_seed_gives_same_partition() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());

    let a = DataIngestionPipeline::new(config_in(&dir.path().join("a"), &archive)).run().unwrap();
    let b = DataIngestionPipeline::new(config_in(&dir.path().join("b"), &archive)).run().unwrap();
    assert_eq!(a.train_records, b.train_records);
    assert_eq!(a.test_records, b.test_records);
}

#[test]
fn malformed_duration_fails_the_run_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    let mut rows = ten_rows();
    rows[4] = "IndiGo,5/03/2019,Banglore,New Delhi,BLR → DEL,22:20,01:10,abc,non-stop,No info,1650".to_string();
    write_archive(&archive, "flight.csv", &rows);

    let config = config_in(dir.path(), &archive);
    let mut pipeline = DataIngestionPipeline::new(config.clone());
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage, Stage::Parsing);
    assert!(matches!(
        err.source,
        IngestError::MalformedRecord { line: 6, field: "Duration", .. }
    ));
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert!(!config.train_dir.exists());
    assert!(!config.test_dir.exists());
}

#[test]
fn unknown_stop_count_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    let mut rows = ten_rows();
    rows[0] = rows[0].replace("non-stop", "7 stops");
    write_archive(&archive, "flight.csv", &rows);

    let err = DataIngestionPipeline::new(config_in(dir.path(), &archive)).run().unwrap_err();
    assert_eq!(err.stage, Stage::Parsing);
    assert!(matches!(err.source, IngestError::UnknownCategory { line: 2, .. }));
}

#[test]
fn dataset_without_complete_rows_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    let rows = vec!["IndiGo,24/03/2019,Banglore,New Delhi,,22:20,01:10,2h 50m,non-stop,No info,3897".to_string()];
    write_archive(&archive, "flight.csv", &rows);

    let err = DataIngestionPipeline::new(config_in(dir.path(), &archive)).run().unwrap_err();
    assert_eq!(err.stage, Stage::Parsing);
    assert!(matches!(err.source, IngestError::EmptyDataset(_)));
}

#[test]
fn missing_source_fails_while_downloading() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &dir.path().join("absent.zip"));

    let err = DataIngestionPipeline::new(config).run().unwrap_err();
    assert_eq!(err.stage, Stage::Downloading);
    assert!(matches!(err.source, IngestError::Download(_)));
}

#[test]
fn registry_records_the_pipeline_run() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());

    let registry = RunRegistry::new();
    let ticket = registry.begin().unwrap();
    assert!(registry.begin().is_err());

    let mut pipeline = DataIngestionPipeline::new(config_in(dir.path(), &archive));
    let outcome = pipeline.run_observed(|stage| ticket.record_stage(stage));
    ticket.finish(&outcome);

    let history = registry.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].stage, Stage::Done);
    assert!(history[0].succeeded);
    assert!(!registry.is_running());
}

/// Make the staged history file impossible to create.
fn block_history_writes(artifact_dir: &Path) {
    let staged = artifact_dir.join(format!("{HISTORY_FILE_NAME}.partial"));
    std::fs::create_dir_all(&staged).unwrap();
    std::fs::write(staged.join("occupied"), "x").unwrap();
}

#[test]
fn unwritable_history_keeps_the_successful_result() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());
    let artifacts = dir.path().join("artifact");
    block_history_writes(&artifacts);

    let result = ingest(config_in(&artifacts.join("run"), &archive), &artifacts).unwrap();
    assert_eq!((result.train_records.len(), result.test_records.len()), (8, 2));
    assert!(result.train_file_path.is_file());
    assert!(!artifacts.join(HISTORY_FILE_NAME).exists());
    assert!(!RunLock::is_held(&artifacts));
}

#[test]
fn unwritable_history_keeps_the_pipeline_failure() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    let mut rows = ten_rows();
    rows[2] = rows[2].replace("30m", "abc");
    write_archive(&archive, "flight.csv", &rows);
    let artifacts = dir.path().join("artifact");
    block_history_writes(&artifacts);

    let err = ingest(config_in(&artifacts.join("run"), &archive), &artifacts).unwrap_err();
    assert_eq!(err.exit_code(), exit_code::DATA);
    assert!(err.to_string().contains("while parsing"));
    assert!(err.to_string().contains("Duration"));
}

#[test]
fn consecutive_ingests_share_one_history() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());
    let artifacts = dir.path().join("artifact");

    ingest(config_in(&artifacts.join("first"), &archive), &artifacts).unwrap();
    ingest(config_in(&artifacts.join("second"), &archive), &artifacts).unwrap();

    let history = RunRegistry::load(&artifacts.join(HISTORY_FILE_NAME)).unwrap().history();
    let ids: Vec<u64> = history.iter().map(|r| r.id).collect();
    assert_eq!(ids, [0, 1]);
    assert!(history.iter().all(|r| r.stage == Stage::Done && r.succeeded));
}

#[test]
fn held_lock_refuses_another_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("upstream.zip");
    write_archive(&archive, "flight.csv", &ten_rows());
    let artifacts = dir.path().join("artifact");

    let _held = RunLock::acquire(&artifacts).unwrap();
    let config = config_in(&artifacts.join("run"), &archive);
    let err = ingest(config.clone(), &artifacts).unwrap_err();

    assert_eq!(err.exit_code(), exit_code::IN_PROGRESS);
    assert!(!config.download_dir.exists());
    assert!(!artifacts.join(HISTORY_FILE_NAME).exists());
}
