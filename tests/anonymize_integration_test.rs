use fleet_etl::domain::ports::Pipeline;
use fleet_etl::{AnonymizePipeline, EtlEngine, EtlError, FleetConfig, LocalStorage, TableKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PAYMENTS_CSV: &str = "\
transaction_id,driver_id,driver_first_name,driver_surname,fare_total,base_fare,surge,tax,tip,toll,payment_method,timestamp,vehicle_plate,pickup_address,status,organisation_name
a1f0c2d4-0001,drv-uuid-17,Arun,Kumar,100.00,80,0,10,10,0,Cash,2024-03-05 08:15:00,TN09AB1234,\"12 Anna Salai, Chennai\",Trip Completed Order,Chennai Cabs Pvt Ltd
a1f0c2d4-0002,drv-uuid-17,Arun,Kumar,200.00,160,20,20,0,0,Card,2024-03-05 18:40:00,TN09AB1234,Chennai International Airport,Trip Completed Order,Chennai Cabs Pvt Ltd
a1f0c2d4-0003,drv-uuid-42,Priya,Raman,300.00,240,30,30,0,0,Cash,2024-03-06 18:05:00 IST,TN10CD5678,\"T Nagar, CHENNAI\",Trip Completed Order,Chennai Cabs Pvt Ltd
a1f0c2d4-0004,,Meena,S,50.00,50,0,0,0,0,Cash,not a date,TN11EF9012,,Order Cancelled,Chennai Cabs Pvt Ltd
";

const CONFIG_TOML: &str = r#"
[anonymizer]
salt = "integration-salt"
forbidden_tokens = ["Chennai", "Arun", "Priya", "TN09AB1234"]

[[anonymizer.zones]]
contains = "Airport"
label = "Zone_Airport"
"#;

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn config() -> FleetConfig {
    FleetConfig::from_toml_str(CONFIG_TOML).unwrap()
}

fn pipeline(input: &str, output: Option<String>) -> AnonymizePipeline<LocalStorage, FleetConfig> {
    AnonymizePipeline::new(
        LocalStorage::new(".".to_string()),
        config(),
        TableKind::Payments,
        input.to_string(),
        output,
    )
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_anonymize_payments_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "payorder.csv", PAYMENTS_CSV);

    let engine = EtlEngine::new(pipeline(&input, None));
    let output = engine.run().await.unwrap();

    let expected: PathBuf = dir.path().join("payorder_anonymized.csv");
    assert_eq!(Path::new(&output), expected.as_path());

    let (headers, rows) = read_rows(&expected);
    assert_eq!(headers[1], "driver_id");
    assert_eq!(rows.len(), 4);

    let written = std::fs::read_to_string(&expected).unwrap();
    assert!(!written.to_lowercase().contains("chennai"));
    assert!(!written.contains("Arun"));
    assert!(!written.contains("drv-uuid-17"));

    // same driver -> same token, other driver -> other token
    assert_eq!(rows[0][1], rows[1][1]);
    assert_ne!(rows[0][1], rows[2][1]);
    assert!(rows[0][1].starts_with("DRIVER_"));
    assert_eq!(rows[0][1].len(), "DRIVER_".len() + 8);
    assert_eq!(rows[3][1], "DRIVER_UNKNOWN");

    // names, organisation and locations
    assert_eq!(rows[0][2], "ANON");
    assert_eq!(rows[0][3], "DRIVER");
    assert_eq!(rows[0][15], "Fleet_Operator");
    assert_eq!(rows[0][13], "Region_Metro");
    assert_eq!(rows[1][13], "Zone_Airport");
    assert_eq!(rows[3][13], "Area_Unknown");

    // 2024-03-05 shifted back 180 days
    assert_eq!(rows[0][11], "2023-09-07 08:15:00");
    assert_eq!(rows[2][11], "2023-09-08 18:05:00");
    assert_eq!(rows[3][11], "");

    // amounts pass through untouched
    assert_eq!(rows[2][4], "300.00");
    assert_eq!(rows[2][10], "Cash");

    let summary = engine.pipeline().summary().unwrap();
    assert_eq!(summary.input_rows, 4);
    assert_eq!(summary.written_rows, 4);
    assert_eq!(summary.distinct_drivers, 2);
    assert_eq!(summary.defaulted_rows, 1);
    assert_eq!(summary.defaulted_fields.get("driver_id"), Some(&1));
}

#[tokio::test]
async fn test_tokens_are_stable_across_runs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "payorder.csv", PAYMENTS_CSV);
    let first = dir.path().join("run1.csv").to_string_lossy().to_string();
    let second = dir.path().join("run2.csv").to_string_lossy().to_string();

    EtlEngine::new(pipeline(&input, Some(first.clone())))
        .run()
        .await
        .unwrap();
    EtlEngine::new(pipeline(&input, Some(second.clone())))
        .run()
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[tokio::test]
async fn test_uncovered_column_trips_privacy_guard() {
    let dir = TempDir::new().unwrap();
    let csv = "\
trip_id,distance_km,duration_min,status,service_type,fare,timestamp,notes
R1,5.2,14,completed,Go,120,2024-03-05 08:15:00,picked up near Chennai Central
";
    let input = write_input(&dir, "trips.csv", csv);
    let output = dir.path().join("trips_anonymized.csv");

    let pipeline = AnonymizePipeline::new(
        LocalStorage::new(".".to_string()),
        config(),
        TableKind::Trips,
        input,
        Some(output.to_string_lossy().to_string()),
    );
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert_eq!(err.exit_code(), 1);

    match err {
        EtlError::PrivacyViolationError { token, occurrences } => {
            assert_eq!(token, "Chennai");
            assert_eq!(occurrences, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!output.exists());
    // no staged leftovers either
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_missing_required_column_names_it() {
    let dir = TempDir::new().unwrap();
    let csv = PAYMENTS_CSV.replace(",status,", ",state,");
    let input = write_input(&dir, "payorder.csv", &csv);

    let err = pipeline(&input, None).extract().await.unwrap_err();

    match err {
        EtlError::MissingColumnError { table, column } => {
            assert_eq!(table, "payments");
            assert_eq!(column, "status");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir.path().join("payorder_anonymized.csv").exists());
}

#[tokio::test]
async fn test_refuses_to_overwrite_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "payorder.csv", PAYMENTS_CSV);

    let err = EtlEngine::new(pipeline(&input, Some(input.clone())))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::OverwriteSourceError { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(std::fs::read_to_string(&input).unwrap(), PAYMENTS_CSV);
}

#[tokio::test]
async fn test_column_aliases_from_config() {
    let dir = TempDir::new().unwrap();
    let csv = "\
Trip UUID,Driver UUID,distance_km,duration_min,status,service_type,fare,timestamp
R1,drv-1,5.2,14,completed,Go,120,2024-03-05 08:15:00
R2,drv-1,3.0,9,rider_cancelled,Go,,2024-03-05 09:00:00
";
    let input = write_input(&dir, "trips.csv", csv);
    let mut config = config();
    config
        .columns
        .insert("Trip UUID".to_string(), "trip_id".to_string());
    config
        .columns
        .insert("Driver UUID".to_string(), "driver_id".to_string());

    let pipeline = AnonymizePipeline::new(
        LocalStorage::new(".".to_string()),
        config,
        TableKind::Trips,
        input,
        None,
    );
    let output = EtlEngine::new(pipeline).run().await.unwrap();

    let (headers, rows) = read_rows(Path::new(&output));
    assert_eq!(headers[0], "Trip UUID");
    assert!(rows[0][0].starts_with("TRIP_"));
    assert!(rows[0][1].starts_with("DRIVER_"));
    assert_eq!(rows[0][1], rows[1][1]);
    assert_eq!(rows[1][6], "");
}

#[tokio::test]
async fn test_latin1_name_does_not_abort_batch() {
    let dir = TempDir::new().unwrap();
    let mut csv = PAYMENTS_CSV.replace("Priya", "Jos_").into_bytes();
    let pos = csv.windows(4).position(|w| w == b"Jos_").unwrap();
    csv[pos + 3] = 0xE9;
    let input = dir.path().join("payorder.csv");
    std::fs::write(&input, &csv).unwrap();

    let output = EtlEngine::new(pipeline(&input.to_string_lossy(), None))
        .run()
        .await
        .unwrap();

    let (_, rows) = read_rows(Path::new(&output));
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2][2], "ANON");
}
