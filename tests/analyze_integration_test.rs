use fleet_etl::{
    AnalyzePipeline, AnonymizePipeline, EtlEngine, EtlError, FleetConfig, LocalStorage,
    ReportFormat, TableKind,
};
use tempfile::TempDir;

const PAYMENTS_CSV: &str = "\
transaction_id,driver_id,driver_first_name,fare_total,base_fare,surge,tax,tip,toll,payment_method,timestamp,vehicle_plate,pickup_address,status
TXN_01,DRIVER_A,ANON,100.00,80,0,10,10,0,cash,2023-09-07 08:15:00,VEH_1,Region_Metro,Trip Completed Order
TXN_02,DRIVER_A,ANON,200.00,160,20,20,0,0,card,2023-09-07 18:40:00,VEH_1,Region_Metro,Trip Completed Order
TXN_03,DRIVER_B,ANON,300.00,240,30,30,0,0,cash,2023-09-08 18:05:00,VEH_2,Zone_Airport,Trip Completed Order
TXN_04,DRIVER_C,ANON,50.00,50,0,0,0,0,cash,2023-09-08 09:00:00,VEH_3,Region_Metro,Order Cancelled
TXN_05,DRIVER_C,ANON,abc,50,0,0,0,0,cash,2023-09-08 09:30:00,VEH_3,Region_Metro,Trip Completed Order
";

const TRIPS_CSV: &str = "\
trip_id,driver_id,distance_km,duration_min,status,service_type,fare,timestamp
TRIP_01,DRIVER_A,2,8,completed,Go,70,2023-09-07 08:00:00
TRIP_02,DRIVER_A,4,12,completed,Go,90,2023-09-07 09:00:00
TRIP_03,DRIVER_A,6,15,completed,Go,110,2023-09-07 13:00:00
TRIP_04,DRIVER_A,8,20,completed,Premier,130,2023-09-07 19:00:00
TRIP_05,DRIVER_A,0,0,rider_cancelled,Go,,2023-09-07 20:00:00
TRIP_06,DRIVER_B,10,25,completed,Go,150,2023-09-08 07:30:00
TRIP_07,DRIVER_B,12,28,completed,Premier,170,2023-09-08 18:30:00
TRIP_08,DRIVER_B,14,33,completed,Go,190,2023-09-08 22:00:00
TRIP_09,DRIVER_B,0,0,rider_cancelled,Go,,2023-09-08 23:00:00
TRIP_10,DRIVER_B,0,0,driver_cancelled,Go,,2023-09-09 02:00:00
TRIP_11,DRIVER_B,3,10,teleported,Go,60,2023-09-09 03:00:00
";

struct Fixture {
    dir: TempDir,
    payments: String,
    trips: String,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let payments = dir.path().join("payments.csv");
    let trips = dir.path().join("trips.csv");
    std::fs::write(&payments, PAYMENTS_CSV).unwrap();
    std::fs::write(&trips, TRIPS_CSV).unwrap();
    Fixture {
        payments: payments.to_string_lossy().to_string(),
        trips: trips.to_string_lossy().to_string(),
        dir,
    }
}

fn pipeline(
    f: &Fixture,
    output: &str,
    format: ReportFormat,
) -> AnalyzePipeline<LocalStorage, FleetConfig> {
    AnalyzePipeline::new(
        LocalStorage::new(".".to_string()),
        FleetConfig::default(),
        f.payments.clone(),
        f.trips.clone(),
        Some(f.dir.path().join(output).to_string_lossy().to_string()),
        format,
    )
}

#[tokio::test]
async fn test_text_report_sections() {
    let f = fixture();

    let output = EtlEngine::new(pipeline(&f, "report.txt", ReportFormat::Text))
        .run()
        .await
        .unwrap();
    let report = std::fs::read_to_string(output).unwrap();

    for section in 1..=6 {
        assert!(report.contains(&format!("SECTION {}:", section)));
    }
    // one bad fare row is excluded and counted
    assert!(report.contains("Payments: 5 row(s) read, 4 valid, 1 excluded"));
    assert!(report.contains("non-numeric fare_total: 1"));
    assert!(report.contains("unknown status: 1"));

    assert!(report.contains("3 completed payment(s) (1 non-completed excluded)"));
    assert!(report.contains("₹600.00"));
    assert!(report.contains("(80.0%)"));

    assert!(report.contains("Gini coefficient:    0.0000"));
    assert!(report.contains("Completion rate:            70.0%"));
    assert!(report.contains("Rider cancellation rate:    20.0%"));
    assert!(report.contains("Driver cancellation rate:   10.0%"));

    assert!(report.contains("Fare = 10.00 * distance_km + 50.00"));
    assert!(report.contains("R²:                  1.0000"));
    assert!(report.contains("Peak demand hour:    18:00-18:59  2 record(s)"));
    assert!(report.contains("High performers (>= 80%): 1"));
}

#[tokio::test]
async fn test_json_report_values() {
    let f = fixture();

    let output = EtlEngine::new(pipeline(&f, "report.json", ReportFormat::Json))
        .run()
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();

    assert_eq!(json["completion"]["valid_trips"], 10);
    assert_eq!(json["completion"]["completion_rate_pct"], 70.0);
    assert_eq!(json["revenue"]["fare_total"], 600.0);
    assert_eq!(json["revenue"]["unattributed"], 0.0);
    assert_eq!(json["earnings"]["drivers"], 2);
    assert_eq!(json["fare_distance"]["eligible_trips"], 7);
    assert_eq!(json["payment_hours"]["peak"]["hour"], 18);
    assert_eq!(json["trips"]["distinct_drivers"], 2);
    assert_eq!(json["driver_performance"]["low_performers"], 0);
}

#[tokio::test]
async fn test_missing_trip_column_is_fatal() {
    let f = fixture();
    std::fs::write(&f.trips, TRIPS_CSV.replace("service_type", "product")).unwrap();

    let err = EtlEngine::new(pipeline(&f, "report.txt", ReportFormat::Text))
        .run()
        .await
        .unwrap_err();

    match err {
        EtlError::MissingColumnError { column, .. } => assert_eq!(column, "service_type"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!f.dir.path().join("report.txt").exists());
}

#[tokio::test]
async fn test_report_cannot_replace_an_input() {
    let f = fixture();
    let pipeline = AnalyzePipeline::new(
        LocalStorage::new(".".to_string()),
        FleetConfig::default(),
        f.payments.clone(),
        f.trips.clone(),
        Some(f.trips.clone()),
        ReportFormat::Text,
    );

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::OverwriteSourceError { .. }));
    assert_eq!(std::fs::read_to_string(&f.trips).unwrap(), TRIPS_CSV);
}

#[tokio::test]
async fn test_anonymize_then_analyze() {
    let dir = TempDir::new().unwrap();
    let raw_trips = dir.path().join("raw_trips.csv");
    let raw = TRIPS_CSV
        .replace("DRIVER_A", "3f1c-driver-a")
        .replace("DRIVER_B", "9a07-driver-b");
    std::fs::write(&raw_trips, raw).unwrap();
    let payments = dir.path().join("payments.csv");
    std::fs::write(&payments, PAYMENTS_CSV).unwrap();

    let anonymized = EtlEngine::new(AnonymizePipeline::new(
        LocalStorage::new(".".to_string()),
        FleetConfig::default(),
        TableKind::Trips,
        raw_trips.to_string_lossy().to_string(),
        None,
    ))
    .run()
    .await
    .unwrap();
    assert!(!std::fs::read_to_string(&anonymized)
        .unwrap()
        .contains("driver-a"));

    let report = dir.path().join("report.json");
    EtlEngine::new(AnalyzePipeline::new(
        LocalStorage::new(".".to_string()),
        FleetConfig::default(),
        payments.to_string_lossy().to_string(),
        anonymized,
        Some(report.to_string_lossy().to_string()),
        ReportFormat::Json,
    ))
    .run()
    .await
    .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    // whole-day shift keeps hours and counts intact
    assert_eq!(json["completion"]["completion_rate_pct"], 70.0);
    assert_eq!(json["trips"]["distinct_drivers"], 2);
    assert_eq!(json["trip_hours"]["histogram"][18], 1);
}
