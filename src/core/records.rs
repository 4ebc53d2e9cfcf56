use crate::core::timestamp::parse_timestamp;
use crate::domain::model::{
    FareComponents, PaymentRecord, PaymentStatus, Table, TableKind, TripRecord, TripStatus,
};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a single row was left out of the analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("empty {0}")]
    EmptyField(&'static str),

    #[error("'{value}' is not a number in {field}")]
    BadNumber { field: &'static str, value: String },

    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("negative distance {0}")]
    NegativeDistance(f64),

    #[error("negative fare {0}")]
    NegativeFare(f64),

    #[error("unknown trip status '{0}'")]
    UnknownStatus(String),
}

impl RowError {
    pub fn reason(&self) -> String {
        match self {
            RowError::EmptyField(field) => format!("empty {}", field),
            RowError::BadNumber { field, .. } => format!("non-numeric {}", field),
            RowError::BadTimestamp(_) => "bad timestamp".to_string(),
            RowError::NegativeDistance(_) => "negative distance".to_string(),
            RowError::NegativeFare(_) => "negative fare".to_string(),
            RowError::UnknownStatus(_) => "unknown status".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowTally {
    pub counts: BTreeMap<String, usize>,
}

impl RowTally {
    pub fn record(&mut self, reason: String) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    /// Rows present in the file, including those skipped at load time.
    pub input_rows: usize,
    pub rejected: RowTally,
    /// Rows kept despite failing a soft invariant.
    pub warnings: RowTally,
}

fn parse_number(cell: &str, field: &'static str) -> std::result::Result<Option<f64>, RowError> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| RowError::BadNumber {
            field,
            value: cell.trim().to_string(),
        })
}

fn required_number(cell: &str, field: &'static str) -> std::result::Result<f64, RowError> {
    parse_number(cell, field)?.ok_or(RowError::EmptyField(field))
}

fn required_timestamp(cell: &str) -> std::result::Result<NaiveDateTime, RowError> {
    parse_timestamp(cell).ok_or_else(|| RowError::BadTimestamp(cell.trim().to_string()))
}

fn finish<T>(
    kind: TableKind,
    table: &Table,
    records: Vec<T>,
    rejected: RowTally,
    warnings: RowTally,
) -> Result<Parsed<T>> {
    if !table.is_empty() && records.is_empty() {
        return Err(EtlError::ProcessingError {
            message: format!(
                "every {} row was rejected ({} rows): {:?}",
                kind,
                table.len(),
                rejected.counts
            ),
        });
    }
    if !rejected.is_empty() {
        tracing::warn!(
            "⚠️ Excluded {} {} row(s): {:?}",
            rejected.total(),
            kind,
            rejected.counts
        );
    }
    if !warnings.is_empty() {
        tracing::warn!("⚠️ {} {} row(s) kept with warnings: {:?}", warnings.total(), kind, warnings.counts);
    }
    tracing::info!("✅ Parsed {} {} records", records.len(), kind);

    Ok(Parsed {
        records,
        input_rows: table.len() + table.skipped_rows,
        rejected,
        warnings,
    })
}

struct PaymentColumns {
    transaction_id: usize,
    driver_id: usize,
    fare_total: usize,
    components: [usize; 5],
    payment_method: usize,
    timestamp: usize,
    status: usize,
}

impl PaymentColumns {
    fn resolve(table: &Table) -> Result<Self> {
        table.require_schema()?;
        let mut components = [0; 5];
        for (slot, name) in components.iter_mut().zip(FareComponents::NAMES) {
            *slot = table.require(name)?;
        }
        Ok(Self {
            transaction_id: table.require("transaction_id")?,
            driver_id: table.require("driver_id")?,
            fare_total: table.require("fare_total")?,
            components,
            payment_method: table.require("payment_method")?,
            timestamp: table.require("timestamp")?,
            status: table.require("status")?,
        })
    }

    fn parse(&self, row: &[String]) -> std::result::Result<PaymentRecord, RowError> {
        let driver_id = row[self.driver_id].trim();
        if driver_id.is_empty() {
            return Err(RowError::EmptyField("driver_id"));
        }

        let mut values = [0.0; 5];
        for ((value, idx), name) in values
            .iter_mut()
            .zip(self.components)
            .zip(FareComponents::NAMES)
        {
            *value = parse_number(&row[idx], name)?.unwrap_or(0.0);
        }
        let [base, surge, tax, tip, toll] = values;

        let fare_total = required_number(&row[self.fare_total], "fare_total")?;
        if fare_total < 0.0 {
            return Err(RowError::NegativeFare(fare_total));
        }

        let method = row[self.payment_method].trim().to_lowercase();

        Ok(PaymentRecord {
            transaction_id: row[self.transaction_id].trim().to_string(),
            driver_id: driver_id.to_string(),
            fare_total,
            components: FareComponents {
                base,
                surge,
                tax,
                tip,
                toll,
            },
            payment_method: if method.is_empty() {
                "unknown".to_string()
            } else {
                method
            },
            timestamp: required_timestamp(&row[self.timestamp])?,
            status: PaymentStatus::classify(&row[self.status]),
        })
    }
}

/// Tolerance for the fare total vs. component sum check.
const ROUNDING_TOLERANCE: f64 = 0.01;

pub fn parse_payments(table: &Table) -> Result<Parsed<PaymentRecord>> {
    let columns = PaymentColumns::resolve(table)?;
    let mut records = Vec::with_capacity(table.len());
    let mut rejected = RowTally::default();
    let mut warnings = RowTally::default();

    for row in &table.rows {
        match columns.parse(row) {
            Ok(record) => {
                let positive_parts: f64 = record
                    .components
                    .values()
                    .iter()
                    .filter(|v| **v > 0.0)
                    .sum();
                if record.fare_total + ROUNDING_TOLERANCE < positive_parts {
                    warnings.record("fare total below component sum".to_string());
                }
                records.push(record);
            }
            Err(e) => {
                tracing::debug!("Rejected payment row: {}", e);
                rejected.record(e.reason());
            }
        }
    }

    finish(TableKind::Payments, table, records, rejected, warnings)
}

struct TripColumns {
    trip_id: usize,
    driver_id: Option<usize>,
    distance_km: usize,
    duration_min: usize,
    status: usize,
    service_type: usize,
    fare: usize,
    timestamp: usize,
}

impl TripColumns {
    fn resolve(table: &Table) -> Result<Self> {
        table.require_schema()?;
        Ok(Self {
            trip_id: table.require("trip_id")?,
            driver_id: table.column("driver_id"),
            distance_km: table.require("distance_km")?,
            duration_min: table.require("duration_min")?,
            status: table.require("status")?,
            service_type: table.require("service_type")?,
            fare: table.require("fare")?,
            timestamp: table.require("timestamp")?,
        })
    }

    fn parse(&self, row: &[String]) -> std::result::Result<TripRecord, RowError> {
        let status: TripStatus = row[self.status]
            .parse()
            .map_err(RowError::UnknownStatus)?;

        let distance_km = parse_number(&row[self.distance_km], "distance_km")?;
        if let Some(d) = distance_km.filter(|d| *d < 0.0) {
            return Err(RowError::NegativeDistance(d));
        }

        let fare = parse_number(&row[self.fare], "fare")?;
        if status == TripStatus::Completed {
            if let Some(f) = fare.filter(|f| *f < 0.0) {
                return Err(RowError::NegativeFare(f));
            }
        }

        let driver_id = self
            .driver_id
            .map(|idx| row[idx].trim().to_string())
            .filter(|id| !id.is_empty());

        let service_type = row[self.service_type].trim();

        Ok(TripRecord {
            trip_id: row[self.trip_id].trim().to_string(),
            driver_id,
            distance_km,
            duration_min: parse_number(&row[self.duration_min], "duration_min")?,
            status,
            service_type: if service_type.is_empty() {
                "unknown".to_string()
            } else {
                service_type.to_string()
            },
            fare,
            timestamp: required_timestamp(&row[self.timestamp])?,
        })
    }
}

pub fn parse_trips(table: &Table) -> Result<Parsed<TripRecord>> {
    let columns = TripColumns::resolve(table)?;
    let mut records = Vec::with_capacity(table.len());
    let mut rejected = RowTally::default();

    for row in &table.rows {
        match columns.parse(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!("Rejected trip row: {}", e);
                rejected.record(e.reason());
            }
        }
    }

    finish(TableKind::Trips, table, records, rejected, RowTally::default())
}
