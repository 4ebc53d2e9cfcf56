use crate::utils::error::{EtlError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Payments,
    Trips,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Payments => "payments",
            TableKind::Trips => "trips",
        }
    }

    /// Columns both the anonymizer and the analyzer refuse to run without.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            TableKind::Payments => &[
                "transaction_id",
                "driver_id",
                "driver_first_name",
                "fare_total",
                "base_fare",
                "surge",
                "tax",
                "tip",
                "toll",
                "payment_method",
                "timestamp",
                "vehicle_plate",
                "pickup_address",
                "status",
            ],
            TableKind::Trips => &[
                "trip_id",
                "distance_km",
                "duration_min",
                "status",
                "service_type",
                "fare",
                "timestamp",
            ],
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CSV file held in memory. `headers` keeps the file's own names so the
/// anonymized copy has the same schema; `fields` are the canonical names
/// rules and parsers look columns up by.
#[derive(Debug, Clone)]
pub struct Table {
    pub kind: TableKind,
    pub headers: Vec<String>,
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows dropped at load time because their cell count did not match the header.
    pub skipped_rows: usize,
}

impl Table {
    pub fn column(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    pub fn require(&self, field: &str) -> Result<usize> {
        self.column(field).ok_or_else(|| EtlError::MissingColumnError {
            table: self.kind.to_string(),
            column: field.to_string(),
        })
    }

    pub fn require_schema(&self) -> Result<()> {
        for field in self.kind.required_fields() {
            self.require(field)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FareComponents {
    pub base: f64,
    pub surge: f64,
    pub tax: f64,
    pub tip: f64,
    pub toll: f64,
}

impl FareComponents {
    pub const NAMES: [&'static str; 5] = ["base_fare", "surge", "tax", "tip", "toll"];

    pub fn values(&self) -> [f64; 5] {
        [self.base, self.surge, self.tax, self.tip, self.toll]
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Cancelled,
    Other,
}

impl PaymentStatus {
    /// Exports use free-text descriptions such as "trip completed order".
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.contains("cancel") {
            PaymentStatus::Cancelled
        } else if lowered.contains("complete") {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub driver_id: String,
    pub fare_total: f64,
    pub components: FareComponents,
    pub payment_method: String,
    pub timestamp: NaiveDateTime,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn is_cash(&self) -> bool {
        self.payment_method == "cash"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Completed,
    Cancelled,
    RiderCancelled,
    DriverCancelled,
    Failed,
    Unfulfilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripOutcome {
    Completed,
    Cancelled,
    Other,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
            TripStatus::RiderCancelled => "rider_cancelled",
            TripStatus::DriverCancelled => "driver_cancelled",
            TripStatus::Failed => "failed",
            TripStatus::Unfulfilled => "unfulfilled",
        }
    }

    pub fn outcome(&self) -> TripOutcome {
        match self {
            TripStatus::Completed => TripOutcome::Completed,
            TripStatus::Cancelled | TripStatus::RiderCancelled | TripStatus::DriverCancelled => {
                TripOutcome::Cancelled
            }
            TripStatus::Failed | TripStatus::Unfulfilled => TripOutcome::Other,
        }
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "completed" => Ok(TripStatus::Completed),
            "cancelled" | "canceled" => Ok(TripStatus::Cancelled),
            "rider_cancelled" | "rider_canceled" => Ok(TripStatus::RiderCancelled),
            "driver_cancelled" | "driver_canceled" => Ok(TripStatus::DriverCancelled),
            "failed" => Ok(TripStatus::Failed),
            "unfulfilled" => Ok(TripStatus::Unfulfilled),
            _ => Err(s.trim().to_string()),
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub trip_id: String,
    pub driver_id: Option<String>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub status: TripStatus,
    pub service_type: String,
    pub fare: Option<f64>,
    pub timestamp: NaiveDateTime,
}

impl TripRecord {
    pub fn is_completed(&self) -> bool {
        self.status == TripStatus::Completed
    }
}
