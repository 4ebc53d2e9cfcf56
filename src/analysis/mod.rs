//! Statistics over anonymized payments and trips. Everything here is a pure
//! function of the parsed records.

pub mod completion;
pub mod descriptive;
pub mod earnings;
pub mod fares;
pub mod regression;
pub mod revenue;
pub mod temporal;

use crate::config::toml_config::AnalysisSettings;
use crate::core::records::{Parsed, RowTally};
use crate::domain::model::{PaymentRecord, PaymentStatus, TripRecord};
use completion::{CompletionStats, DriverPerformance};
use earnings::DriverEarnings;
use fares::FareDistanceAnalysis;
use revenue::{PaymentMethodSplit, RevenueBreakdown};
use serde::Serialize;
use std::collections::HashSet;
use temporal::TemporalPattern;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub input_rows: usize,
    pub valid_records: usize,
    pub rejected: RowTally,
    pub warnings: RowTally,
    pub distinct_drivers: usize,
}

impl DatasetOverview {
    fn of<T>(parsed: &Parsed<T>, driver: impl Fn(&T) -> Option<&str>) -> Self {
        let drivers: HashSet<&str> = parsed.records.iter().filter_map(|r| driver(r)).collect();
        Self {
            input_rows: parsed.input_rows,
            valid_records: parsed.records.len(),
            rejected: parsed.rejected.clone(),
            warnings: parsed.warnings.clone(),
            distinct_drivers: drivers.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub currency_symbol: String,
    pub payments: DatasetOverview,
    pub trips: DatasetOverview,
    /// Completed payments, the sample for revenue, earnings and hours.
    pub completed_payments: usize,
    pub excluded_payments: usize,
    pub revenue: RevenueBreakdown,
    pub payment_methods: PaymentMethodSplit,
    pub earnings: DriverEarnings,
    pub completion: CompletionStats,
    pub fare_distance: FareDistanceAnalysis,
    pub payment_hours: TemporalPattern,
    pub trip_hours: TemporalPattern,
    pub driver_performance: Option<DriverPerformance>,
}

pub fn analyze(
    payments: &Parsed<PaymentRecord>,
    trips: &Parsed<TripRecord>,
    settings: &AnalysisSettings,
) -> AnalysisReport {
    let completed: Vec<&PaymentRecord> = payments
        .records
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .collect();
    tracing::debug!(
        "{} of {} payments are completed trips",
        completed.len(),
        payments.records.len()
    );

    AnalysisReport {
        currency_symbol: settings.currency_symbol.clone(),
        payments: DatasetOverview::of(payments, |p| Some(p.driver_id.as_str())),
        trips: DatasetOverview::of(trips, |t| t.driver_id.as_deref()),
        completed_payments: completed.len(),
        excluded_payments: payments.records.len() - completed.len(),
        revenue: revenue::revenue_breakdown(&completed),
        payment_methods: revenue::payment_method_split(&completed),
        earnings: earnings::driver_earnings(&completed, settings.top_k),
        completion: completion::completion_stats(&trips.records),
        fare_distance: fares::fare_distance(&trips.records),
        payment_hours: temporal::hourly_pattern(completed.iter().map(|p| &p.timestamp)),
        trip_hours: temporal::hourly_pattern(trips.records.iter().map(|t| &t.timestamp)),
        driver_performance: completion::driver_performance(
            &trips.records,
            settings.high_performer_threshold,
            settings.low_performer_threshold,
        ),
    }
}
