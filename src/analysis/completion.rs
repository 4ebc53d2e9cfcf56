use crate::analysis::descriptive::{percent, Summary};
use crate::domain::model::{TripOutcome, TripRecord, TripStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionStats {
    pub valid_trips: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub other: usize,
    pub completion_rate_pct: Option<f64>,
    pub rider_cancel_rate_pct: Option<f64>,
    pub driver_cancel_rate_pct: Option<f64>,
    pub by_status: Vec<CategoryCount>,
    pub service_types: Vec<CategoryCount>,
}

fn category_counts<'a>(labels: impl Iterator<Item = &'a str>, total: usize) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
            share_pct: percent(count as f64, total as f64),
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

/// Trips reaching this point already passed status validation, so every
/// record counts toward the valid total.
pub fn completion_stats(trips: &[TripRecord]) -> CompletionStats {
    let valid = trips.len();
    let outcome = |o: TripOutcome| trips.iter().filter(|t| t.status.outcome() == o).count();
    let status = |s: TripStatus| trips.iter().filter(|t| t.status == s).count();

    let completed = outcome(TripOutcome::Completed);
    let cancelled = outcome(TripOutcome::Cancelled);
    let rider = status(TripStatus::RiderCancelled);
    let driver = status(TripStatus::DriverCancelled);

    CompletionStats {
        valid_trips: valid,
        completed,
        cancelled,
        other: valid - completed - cancelled,
        completion_rate_pct: percent(completed as f64, valid as f64),
        rider_cancel_rate_pct: percent(rider as f64, valid as f64),
        driver_cancel_rate_pct: percent(driver as f64, valid as f64),
        by_status: category_counts(trips.iter().map(|t| t.status.as_str()), valid),
        service_types: category_counts(trips.iter().map(|t| t.service_type.as_str()), valid),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverPerformance {
    pub drivers: usize,
    pub completion_rate: Option<Summary>,
    pub high_threshold_pct: f64,
    pub low_threshold_pct: f64,
    pub high_performers: usize,
    pub low_performers: usize,
}

/// `None` when no trip carries a driver id.
pub fn driver_performance(
    trips: &[TripRecord],
    high_threshold_pct: f64,
    low_threshold_pct: f64,
) -> Option<DriverPerformance> {
    let mut by_driver: HashMap<&str, (usize, usize)> = HashMap::new();
    for trip in trips {
        if let Some(driver) = trip.driver_id.as_deref() {
            let entry = by_driver.entry(driver).or_insert((0, 0));
            entry.0 += 1;
            if trip.is_completed() {
                entry.1 += 1;
            }
        }
    }
    if by_driver.is_empty() {
        return None;
    }

    let rates: Vec<f64> = by_driver
        .values()
        .map(|(total, done)| *done as f64 / *total as f64 * 100.0)
        .collect();

    Some(DriverPerformance {
        drivers: rates.len(),
        completion_rate: Summary::of(&rates),
        high_threshold_pct,
        low_threshold_pct,
        high_performers: rates.iter().filter(|r| **r >= high_threshold_pct).count(),
        low_performers: rates.iter().filter(|r| **r < low_threshold_pct).count(),
    })
}
