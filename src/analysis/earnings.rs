use crate::analysis::descriptive::{percent, Summary};
use crate::domain::model::PaymentRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Gini coefficient of a non-negative distribution:
/// `G = 2 * sum(i * x_i) / (n * sum(x)) - (n + 1) / n` over ascending `x`,
/// 1-indexed. Evaluated over a common denominator so equal inputs give exactly 0.
/// Undefined when any value is negative.
pub fn gini(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| *v < 0.0) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let first = sorted[0];
    if sorted.iter().all(|v| *v == first) {
        return Some(0.0);
    }

    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();

    let g = (2.0 * weighted - (n + 1.0) * total) / (n * total);
    Some(g.max(0.0))
}

/// Percentage of `sum(values)` held by the `k` largest values.
pub fn top_k_share(values: &[f64], k: usize) -> Option<f64> {
    if values.iter().any(|v| *v < 0.0) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let top: f64 = sorted.iter().take(k).sum();
    percent(top, sorted.iter().sum())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverEarnings {
    pub transactions: usize,
    pub drivers: usize,
    pub total_earnings: f64,
    pub gini: Option<f64>,
    pub top_k: usize,
    pub top_k_share_pct: Option<f64>,
    pub per_driver: Option<Summary>,
    pub per_trip: Option<Summary>,
    pub trips_per_driver: Option<Summary>,
}

/// Groups by the anonymized driver id; masked names are constant and never used.
pub fn driver_earnings(payments: &[&PaymentRecord], top_k: usize) -> DriverEarnings {
    let mut by_driver: HashMap<&str, (f64, usize)> = HashMap::new();
    for p in payments {
        let entry = by_driver.entry(p.driver_id.as_str()).or_insert((0.0, 0));
        entry.0 += p.fare_total;
        entry.1 += 1;
    }

    let earnings: Vec<f64> = by_driver.values().map(|(sum, _)| *sum).collect();
    let per_trip: Vec<f64> = by_driver
        .values()
        .map(|(sum, trips)| sum / *trips as f64)
        .collect();
    let trips: Vec<f64> = by_driver.values().map(|(_, trips)| *trips as f64).collect();

    DriverEarnings {
        transactions: payments.len(),
        drivers: by_driver.len(),
        total_earnings: earnings.iter().sum(),
        gini: gini(&earnings),
        top_k,
        top_k_share_pct: top_k_share(&earnings, top_k),
        per_driver: Summary::of(&earnings),
        per_trip: Summary::of(&per_trip),
        trips_per_driver: Summary::of(&trips),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FareComponents, PaymentStatus};
    use chrono::NaiveDate;

    #[test]
    fn test_gini_uniform_is_zero() {
        assert_eq!(gini(&[250.0; 12]), Some(0.0));
        assert_eq!(gini(&[33.3, 33.3, 33.3]), Some(0.0));
    }

    #[test]
    fn test_gini_single_driver_is_zero() {
        assert_eq!(gini(&[1234.5]), Some(0.0));
    }

    #[test]
    fn test_gini_all_zero_is_zero() {
        assert_eq!(gini(&[0.0, 0.0, 0.0]), Some(0.0));
    }

    #[test]
    fn test_gini_empty_is_undefined() {
        assert_eq!(gini(&[]), None);
    }

    #[test]
    fn test_negative_earnings_are_undefined() {
        assert_eq!(gini(&[-500.0, 300.0, 400.0]), None);
        assert_eq!(top_k_share(&[-500.0, 300.0, 400.0], 10), None);
    }

    #[test]
    fn test_gini_maximal_concentration() {
        for n in [2usize, 5, 10, 50] {
            let mut values = vec![0.0; n - 1];
            values.push(1000.0);
            let g = gini(&values).unwrap();
            let max = (n as f64 - 1.0) / n as f64;
            assert!((g - max).abs() < 1e-12, "n={} g={}", n, g);
        }
    }

    #[test]
    fn test_gini_known_value() {
        // 1,2,3,4 -> (2*30 - 5*10) / 40 = 0.25
        let g = gini(&[3.0, 1.0, 4.0, 2.0]).unwrap();
        assert!((g - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_share() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        // top 10 = 11..=20 = 155 of 210
        let share = top_k_share(&values, 10).unwrap();
        assert!((share - 155.0 / 210.0 * 100.0).abs() < 1e-9);
        assert_eq!(top_k_share(&[5.0, 5.0], 10), Some(100.0));
        assert_eq!(top_k_share(&[], 10), None);
    }

    #[test]
    fn test_driver_earnings_groups_by_driver_id() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let make = |driver: &str, fare: f64| PaymentRecord {
            transaction_id: "T".to_string(),
            driver_id: driver.to_string(),
            fare_total: fare,
            components: FareComponents {
                base: fare,
                ..Default::default()
            },
            payment_method: "cash".to_string(),
            timestamp: ts,
            status: PaymentStatus::Completed,
        };
        let records = vec![make("D1", 100.0), make("D1", 300.0), make("D2", 400.0)];
        let refs: Vec<&PaymentRecord> = records.iter().collect();

        let stats = driver_earnings(&refs, 10);

        assert_eq!(stats.drivers, 2);
        assert_eq!(stats.total_earnings, 800.0);
        assert_eq!(stats.gini, Some(0.0));
        assert_eq!(stats.top_k_share_pct, Some(100.0));
        let per_trip = stats.per_trip.unwrap();
        assert_eq!(per_trip.min, 200.0);
        assert_eq!(per_trip.max, 400.0);
        assert_eq!(stats.trips_per_driver.unwrap().mean, 1.5);
    }
}
