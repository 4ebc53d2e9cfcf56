use crate::analysis::descriptive::{coefficient_of_variation, mean, Summary};
use crate::analysis::regression::{ols, LinearFit};
use crate::domain::model::TripRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceBucket {
    pub label: &'static str,
    pub count: usize,
    pub mean_fare: Option<f64>,
    pub mean_fare_per_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareDistanceAnalysis {
    pub completed_trips: usize,
    /// Completed trips with distance > 0 and fare > 0; the regression sample.
    pub eligible_trips: usize,
    pub fit: Option<LinearFit>,
    pub distance_km: Option<Summary>,
    pub fare: Option<Summary>,
    pub fare_per_km: Option<Summary>,
    pub fare_cv_pct: Option<f64>,
    pub distance_cv_pct: Option<f64>,
    pub buckets: Vec<DistanceBucket>,
}

const BUCKETS: [(&str, f64); 4] = [
    ("short (<=5 km)", 5.0),
    ("medium (5-15 km)", 15.0),
    ("long (15-25 km)", 25.0),
    ("very long (>25 km)", f64::INFINITY),
];

fn bucket_index(distance: f64) -> usize {
    BUCKETS
        .iter()
        .position(|(_, upper)| distance <= *upper)
        .unwrap_or(BUCKETS.len() - 1)
}

pub fn fare_distance(trips: &[TripRecord]) -> FareDistanceAnalysis {
    let completed: Vec<&TripRecord> = trips.iter().filter(|t| t.is_completed()).collect();
    let points: Vec<(f64, f64)> = completed
        .iter()
        .filter_map(|t| match (t.distance_km, t.fare) {
            (Some(d), Some(f)) if d > 0.0 && f > 0.0 => Some((d, f)),
            _ => None,
        })
        .collect();

    let distances: Vec<f64> = points.iter().map(|(d, _)| *d).collect();
    let fares: Vec<f64> = points.iter().map(|(_, f)| *f).collect();
    let per_km: Vec<f64> = points.iter().map(|(d, f)| f / d).collect();

    let mut grouped: Vec<Vec<(f64, f64)>> = vec![Vec::new(); BUCKETS.len()];
    for (d, f) in &points {
        grouped[bucket_index(*d)].push((*d, *f));
    }
    let buckets = BUCKETS
        .iter()
        .zip(grouped)
        .map(|((label, _), members)| {
            let bucket_fares: Vec<f64> = members.iter().map(|(_, f)| *f).collect();
            let bucket_per_km: Vec<f64> = members.iter().map(|(d, f)| f / d).collect();
            DistanceBucket {
                label: *label,
                count: members.len(),
                mean_fare: mean(&bucket_fares),
                mean_fare_per_km: mean(&bucket_per_km),
            }
        })
        .collect();

    FareDistanceAnalysis {
        completed_trips: completed.len(),
        eligible_trips: points.len(),
        fit: ols(&points),
        distance_km: Summary::of(&distances),
        fare: Summary::of(&fares),
        fare_per_km: Summary::of(&per_km),
        fare_cv_pct: coefficient_of_variation(&fares),
        distance_cv_pct: coefficient_of_variation(&distances),
        buckets,
    }
}
