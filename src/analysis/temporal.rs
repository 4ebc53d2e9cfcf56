use crate::analysis::completion::CategoryCount;
use crate::analysis::descriptive::percent;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalPattern {
    pub records: usize,
    pub histogram: [usize; 24],
    /// Busiest hour; ties go to the earliest hour.
    pub peak: Option<HourCount>,
    pub busiest: Vec<HourCount>,
    pub quietest: Vec<HourCount>,
    pub periods: Vec<CategoryCount>,
}

const RANKED_HOURS: usize = 5;

const PERIODS: [(&str, u32, u32); 4] = [
    ("morning (06-12)", 6, 12),
    ("afternoon (12-18)", 12, 18),
    ("evening (18-24)", 18, 24),
    ("night (00-06)", 0, 6),
];

/// Shifting by whole days leaves hour-of-day intact, so anonymized
/// timestamps give the same histogram as the raw ones.
pub fn hourly_pattern<'a>(timestamps: impl IntoIterator<Item = &'a NaiveDateTime>) -> TemporalPattern {
    let mut histogram = [0usize; 24];
    let mut records = 0;
    for ts in timestamps {
        histogram[ts.hour() as usize] += 1;
        records += 1;
    }

    let mut observed: Vec<HourCount> = histogram
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(hour, count)| HourCount {
            hour: hour as u32,
            count: *count,
        })
        .collect();

    // 先依次數降冪，同次數取較早的小時
    observed.sort_by(|a, b| b.count.cmp(&a.count).then(a.hour.cmp(&b.hour)));
    let peak = observed.first().copied();
    let busiest: Vec<HourCount> = observed.iter().take(RANKED_HOURS).copied().collect();

    observed.sort_by(|a, b| a.count.cmp(&b.count).then(a.hour.cmp(&b.hour)));
    let quietest: Vec<HourCount> = observed.iter().take(RANKED_HOURS).copied().collect();

    let periods = PERIODS
        .iter()
        .map(|(label, from, to)| {
            let count: usize = histogram[*from as usize..*to as usize].iter().sum();
            CategoryCount {
                label: label.to_string(),
                count,
                share_pct: percent(count as f64, records as f64),
            }
        })
        .collect();

    TemporalPattern {
        records,
        histogram,
        peak,
        busiest,
        quietest,
        periods,
    }
}
