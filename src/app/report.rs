use crate::analysis::completion::CategoryCount;
use crate::analysis::descriptive::Summary;
use crate::analysis::temporal::{HourCount, TemporalPattern};
use crate::analysis::AnalysisReport;
use crate::core::records::RowTally;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportFormat {
    Text,
    Json,
}

pub fn render(report: &AnalysisReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(TextReport(report).to_string()),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
    }
}

const RULE: &str = "======================================================================";
const UNDEFINED: &str = "undefined";

/// `1234567.891` -> `1,234,567.89`
fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && formatted.trim_matches(['0', '.']) != "" {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

struct TextReport<'a>(&'a AnalysisReport);

impl TextReport<'_> {
    fn money(&self, value: f64) -> String {
        let grouped = group_thousands(value);
        match grouped.strip_prefix('-') {
            Some(rest) => format!("-{}{}", self.0.currency_symbol, rest),
            None => format!("{}{}", self.0.currency_symbol, grouped),
        }
    }

    fn opt_money(&self, value: Option<f64>) -> String {
        value.map_or_else(|| UNDEFINED.to_string(), |v| self.money(v))
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{:.1}%", v))
}

fn fixed(value: Option<f64>, places: usize) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{:.*}", places, v))
}

fn p_value(value: Option<f64>) -> String {
    match value {
        None => UNDEFINED.to_string(),
        Some(p) if p < 1e-4 => format!("{:.2e}", p),
        Some(p) => format!("{:.4}", p),
    }
}

fn hour_label(h: &HourCount) -> String {
    format!("{:02}:00-{:02}:59  {} record(s)", h.hour, h.hour, h.count)
}

fn tally(t: &RowTally) -> String {
    if t.is_empty() {
        return "none".to_string();
    }
    t.counts
        .iter()
        .map(|(reason, n)| format!("{}: {}", reason, n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn section(f: &mut fmt::Formatter<'_>, number: u8, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", RULE)?;
    writeln!(f, "SECTION {}: {}", number, title)?;
    writeln!(f, "{}", RULE)
}

fn categories(f: &mut fmt::Formatter<'_>, items: &[CategoryCount]) -> fmt::Result {
    for item in items {
        writeln!(f, "  {:<24} {:>6}  ({})", item.label, item.count, pct(item.share_pct))?;
    }
    Ok(())
}

impl TextReport<'_> {
    fn summary(&self, f: &mut fmt::Formatter<'_>, label: &str, s: &Option<Summary>, unit: Unit) -> fmt::Result {
        let Some(s) = s else {
            return writeln!(f, "  {}: {} (no records)", label, UNDEFINED);
        };
        let show = |v: f64| match unit {
            Unit::Money => self.money(v),
            Unit::Km => format!("{:.2} km", v),
            Unit::MoneyPerKm => format!("{}/km", self.money(v)),
            Unit::Percent => format!("{:.1}%", v),
            Unit::Count => format!("{:.1}", v),
        };
        writeln!(f, "  {} (n = {}):", label, s.count)?;
        writeln!(
            f,
            "    mean {}  median {}  std dev {}",
            show(s.mean),
            show(s.median),
            s.std_dev.map_or_else(|| UNDEFINED.to_string(), show)
        )?;
        writeln!(f, "    min {}  max {}", show(s.min), show(s.max))
    }

    fn hours(&self, f: &mut fmt::Formatter<'_>, pattern: &TemporalPattern) -> fmt::Result {
        writeln!(f, "  Busiest hours:")?;
        for h in &pattern.busiest {
            writeln!(f, "    {}", hour_label(h))?;
        }
        writeln!(f, "  Quietest hours:")?;
        for h in &pattern.quietest {
            writeln!(f, "    {}", hour_label(h))?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Money,
    Km,
    MoneyPerKm,
    Percent,
    Count,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "FLEET FINANCIAL ANALYSIS REPORT")?;
        writeln!(f, "{}", RULE)?;

        section(f, 0, "DATASETS")?;
        for (name, overview) in [("Payments", &r.payments), ("Trips", &r.trips)] {
            writeln!(
                f,
                "{}: {} row(s) read, {} valid, {} excluded ({})",
                name,
                overview.input_rows,
                overview.valid_records,
                overview.input_rows - overview.valid_records,
                tally(&overview.rejected)
            )?;
            if !overview.warnings.is_empty() {
                writeln!(f, "  Kept with warnings: {}", tally(&overview.warnings))?;
            }
            writeln!(f, "  Distinct drivers: {}", overview.distinct_drivers)?;
        }

        let rev = &r.revenue;
        section(f, 1, "REVENUE AGGREGATES")?;
        writeln!(
            f,
            "Contributing records: {} completed payment(s) ({} non-completed excluded)",
            rev.transactions, r.excluded_payments
        )?;
        writeln!(f, "  Total fares:         {}", self.money(rev.fare_total))?;
        writeln!(f, "  Sum of components:   {}", self.money(rev.component_total))?;
        writeln!(f, "  Unattributed:        {}", self.money(rev.unattributed))?;
        writeln!(f, "  Components (share of component sum):")?;
        for c in &rev.components {
            writeln!(f, "    {:<12} {:>16}  ({})", c.name, self.money(c.total), pct(c.share_pct))?;
        }

        let split = &r.payment_methods;
        section(f, 2, "PAYMENT METHOD SPLIT")?;
        writeln!(f, "Contributing records: {} transaction(s)", split.transactions)?;
        writeln!(f, "  Cash share:   {}", pct(split.cash_share_pct))?;
        for m in &split.methods {
            writeln!(
                f,
                "  {:<12} {:>6} ({})  total {}  mean {}",
                m.method,
                m.count,
                pct(m.share_pct),
                self.money(m.total_amount),
                self.opt_money(m.mean_fare)
            )?;
        }

        let e = &r.earnings;
        section(f, 3, "DRIVER EARNINGS DISTRIBUTION")?;
        writeln!(
            f,
            "Contributing records: {} transaction(s) across {} driver(s)",
            e.transactions, e.drivers
        )?;
        writeln!(f, "  Total earnings:      {}", self.money(e.total_earnings))?;
        writeln!(
            f,
            "  Gini coefficient:    {}  (0 = perfect equality)",
            fixed(e.gini, 4)
        )?;
        writeln!(
            f,
            "  Top {} earners hold: {} of earnings",
            e.top_k,
            pct(e.top_k_share_pct)
        )?;
        self.summary(f, "Earnings per driver", &e.per_driver, Unit::Money)?;
        self.summary(f, "Earnings per trip", &e.per_trip, Unit::Money)?;
        self.summary(f, "Trips per driver", &e.trips_per_driver, Unit::Count)?;

        let c = &r.completion;
        section(f, 4, "TRIP COMPLETION")?;
        writeln!(f, "Contributing records: {} valid trip(s)", c.valid_trips)?;
        writeln!(
            f,
            "  completed {}  cancelled {}  other {}",
            c.completed, c.cancelled, c.other
        )?;
        writeln!(f, "  Completion rate:            {}", pct(c.completion_rate_pct))?;
        writeln!(f, "  Rider cancellation rate:    {}", pct(c.rider_cancel_rate_pct))?;
        writeln!(f, "  Driver cancellation rate:   {}", pct(c.driver_cancel_rate_pct))?;
        writeln!(f, "  By status:")?;
        categories(f, &c.by_status)?;
        writeln!(f, "  By service type:")?;
        categories(f, &c.service_types)?;

        let fd = &r.fare_distance;
        section(f, 5, "FARE-DISTANCE REGRESSION")?;
        writeln!(
            f,
            "Contributing records: {} of {} completed trip(s) with distance > 0 and fare > 0",
            fd.eligible_trips, fd.completed_trips
        )?;
        match &fd.fit {
            Some(fit) => {
                writeln!(
                    f,
                    "  Fare = {:.2} * distance_km + {:.2}  ({} per km, base {})",
                    fit.slope,
                    fit.intercept,
                    self.money(fit.slope),
                    self.money(fit.intercept)
                )?;
                writeln!(f, "  R²:                  {}", fixed(fit.r_squared, 4))?;
                writeln!(f, "  Pearson r:           {}", fixed(fit.pearson_r, 4))?;
                writeln!(f, "  Slope std. error:    {}", fixed(fit.slope_std_err, 4))?;
                writeln!(f, "  t statistic:         {}", fixed(fit.t_statistic, 3))?;
                writeln!(f, "  p-value (slope):     {}", p_value(fit.p_value))?;
            }
            None => writeln!(
                f,
                "  Regression: {} (needs two or more trips with distinct distances)",
                UNDEFINED
            )?,
        }
        self.summary(f, "Distance", &fd.distance_km, Unit::Km)?;
        self.summary(f, "Fare", &fd.fare, Unit::Money)?;
        self.summary(f, "Fare per km", &fd.fare_per_km, Unit::MoneyPerKm)?;
        writeln!(
            f,
            "  Coefficient of variation: fare {}, distance {}",
            pct(fd.fare_cv_pct),
            pct(fd.distance_cv_pct)
        )?;
        writeln!(f, "  By distance:")?;
        for b in &fd.buckets {
            writeln!(
                f,
                "    {:<20} {:>6}  mean fare {}  mean {}/km",
                b.label,
                b.count,
                self.opt_money(b.mean_fare),
                self.opt_money(b.mean_fare_per_km)
            )?;
        }

        section(f, 6, "TEMPORAL PATTERN")?;
        let ph = &r.payment_hours;
        writeln!(f, "Contributing records: {} completed payment(s)", ph.records)?;
        match &ph.peak {
            Some(peak) => writeln!(f, "  Peak demand hour:    {}", hour_label(peak))?,
            None => writeln!(f, "  Peak demand hour:    {}", UNDEFINED)?,
        }
        self.hours(f, ph)?;
        let th = &r.trip_hours;
        writeln!(f, "  Trip requests by time of day ({} trip(s)):", th.records)?;
        for p in &th.periods {
            writeln!(f, "    {:<20} {:>6}  ({})", p.label, p.count, pct(p.share_pct))?;
        }

        section(f, 7, "DRIVER PERFORMANCE")?;
        match &r.driver_performance {
            Some(perf) => {
                writeln!(f, "Contributing records: {} driver(s) with trips", perf.drivers)?;
                self.summary(f, "Completion rate per driver", &perf.completion_rate, Unit::Percent)?;
                writeln!(
                    f,
                    "  High performers (>= {:.0}%): {}",
                    perf.high_threshold_pct, perf.high_performers
                )?;
                writeln!(
                    f,
                    "  Low performers (< {:.0}%):   {}",
                    perf.low_threshold_pct, perf.low_performers
                )?;
            }
            None => writeln!(f, "  Unavailable: trips carry no driver_id column")?,
        }

        writeln!(f)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "END OF REPORT")?;
        writeln!(f, "{}", RULE)
    }
}
