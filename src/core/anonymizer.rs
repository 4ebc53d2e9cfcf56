//! Field-level anonymization rules.
//!
//! Each rule is a pure function of the raw cell and the run's
//! [`AnonymizerSettings`]. Rules are looked up by canonical field name; columns
//! without a rule are copied through untouched (the privacy scan in
//! [`crate::core::privacy`] catches anything that should have had one).
//!
//! Identifier digests are recomputed for every cell. No raw -> token table is
//! kept, so nothing that could be inverted outlives the run.

use crate::config::toml_config::AnonymizerSettings;
use crate::core::timestamp::{format_timestamp, parse_timestamp, shift_days};
use crate::domain::model::Table;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

const NULL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Outcome of masking one cell. `Defaulted` means the raw value was missing or
/// malformed and a placeholder was written instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Masked {
    Value(String),
    Defaulted(String),
}

impl Masked {
    pub fn into_inner(self) -> String {
        match self {
            Masked::Value(v) | Masked::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Masked::Defaulted(_))
    }
}

pub type FieldRule = fn(&str, &AnonymizerSettings) -> Masked;

fn is_placeholder(token: &str) -> bool {
    token.is_empty() || token.ends_with("_UNKNOWN")
}

pub fn digest_token(prefix: &str, raw: &str, settings: &AnonymizerSettings) -> Masked {
    let value = raw.trim();
    if value.is_empty() || value == NULL_UUID {
        return Masked::Defaulted(format!("{}_UNKNOWN", prefix));
    }

    let mut hasher = Sha256::new();
    hasher.update(settings.salt.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let mut encoded = hex::encode_upper(hasher.finalize());
    encoded.truncate(settings.digest_width);

    Masked::Value(format!("{}_{}", prefix, encoded))
}

fn hash_transaction_id(raw: &str, settings: &AnonymizerSettings) -> Masked {
    digest_token("TXN", raw, settings)
}

fn hash_trip_id(raw: &str, settings: &AnonymizerSettings) -> Masked {
    digest_token("TRIP", raw, settings)
}

fn hash_driver_id(raw: &str, settings: &AnonymizerSettings) -> Masked {
    digest_token("DRIVER", raw, settings)
}

fn hash_vehicle(raw: &str, settings: &AnonymizerSettings) -> Masked {
    digest_token("VEH", raw, settings)
}

fn mask_first_name(_raw: &str, settings: &AnonymizerSettings) -> Masked {
    Masked::Value(settings.first_name_placeholder.clone())
}

fn mask_surname(_raw: &str, settings: &AnonymizerSettings) -> Masked {
    Masked::Value(settings.surname_placeholder.clone())
}

fn shift_timestamp(raw: &str, settings: &AnonymizerSettings) -> Masked {
    parse_timestamp(raw)
        .and_then(|ts| shift_days(ts, settings.date_shift_days))
        .map(|ts| Masked::Value(format_timestamp(&ts)))
        .unwrap_or_else(|| Masked::Defaulted(String::new()))
}

fn generalize_location(raw: &str, settings: &AnonymizerSettings) -> Masked {
    let value = raw.trim();
    if value.is_empty() {
        return Masked::Defaulted(settings.unknown_area_label.clone());
    }

    let lowered = value.to_lowercase();
    let label = settings
        .zones
        .iter()
        .find(|zone| lowered.contains(&zone.contains.to_lowercase()))
        .map(|zone| zone.label.clone())
        .unwrap_or_else(|| settings.region_label.clone());
    Masked::Value(label)
}

fn generalize_organisation(_raw: &str, settings: &AnonymizerSettings) -> Masked {
    Masked::Value(settings.organisation_label.clone())
}

fn generalize_organisation_alias(_raw: &str, settings: &AnonymizerSettings) -> Masked {
    Masked::Value(settings.organisation_alias.clone())
}

/// field name -> rule
pub fn rule_table() -> BTreeMap<&'static str, FieldRule> {
    let mut rules: BTreeMap<&'static str, FieldRule> = BTreeMap::new();
    rules.insert("transaction_id", hash_transaction_id);
    rules.insert("trip_id", hash_trip_id);
    rules.insert("driver_id", hash_driver_id);
    rules.insert("vehicle_id", hash_vehicle);
    rules.insert("vehicle_plate", hash_vehicle);
    rules.insert("driver_first_name", mask_first_name);
    rules.insert("driver_surname", mask_surname);
    rules.insert("timestamp", shift_timestamp);
    rules.insert("dropoff_time", shift_timestamp);
    rules.insert("pickup_address", generalize_location);
    rules.insert("dropoff_address", generalize_location);
    rules.insert("organisation_name", generalize_organisation);
    rules.insert("organisation_alias", generalize_organisation_alias);
    rules
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnonymizationSummary {
    pub input_rows: usize,
    pub written_rows: usize,
    pub skipped_rows: usize,
    pub defaulted_rows: usize,
    /// canonical field -> number of placeholder substitutions
    pub defaulted_fields: BTreeMap<String, usize>,
    pub distinct_drivers: usize,
    pub distinct_vehicles: usize,
}

pub struct Anonymizer<'a> {
    settings: &'a AnonymizerSettings,
    rules: BTreeMap<&'static str, FieldRule>,
}

impl<'a> Anonymizer<'a> {
    pub fn new(settings: &'a AnonymizerSettings) -> Self {
        Self {
            settings,
            rules: rule_table(),
        }
    }

    /// Rewrites every sensitive column of `table` in place.
    pub fn anonymize(&self, table: &mut Table) -> AnonymizationSummary {
        let column_rules: Vec<(usize, &str, FieldRule)> = table
            .fields
            .iter()
            .enumerate()
            .filter_map(|(idx, field)| {
                self.rules
                    .get_key_value(field.as_str())
                    .map(|(name, rule)| (idx, *name, *rule))
            })
            .collect();

        for (_, name, _) in &column_rules {
            tracing::debug!("Masking column '{}'", name);
        }

        let driver_col = table.column("driver_id");
        let vehicle_cols: Vec<usize> = ["vehicle_id", "vehicle_plate"]
            .iter()
            .filter_map(|f| table.column(f))
            .collect();

        let mut summary = AnonymizationSummary {
            input_rows: table.len() + table.skipped_rows,
            skipped_rows: table.skipped_rows,
            ..Default::default()
        };
        let mut drivers = HashSet::new();
        let mut vehicles = HashSet::new();

        for row in table.rows.iter_mut() {
            let mut row_defaulted = false;
            for (idx, name, rule) in &column_rules {
                let masked = rule(&row[*idx], self.settings);
                if masked.is_defaulted() {
                    row_defaulted = true;
                    *summary.defaulted_fields.entry(name.to_string()).or_insert(0) += 1;
                }
                row[*idx] = masked.into_inner();
            }
            if row_defaulted {
                summary.defaulted_rows += 1;
            }
            // 佔位符不算進不重複計數
            if let Some(col) = driver_col.filter(|c| !is_placeholder(&row[*c])) {
                drivers.insert(row[col].clone());
            }
            if let Some(col) = vehicle_cols.first().filter(|c| !is_placeholder(&row[**c])) {
                vehicles.insert(row[*col].clone());
            }
        }

        summary.written_rows = table.len();
        summary.distinct_drivers = drivers.len();
        summary.distinct_vehicles = vehicles.len();
        summary
    }
}
