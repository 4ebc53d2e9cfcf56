use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_label_hides_tokens, validate_non_empty_string, validate_positive_number,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub anonymizer: AnonymizerSettings,
    pub analysis: AnalysisSettings,
    /// CSV header -> canonical field name
    pub columns: HashMap<String, String>,
}

/// Parameters shared by every anonymization rule. Passed explicitly so runs
/// with the same settings and input are reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerSettings {
    pub salt: String,
    pub date_shift_days: i64,
    pub digest_width: usize,
    pub first_name_placeholder: String,
    pub surname_placeholder: String,
    pub organisation_label: String,
    pub organisation_alias: String,
    pub region_label: String,
    pub unknown_area_label: String,
    pub zones: Vec<ZoneRule>,
    pub forbidden_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRule {
    pub contains: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub currency_symbol: String,
    pub top_k: usize,
    pub high_performer_threshold: f64,
    pub low_performer_threshold: f64,
}

impl Default for AnonymizerSettings {
    fn default() -> Self {
        Self {
            salt: String::new(),
            date_shift_days: -180,
            digest_width: 8,
            first_name_placeholder: "ANON".to_string(),
            surname_placeholder: "DRIVER".to_string(),
            organisation_label: "Fleet_Operator".to_string(),
            organisation_alias: "FO".to_string(),
            region_label: "Region_Metro".to_string(),
            unknown_area_label: "Area_Unknown".to_string(),
            zones: Vec::new(),
            forbidden_tokens: Vec::new(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            top_k: 10,
            high_performer_threshold: 80.0,
            low_performer_threshold: 60.0,
        }
    }
}

impl FleetConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads the file when given, defaults otherwise.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                Self::from_file(path)
            }
            None => {
                tracing::debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// 替換環境變數 (例如 ${FLEET_SALT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let anon = &self.anonymizer;

        validate_range("anonymizer.digest_width", anon.digest_width, 4, 64)?;
        validate_non_empty_string(
            "anonymizer.first_name_placeholder",
            &anon.first_name_placeholder,
        )?;
        validate_non_empty_string("anonymizer.surname_placeholder", &anon.surname_placeholder)?;
        validate_non_empty_string("anonymizer.region_label", &anon.region_label)?;
        validate_non_empty_string("anonymizer.organisation_label", &anon.organisation_label)?;

        if anon.salt.contains("${") {
            return Err(EtlError::MissingConfigError {
                field: format!("anonymizer.salt (unresolved variable in '{}')", anon.salt),
            });
        }

        let forbidden = &anon.forbidden_tokens;
        let labels = [
            ("anonymizer.region_label", &anon.region_label),
            ("anonymizer.unknown_area_label", &anon.unknown_area_label),
            ("anonymizer.organisation_label", &anon.organisation_label),
            ("anonymizer.organisation_alias", &anon.organisation_alias),
            ("anonymizer.first_name_placeholder", &anon.first_name_placeholder),
            ("anonymizer.surname_placeholder", &anon.surname_placeholder),
        ];
        for (field, label) in labels {
            validate_label_hides_tokens(field, label, forbidden)?;
        }
        for zone in &anon.zones {
            validate_non_empty_string("anonymizer.zones.contains", &zone.contains)?;
            validate_label_hides_tokens("anonymizer.zones.label", &zone.label, forbidden)?;
        }

        let analysis = &self.analysis;
        validate_positive_number("analysis.top_k", analysis.top_k, 1)?;
        validate_range(
            "analysis.high_performer_threshold",
            analysis.high_performer_threshold,
            0.0,
            100.0,
        )?;
        validate_range(
            "analysis.low_performer_threshold",
            analysis.low_performer_threshold,
            0.0,
            analysis.high_performer_threshold,
        )?;

        Ok(())
    }
}

impl ConfigProvider for FleetConfig {
    fn anonymizer(&self) -> &AnonymizerSettings {
        &self.anonymizer
    }

    fn analysis(&self) -> &AnalysisSettings {
        &self.analysis
    }

    fn column_aliases(&self) -> &HashMap<String, String> {
        &self.columns
    }
}

impl Validate for FleetConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
