pub mod analysis;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::app::pipelines::{AnalyzePipeline, AnonymizePipeline};
pub use crate::app::report::ReportFormat;
pub use crate::config::cli::LocalStorage;
pub use crate::config::toml_config::FleetConfig;
#[cfg(feature = "cli")]
pub use crate::config::{AnalyzeCli, AnonymizeCli, LogFormat};
pub use crate::core::etl::EtlEngine;
pub use crate::domain::model::TableKind;
pub use crate::utils::error::{EtlError, Result};
