use crate::app::pipelines::ensure_not_source;
use crate::core::anonymizer::{AnonymizationSummary, Anonymizer};
use crate::core::privacy::PrivacyGuard;
use crate::core::table::{read_table, write_table};
use crate::domain::model::{Table, TableKind};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Mutex;

pub struct AnonymizedTable {
    pub table: Table,
    pub summary: AnonymizationSummary,
}

/// Reads one raw export, masks every sensitive column and writes the result
/// only if the privacy scan over the written bytes comes back clean.
pub struct AnonymizePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    kind: TableKind,
    input: String,
    output: String,
    summary: Mutex<Option<AnonymizationSummary>>,
}

/// `data/payorder.csv` -> `data/payorder_anonymized.csv`
pub fn default_output_path(input: &str) -> String {
    let path = Path::new(input);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!("{}_anonymized.csv", stem))
        .to_string_lossy()
        .to_string()
}

impl<S: Storage, C: ConfigProvider> AnonymizePipeline<S, C> {
    pub fn new(storage: S, config: C, kind: TableKind, input: String, output: Option<String>) -> Self {
        let output = output.unwrap_or_else(|| default_output_path(&input));
        Self {
            storage,
            config,
            kind,
            input,
            output,
            summary: Mutex::new(None),
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output
    }

    /// Summary of the last successful transform.
    pub fn summary(&self) -> Option<AnonymizationSummary> {
        self.summary.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AnonymizePipeline<S, C> {
    type Extracted = Table;
    type Transformed = AnonymizedTable;

    async fn extract(&self) -> Result<Table> {
        ensure_not_source(&self.output, &[&self.input])?;

        tracing::debug!("Reading {} export from {}", self.kind, self.input);
        let data = self.storage.read_file(&self.input).await?;
        let table = read_table(&data, self.kind, self.config.column_aliases())?;
        table.require_schema()?;

        tracing::info!(
            "Extracted {} {} row(s) with {} column(s)",
            table.len(),
            self.kind,
            table.headers.len()
        );
        Ok(table)
    }

    async fn transform(&self, mut table: Table) -> Result<AnonymizedTable> {
        let summary = Anonymizer::new(self.config.anonymizer()).anonymize(&mut table);

        for (field, count) in &summary.defaulted_fields {
            tracing::warn!(
                "⚠️ {} {} value(s) were empty or malformed and replaced by a placeholder",
                count,
                field
            );
        }
        tracing::info!(
            "Anonymized {} row(s): {} distinct driver(s), {} distinct vehicle(s)",
            summary.written_rows,
            summary.distinct_drivers,
            summary.distinct_vehicles
        );

        if let Ok(mut slot) = self.summary.lock() {
            *slot = Some(summary.clone());
        }
        Ok(AnonymizedTable { table, summary })
    }

    async fn load(&self, result: AnonymizedTable) -> Result<String> {
        let bytes = write_table(&result.table)?;

        let guard = PrivacyGuard::new(&self.config.anonymizer().forbidden_tokens);
        if guard.token_count() == 0 {
            tracing::warn!("⚠️ No forbidden tokens configured, privacy scan is a no-op");
        }
        let check = |data: &[u8]| guard.verify(data);

        self.storage
            .write_file_checked(&self.output, &bytes, &check)
            .await?;

        tracing::info!(
            "Wrote {} row(s) to {} ({} skipped at load)",
            result.summary.written_rows,
            self.output,
            result.summary.skipped_rows
        );
        Ok(self.output.clone())
    }
}
