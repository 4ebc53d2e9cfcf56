use crate::analysis::{analyze, AnalysisReport};
use crate::app::pipelines::ensure_not_source;
use crate::app::report::{render, ReportFormat};
use crate::core::records::{parse_payments, parse_trips, Parsed};
use crate::core::table::read_table;
use crate::domain::model::{PaymentRecord, Table, TableKind, TripRecord};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use std::io::Write;

pub struct AnalysisInput {
    pub payments: Parsed<PaymentRecord>,
    pub trips: Parsed<TripRecord>,
}

pub struct AnalyzePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    payments: String,
    trips: String,
    output: Option<String>,
    format: ReportFormat,
}

impl<S: Storage, C: ConfigProvider> AnalyzePipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        payments: String,
        trips: String,
        output: Option<String>,
        format: ReportFormat,
    ) -> Self {
        Self {
            storage,
            config,
            payments,
            trips,
            output,
            format,
        }
    }

    async fn load_table(&self, path: &str, kind: TableKind) -> Result<Table> {
        let data = self.storage.read_file(path).await?;
        let table = read_table(&data, kind, self.config.column_aliases())?;
        table.require_schema()?;
        Ok(table)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AnalyzePipeline<S, C> {
    type Extracted = AnalysisInput;
    type Transformed = AnalysisReport;

    async fn extract(&self) -> Result<AnalysisInput> {
        if let Some(output) = &self.output {
            ensure_not_source(output, &[&self.payments, &self.trips])?;
        }

        let payments = parse_payments(&self.load_table(&self.payments, TableKind::Payments).await?)?;
        let trips = parse_trips(&self.load_table(&self.trips, TableKind::Trips).await?)?;

        for (kind, rejected) in [
            (TableKind::Payments, &payments.rejected),
            (TableKind::Trips, &trips.rejected),
        ] {
            for (reason, count) in &rejected.counts {
                tracing::warn!("⚠️ Excluded {} {} row(s): {}", count, kind, reason);
            }
        }
        tracing::info!(
            "Extracted {} payment(s) and {} trip(s)",
            payments.records.len(),
            trips.records.len()
        );
        Ok(AnalysisInput { payments, trips })
    }

    async fn transform(&self, input: AnalysisInput) -> Result<AnalysisReport> {
        let report = analyze(&input.payments, &input.trips, self.config.analysis());
        tracing::info!(
            "Analyzed {} completed payment(s) across {} driver(s)",
            report.completed_payments,
            report.earnings.drivers
        );
        Ok(report)
    }

    async fn load(&self, report: AnalysisReport) -> Result<String> {
        let rendered = render(&report, self.format)?;
        match &self.output {
            Some(path) => {
                self.storage.write_file(path, rendered.as_bytes()).await?;
                Ok(path.clone())
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
                Ok("stdout".to_string())
            }
        }
    }
}
