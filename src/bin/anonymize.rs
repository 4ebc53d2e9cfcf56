use clap::Parser;
use fleet_etl::app::exit_with;
use fleet_etl::utils::{logger, validation::Validate};
use fleet_etl::{AnonymizeCli, AnonymizePipeline, EtlEngine, FleetConfig, LocalStorage, LogFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = AnonymizeCli::parse();

    // 初始化日誌
    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting fleet-anonymize ({} export)", args.kind);
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 驗證參數與配置
    if let Err(e) = args.validate() {
        exit_with("Argument validation", e);
    }
    let mut config = match FleetConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with("Loading configuration", e),
    };
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        exit_with("Configuration validation", e);
    }
    if config.anonymizer.forbidden_tokens.is_empty() {
        tracing::warn!("⚠️ No forbidden tokens configured, output will not be privacy-checked");
        eprintln!("⚠️ No forbidden tokens: the output is NOT privacy-checked");
        eprintln!("💡 建議: pass --forbid <TOKEN> or set [anonymizer] forbidden_tokens");
    }
    if config.anonymizer.salt.is_empty() {
        tracing::warn!("⚠️ No salt configured, identifier tokens are an unsalted SHA-256");
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = AnonymizePipeline::new(
        storage,
        config,
        args.kind,
        args.input.clone(),
        args.output.clone(),
    );
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(output_path) => {
            if let Some(summary) = engine.pipeline().summary() {
                println!(
                    "✅ Anonymized {} of {} row(s) ({} skipped, {} with placeholders)",
                    summary.written_rows,
                    summary.input_rows,
                    summary.skipped_rows,
                    summary.defaulted_rows
                );
            }
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with("Anonymization", e),
    }
}
