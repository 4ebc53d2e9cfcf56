use clap::Parser;
use fleet_etl::app::exit_with;
use fleet_etl::utils::{logger, validation::Validate};
use fleet_etl::{AnalyzeCli, AnalyzePipeline, EtlEngine, FleetConfig, LocalStorage, LogFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = AnalyzeCli::parse();

    // 初始化日誌
    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting fleet-analyze");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = args.validate() {
        exit_with("Argument validation", e);
    }
    let config = match FleetConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with("Loading configuration", e),
    };
    if let Err(e) = config.validate() {
        exit_with("Configuration validation", e);
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = AnalyzePipeline::new(
        storage,
        config,
        args.payments.clone(),
        args.trips.clone(),
        args.output.clone(),
        args.format,
    );
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(destination) => {
            if args.output.is_some() {
                println!("📁 Report saved to: {}", destination);
            }
        }
        Err(e) => exit_with("Analysis", e),
    }
}
