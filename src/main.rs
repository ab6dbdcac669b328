use clap::Parser;
use page_ingest::utils::{logger, validation::Validate};
use page_ingest::{CliConfig, EtlEngine, EtlError, HttpClient, LocalStorage};

async fn run(cli: &CliConfig) -> Result<(), EtlError> {
    let config = cli.ingest_config()?;
    config.validate()?;

    let root = cli.bucket_root(&config.bucket_name);
    tracing::info!("Writing objects under {}", root.display());

    let source = HttpClient::new(config.http.clone())?;
    let engine = EtlEngine::new(source, LocalStorage::new(root), config);
    let summary = engine.run().await?;

    for (table, result) in &summary.results {
        println!("{:<16} {:>8} rows  {}", table, result.rows, result.s3_key);
    }
    println!("Total rows: {}", summary.total_rows);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting page-ingest CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "Ingestion failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.severity().exit_code());
    }
}
