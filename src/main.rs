use clap::Parser;
use contact_etl::adapters::http::build_client;
use contact_etl::utils::logger::{self, LogFormat};
use contact_etl::{
    ApiTokenProvider, CliConfig, ContactError, ContactPipeline, HttpContactStore, PartialConfig,
    TomlConfig,
};

fn load_config(cli: &CliConfig) -> contact_etl::Result<contact_etl::AppConfig> {
    let file = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading config file: {}", path.display());
            PartialConfig::from(TomlConfig::from_file(path)?)
        }
        None => PartialConfig::default(),
    };
    file.merge(PartialConfig::from(cli)).resolve()
}

fn report_failure(e: &ContactError) -> ! {
    tracing::error!(
        "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_logger(LogFormat::from_flag(cli.json_logs), cli.verbose);

    tracing::info!("Starting contact-etl ({})", cli.operation);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => report_failure(&e),
    };

    let client = match build_client(config.timeout_seconds) {
        Ok(client) => client,
        Err(e) => report_failure(&e),
    };

    // 每次執行都重新取得 token
    let tokens = ApiTokenProvider::new(client.clone(), &config.base_url, config.credentials.clone());
    let store = HttpContactStore::new(client, &config.base_url);
    let pipeline = ContactPipeline::with_settings(store, tokens, config.pipeline_settings());

    match pipeline.run(cli.operation).await {
        Ok(report) => {
            tracing::info!(
                "✅ {} completed: fetched {}, saved {}",
                report.operation,
                report.fetched,
                report.persisted.len()
            );
            println!(
                "✅ {}: fetched {} contacts, saved {}",
                report.operation,
                report.fetched,
                report.persisted.len()
            );
            for contact in &report.persisted {
                println!("  {} - {} ({})", contact.display_name(), contact.title, contact.age);
            }
        }
        Err(e) => report_failure(&e),
    }
}
