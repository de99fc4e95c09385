//! airtable-to-sqlite CLI - export Airtable bases into SQLite databases.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use airtable_to_sqlite::{
    select_bases, AirtableClient, BaseExporter, Config, Destination, ExportError, ExportResult,
    SqliteDestination,
};
use clap::Parser;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "airtable-to-sqlite")]
#[command(about = "Export Airtable bases into SQLite databases")]
#[command(version)]
struct Cli {
    /// Base IDs to export (default: every base the token can see)
    #[arg(value_name = "BASE_IDS")]
    base_ids: Vec<String>,

    /// Airtable personal access token
    #[arg(long, env = "AIRTABLE_PERSONAL_ACCESS_TOKEN", hide_env_values = true)]
    personal_access_token: Option<String>,

    /// Use Airtable table and field IDs instead of names
    #[arg(long, env = "AIRTABLE_PREFER_IDS")]
    prefer_ids: bool,

    /// Output filename (default: '{}.db'). Use '{}' to insert the base name
    #[arg(short, long, env = "AIRTABLE_OUTPUT")]
    output: Option<String>,

    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Airtable API root URL
    #[arg(long, env = "AIRTABLE_API_URL")]
    api_url: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ExportError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(ExportError::Config)?;

    let config = build_config(&cli)?;
    config.validate()?;

    let client = Arc::new(AirtableClient::new(
        config.personal_access_token.as_str(),
        &config.api_url,
    )?);

    let bases = select_bases(client.as_ref(), config.requested_bases()).await?;
    config.check_output_for(bases.len())?;

    let mut exported: Vec<(PathBuf, ExportResult)> = Vec::with_capacity(bases.len());
    for base in bases {
        let path = config.output_path(&base);
        info!("Writing base {} to {:?}", base.id, path);

        let destination = Arc::new(SqliteDestination::create(&path).await?);
        let result = BaseExporter::new(client.clone(), destination.clone(), base, config.naming())
            .run()
            .await;
        destination.close().await;
        exported.push((path, result?));
    }

    if cli.output_json {
        let results: Vec<&ExportResult> = exported.iter().map(|(_, r)| r).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for (path, result) in &exported {
            println!(
                "{} ({}): {} tables, {} records, {} link rows -> {}",
                result.base_name,
                result.base_id,
                result.tables,
                result.records,
                result.link_rows,
                path.display()
            );
        }
    }

    Ok(())
}

/// Merge the optional config file with flags and environment variables.
fn build_config(cli: &Cli) -> Result<Config, ExportError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    if let Some(token) = &cli.personal_access_token {
        config.personal_access_token = token.clone();
    }
    if cli.prefer_ids {
        config.prefer_ids = true;
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if !cli.base_ids.is_empty() {
        config.base_ids = cli.base_ids.clone();
    }

    Ok(config)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stderr keeps stdout clean for --output-json
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("log format must be 'text' or 'json', got '{}'", other)),
    }

    Ok(())
}
