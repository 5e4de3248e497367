use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod schema;
pub mod service;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Ask the invoice database questions in plain language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server (default)
    Start {
        /// Port to listen on; defaults to PORT from the environment
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the schema text handed to the model
    Schema,
    /// Report which configuration values are set
    Check,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize Logging/Tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let config = config::AppConfig::from_env();

    match cli.command {
        Some(Commands::Start { port }) => {
            let port = port.unwrap_or(config.port);
            start_server(config, port).await?;
        }
        Some(Commands::Schema) => {
            println!("{}", schema::SCHEMA_TEXT);
        }
        Some(Commands::Check) => {
            print_config_report(&config);
        }
        None => {
            // Default to starting the server on the configured port
            let port = config.port;
            start_server(config, port).await?;
        }
    }

    Ok(())
}

fn print_config_report(config: &config::AppConfig) {
    println!("DB_HOST:         {}", config.db.host);
    println!("DB_PORT:         {}", config.db.port);
    println!("DB_NAME:         {}", config.db.name);
    println!("DB_USER:         {}", config.db.user);
    println!(
        "DB_PASSWORD:     {}",
        if config.db.password.is_empty() { "(empty)" } else { "(set)" }
    );
    println!(
        "GROQ_API_KEY:    {}",
        if config.groq.api_key.is_some() { "configured" } else { "missing" }
    );
    println!("GROQ_MODEL:      {}", config.groq.model);
    println!("GROQ_API_URL:    {}", config.groq.endpoint);
    println!("ENVIRONMENT:     {}", config.environment);
    println!("PORT:            {}", config.port);
    println!(
        "ALLOWED_ORIGINS: {}",
        if config.allowed_origins.is_empty() {
            "(none)".to_string()
        } else {
            config.allowed_origins.join(", ")
        }
    );
}

pub async fn start_server(
    config: config::AppConfig,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting askdb - natural language gateway to the invoice database");

    let config = Arc::new(config);

    if config.groq.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; /query will fail until it is configured");
    }

    let provider: Arc<dyn ai::LlmProvider> = Arc::new(ai::GroqProvider::new(
        config.groq.api_key.as_deref().unwrap_or_default(),
        &config.groq.model,
        &config.groq.endpoint,
    ));
    let executor: Arc<dyn db::SqlExecutor> = Arc::new(db::PgExecutor::new(&config.db));
    let service = Arc::new(service::QueryService::new(provider, executor.clone()));

    let app = api::router(service, executor, config.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("askdb listening on {}", addr);
    info!("API Endpoints:");
    info!("  - Query:     POST http://{}/query", addr);
    info!("  - Health:    GET  http://{}/health", addr);
    info!("  - Schema:    GET  http://{}/schema", addr);
    info!("  - Dashboard: GET  http://{}/stats, /invoices, /vendors/top10, ...", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
