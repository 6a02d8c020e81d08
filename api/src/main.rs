use clap::{Parser, Subcommand};
use partner_api::config::AppConfig;
use partner_api::database::partners::PARTNERS;
use partner_api::database::{partner_search_registry, Database, Partners};
use partner_api::openapi::create_combined_api;
use partner_api::request_logging::RequestLogging;
use partner_api::search::{build_sql, decode_search_param, PredicateCompiler};
use poem::{
    handler, listener::TcpListener, middleware::Cors, web::Redirect, Endpoint, EndpointExt, Route,
    Server,
};
use poem_openapi::OpenApiService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "api-server")]
#[command(about = "Partner API Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Compile a partner search and print the generated SQL
    Explain {
        /// Search document as JSON or base64-encoded JSON
        search: String,
    },
}

#[handler]
fn root_redirect() -> Redirect {
    Redirect::temporary("/api/v1/docs")
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve => serve_command().await,
        Commands::Explain { search } => explain_command(&search),
    }
}

/// Build the partner search compiler, refusing to start with an incomplete registry
fn setup_compiler() -> Result<PredicateCompiler, std::io::Error> {
    let registry = partner_search_registry();
    if let Err(e) = registry.validate_entity(&PARTNERS) {
        tracing::error!("Search strategy registry is incomplete: {}", e);
        return Err(std::io::Error::other(format!(
            "Search registry validation failed: {}",
            e
        )));
    }
    tracing::info!("Search registry ready with {} strategies", registry.len());
    Ok(PredicateCompiler::new(Arc::new(registry)))
}

async fn serve_command() -> Result<(), std::io::Error> {
    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(std::io::Error::other(format!("Invalid configuration: {:#}", e)));
        }
    };
    let compiler = Arc::new(setup_compiler()?);

    let database = match Database::new(&config.database_url).await {
        Ok(db) => {
            tracing::info!("Database initialized at {}", config.database_url);
            Arc::new(db)
        }
        Err(e) => {
            tracing::error!(
                "Failed to initialize database at {}: {:#}",
                config.database_url,
                e
            );
            return Err(std::io::Error::other(format!(
                "Database initialization failed: {}",
                e
            )));
        }
    };

    let addr = config.bind_addr();
    tracing::info!(
        "Starting Partner API server on {} ({})",
        addr,
        config.environment
    );

    let app = build_app(database, compiler, config);
    Server::new(TcpListener::bind(&addr)).run(app).await
}

/// Routes, shared state and middleware of the HTTP server
fn build_app(
    database: Arc<Database>,
    compiler: Arc<PredicateCompiler>,
    config: Arc<AppConfig>,
) -> impl Endpoint {
    let api_service = OpenApiService::new(
        create_combined_api(),
        "Partner API",
        env!("CARGO_PKG_VERSION"),
    )
    .server("/api/v1");
    let docs = api_service.swagger_ui();
    let spec = api_service.spec_endpoint();

    Route::new()
        .at("/", poem::get(root_redirect))
        .at("/api/v1/openapi.json", spec)
        .nest("/api/v1/docs", docs)
        .nest("/api/v1", api_service)
        .data(database)
        .data(compiler)
        .data(config)
        .with(RequestLogging)
        .with(Cors::new())
}

fn explain_command(raw: &str) -> Result<(), std::io::Error> {
    let compiler = setup_compiler()?;
    let predicate = decode_search_param::<Partners>(raw)
        .and_then(|search| compiler.compile(&search))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let fragment = build_sql(&predicate);
    println!("WHERE {}", fragment.sql);
    let binds = serde_json::to_string(&fragment.binds).map_err(std::io::Error::other)?;
    println!("binds: {}", binds);
    Ok(())
}
