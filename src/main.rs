use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intent_backend::{api, config::Config, db};

#[derive(Parser)]
#[command(name = "intentd")]
#[command(about = "Record service for engineering intents and goals")]
struct Cli {
    /// Database file. Overrides INTENT_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API. Overrides INTENT_PORT.
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind. Overrides INTENT_BIND_ADDR.
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Apply pending schema migrations and exit
    Migrate,
}

/// Initialize tracing, as JSON lines when LOG_FORMAT=json.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "intent_backend=debug,tower_http=debug".into()),
    );

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env();
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }

    let db = db::Database::open_configured(&config.database)?;
    db.migrate().context("Failed to run migrations")?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        bind: None,
    }) {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }

            let addr = format!("{}:{}", config.server.bind_addr, config.server.port);
            let app = api::create_router(db, config.server.request_timeout);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Intent server listening on http://{}", addr);

            axum::serve(listener, app).await?;
        }
        Commands::Migrate => {
            tracing::info!("Migrations applied");
        }
    }

    Ok(())
}
