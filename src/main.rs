//! mypr - Personal workout tracker backend

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use mypr::api::{self, AppState};
use mypr::assistant::GeminiClient;
use mypr::auth::TokenKeys;
use mypr::db::Database;

#[derive(Parser)]
#[command(name = "mypr")]
#[command(author, version, about = "Personal workout tracker backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:8787", env = "MYPR_ADDR")]
        addr: String,

        /// SQLite database path
        #[arg(long, default_value = "mypr.db", env = "MYPR_DB")]
        db: String,

        /// Secret for signing session tokens
        #[arg(long, env = "MYPR_JWT_SECRET")]
        jwt_secret: String,

        /// Gemini API key; the coach endpoint is disabled without it
        #[arg(long, env = "GEMINI_API_KEY")]
        gemini_api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            addr,
            db,
            jwt_secret,
            gemini_api_key,
        } => {
            let database = Database::open(&db)?;

            let coach = match gemini_api_key {
                Some(key) if !key.is_empty() => Some(GeminiClient::new(key)?),
                _ => {
                    info!("no Gemini API key configured, coach endpoint disabled");
                    None
                }
            };

            let state = AppState::new(database, TokenKeys::from_secret(&jwt_secret), coach);
            let app = api::router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!("listening on {}, database: {}", addr, db);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
