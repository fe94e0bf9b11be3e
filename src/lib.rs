pub mod ai;
pub mod commands;
pub mod config;
pub mod documents;
pub mod error;
pub mod server;
pub mod session;

pub use ai::{CompletionClient, GroqClient, StudyPackage};
pub use commands::{ActionContext, ActionResult};
pub use config::Config;
pub use error::{ErrorKind, StudyError};

use server::ServerError;
use tracing_subscriber::EnvFilter;

/// Load configuration from the environment and serve until Ctrl-C
pub async fn run() -> Result<(), ServerError> {
    // Load .env file - try multiple locations
    // Check current dir first, then the parent (when run from a subdirectory)
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Initialize tracing with RUST_LOG env filter
    // Default: warn for most crates, info for our app
    // Use RUST_LOG=debug for verbose per-request logs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,studyai=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        generation_model = %config.generation_model,
        chat_model = %config.chat_model,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    server::serve(config).await
}
