//! StartLink - API service for the founder/researcher network

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use startlink::{ai::GeminiClient, config::Args, db::MongoClient, logging::UsageLogger, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("startlink={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  StartLink - founder/researcher API");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Gemini model: {}", args.gemini_model);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing without): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Gemini client (optional; AI routes report the missing key without it)
    let ai = match args.gemini_key() {
        Some(key) => match GeminiClient::new(key, args.gemini_model.clone()) {
            Ok(client) => {
                info!("Gemini client ready (model: {})", args.gemini_model);
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Gemini client init failed, AI routes disabled: {}", e);
                None
            }
        },
        None => None,
    };

    // Usage log (optional)
    let usage = match &args.usage_log_path {
        Some(path) => {
            let logger = UsageLogger::new(args.node_id.to_string());
            match logger.init_file(path.clone()).await {
                Ok(()) => Some(logger),
                Err(e) => {
                    warn!("Usage log init failed ({}): {}", path.display(), e);
                    None
                }
            }
        }
        None => None,
    };

    // Create application state
    let state = match server::AppState::new(args, mongo, ai, usage) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
