//! Greenway - campus sustainability engagement backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greenway::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    feed::{FeedStore, MemoryFeed, MongoFeed},
    ledger::{Ledger, LedgerStore, MemoryStore, MongoLedgerStore},
    notify::{MemoryNotifier, MongoNotifier, Notifier},
    objstore::DiskObjectStore,
    server::{self, AppState},
};

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
                .unwrap_or_else(|_| format!("greenway={},info", log_level).into()),
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
    info!("  Greenway - campus sustainability");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Media dir: {}", args.media_dir);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!(
                    "MongoDB connection failed (dev mode, continuing in-memory): {}",
                    e
                );
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Assemble the storage seams over MongoDB or the in-memory fallback
    let (store, notifier, feed): (Arc<dyn LedgerStore>, Arc<dyn Notifier>, Arc<dyn FeedStore>) =
        match &mongo {
            Some(client) => (
                Arc::new(MongoLedgerStore::new(client).await?),
                Arc::new(MongoNotifier::new(client).await?),
                Arc::new(MongoFeed::new(client).await?),
            ),
            None => (
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryNotifier::new()),
                Arc::new(MemoryFeed::new()),
            ),
        };

    let objects = DiskObjectStore::new(args.media_dir.clone(), args.public_url.clone());
    objects.ensure_dir().await?;

    let jwt = match args.effective_jwt_secret() {
        Some(secret) => JwtValidator::new(secret, args.jwt_expiry_seconds)?,
        None => {
            error!("JWT_SECRET is required in production mode");
            std::process::exit(1);
        }
    };

    let ledger = Arc::new(Ledger::new(store, notifier.clone()));
    let state = AppState::new(args, ledger, notifier, feed, Arc::new(objects), jwt);

    server::run(Arc::new(state)).await?;
    Ok(())
}
