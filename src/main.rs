//! openhouse - scheduling and dashboard service for a real-estate CRM

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use openhouse::{
    config::Args,
    db::{
        schemas::{CalendarEvent, Lead, EVENT_COLLECTION, LEAD_COLLECTION},
        DocumentStore, MemoryStore, MongoClient,
    },
    logging, server, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init_tracing(&args.log_filter(), args.log_format);

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  openhouse");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db '{}')", args.mongodb_uri, args.mongodb_db);
    info!("Request timeout: {} ms", args.request_timeout_ms);
    info!("Upcoming window: {} days", args.upcoming_window_days);
    if let Some(dir) = &args.mirror_dir {
        info!("Calendar mirror: {}", dir.display());
    }
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db, args.request_timeout_ms)
        .await
    {
        Ok(client) => {
            info!("MongoDB connected successfully");
            if let Err(e) = client.ensure_indexes::<Lead>(LEAD_COLLECTION).await {
                warn!("Failed to create lead indexes: {}", e);
            }
            if let Err(e) = client.ensure_indexes::<CalendarEvent>(EVENT_COLLECTION).await {
                warn!("Failed to create event indexes: {}", e);
            }
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let store: Arc<dyn DocumentStore> = match &mongo {
        Some(client) => Arc::new(client.clone()),
        None => Arc::new(MemoryStore::new()),
    };

    let state = Arc::new(AppState::with_store(args, store));
    let result = server::run(state).await;

    if let Some(client) = mongo {
        client.shutdown().await;
    }

    result?;
    info!("openhouse stopped");
    Ok(())
}
