//! Postboard Server - store, resolvers and notification bus in one process.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postboard_core::Store;
use postboard_server::config::DEFAULT_LOG_FILTER;
use postboard_server::{load_demo_data, Args, Context};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Postboard server");

    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        data_path = ?config.data_path,
        subscription_capacity = config.subscription_capacity,
        seed_demo_data = config.seed_demo_data,
        "configuration loaded"
    );

    let store = Arc::new(Store::open(&config.store_config())?);
    let context = Context::new(store);

    let stats = context.store().stats();
    if config.seed_demo_data && stats.users == 0 {
        load_demo_data(context.store())?;
    } else {
        tracing::info!(
            users = stats.users,
            posts = stats.posts,
            comments = stats.comments,
            "store ready"
        );
    }

    // Log the post feed until shutdown
    let mut feed = context.subscription().post();
    let feed_cancel = feed.cancel_handle();
    let feed_task = config.log_events.then(|| {
        tokio::spawn(async move {
            while let Some(event) = feed.next().await {
                if let Some(event) = event.as_post() {
                    tracing::info!(
                        mutation = ?event.mutation,
                        post_id = %event.data.id,
                        title = %event.data.title,
                        "post event"
                    );
                }
            }
            if feed.dropped_events() > 0 {
                tracing::warn!(dropped = feed.dropped_events(), "post feed fell behind");
            }
        })
    });

    tracing::info!("server ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
    }
    tracing::info!("received shutdown signal");

    feed_cancel.cancel();
    if let Some(task) = feed_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "post feed task failed");
        }
    }

    context.store().flush()?;
    tracing::info!("server shutdown complete");

    Ok(())
}
