//! mtapi - Nearest-station subway arrivals from the MTA realtime feeds
//! 
//! This is the main entry point for the mtapi application.

use std::{io, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use mtapi::{
    api::create_router,
    config::{Command, Config, LocateArgs, ServeArgs, WatchArgs},
    dashboard::{location, Dashboard, LocationStore, RpcClient},
    feed::{FeedClient, ServiceStatusClient},
    gtfs::TransitNetwork,
    state::AppState,
    tasks::feed_refresh_task,
    utils::shutdown_signal,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // The dashboard owns stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(format!("mtapi={},tower_http=info", config.log_level()))
        .with_writer(io::stderr)
        .init();

    match config.command {
        Command::Serve(args) => serve(args).await,
        Command::Watch(args) => watch(args).await,
        Command::Locate(args) => locate(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting mtapi server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, feeds={:?}, refresh={}s",
        args.host, args.port, args.feed_ids, args.refresh_secs
    );

    let network = TransitNetwork::load(&args.gtfs_path)?;

    let client = FeedClient::new(args.feed_config())?;
    let status_client = ServiceStatusClient::new(args.status_url.clone(), HTTP_TIMEOUT)?;
    info!("Service status from {}", status_client.url());
    let state = Arc::new(
        AppState::new(network, args.port, args.host.clone(), client.feed_ids())
            .with_service_status(status_client),
    );

    // Start the feed refresh background task
    let refresh_state = Arc::clone(&state);
    let every = args.refresh_interval();
    let refresh = tokio::spawn(async move {
        feed_refresh_task(refresh_state, client, every).await;
    });

    let app = create_router(Arc::clone(&state), &args.router_options());

    let addr = args.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /rpc    - JSON-RPC: GetStations, GetStation, GetClosestStations, GetSystemStatus");
    info!("  GET  /status - Feed health and uptime");
    info!("  GET  /health - Health check");
    if let Some(static_path) = &args.static_path {
        info!("  GET  /       - Dashboard from {}", static_path.display());
    }

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    if let Err(e) = refresh.await {
        tracing::error!("Feed refresh task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn watch(args: WatchArgs) -> anyhow::Result<()> {
    let store = LocationStore::new(args.location_file.clone());
    let coordinates = location::resolve(args.coordinates(), &store)?;
    let client = RpcClient::new(&args.server, HTTP_TIMEOUT)?;
    let mut dashboard = Dashboard::new(client, store, coordinates, args.dashboard_options());

    if args.once {
        dashboard.refresh().await?;
        print!("{}", dashboard.screen());
        return Ok(());
    }

    dashboard.run(io::stdout(), shutdown_signal()).await?;
    Ok(())
}

fn locate(args: LocateArgs) -> anyhow::Result<()> {
    let store = LocationStore::new(args.location_file.clone());
    store.save(mtapi::Coordinates::new(args.lat, args.lon))?;
    info!(
        "Saved location {}, {} to {}",
        args.lat,
        args.lon,
        store.path().display()
    );
    Ok(())
}
