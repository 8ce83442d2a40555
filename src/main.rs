use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rosterd::db;
use rosterd::http::{create_router, AppState};

#[derive(Parser)]
#[command(name = "rosterd", about = "Student roster and attendance service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Data directory holding the roster database
    #[arg(short, long, default_value = "data")]
    data_dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rosterd=info,tower_http=warn")),
        )
        .init();

    let args = Args::parse();

    let conn = db::open_db(Path::new(&args.data_dir))?;
    let state = AppState {
        db: Arc::new(parking_lot::Mutex::new(conn)),
    };

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
