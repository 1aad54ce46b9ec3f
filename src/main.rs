use log::info;
use tokio::net::TcpListener;

use form_relay::integration;
use form_relay::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    integration::init_logger();

    let cfg = integration::Config::env();
    let state = AppState::init(&cfg)?;
    let app = form_relay::app(&cfg, state);

    let addr = cfg.env.addr(cfg.port);
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
