//! Tomato Timer - a pomodoro countdown with a synthesized bell alert
//! 
//! This is the main entry point for the tomato-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use tomato_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    services::{AudioService, RodioAudio, SilentAudio, TokioTimers},
    tasks::display_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so they do not tear the status line on stdout
    tracing_subscriber::fmt()
        .with_env_filter(format!("tomato_timer={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting tomato-timer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, minutes={}, mute={}",
          config.host, config.port, config.minutes, config.mute);

    let audio: Arc<dyn AudioService> = if config.mute {
        Arc::new(SilentAudio)
    } else {
        Arc::new(RodioAudio::new())
    };

    // Create application state
    let state = AppState::new(
        config.port,
        config.host.clone(),
        config.minutes,
        Arc::new(TokioTimers::new()),
        audio,
    );

    if !config.no_display {
        tokio::spawn(display_task(state.subscribe()));
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /set     - Set duration, body {{\"minutes\": 1-30}}");
    info!("  POST /toggle  - Start or pause the countdown");
    info!("  POST /reset   - Reset the countdown and silence the alert");
    info!("  GET  /status  - Current clock and controls");
    info!("  GET  /health  - Health check");

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
    info!("Shutdown complete");
    Ok(())
}
