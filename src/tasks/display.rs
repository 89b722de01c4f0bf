//! Terminal display background task

use std::io::{self, Write};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::display::{render_line, TimerView};

/// Redraw the status line on stdout whenever the view changes. Ends when the
/// application state is dropped.
pub async fn display_task(mut views: watch::Receiver<TimerView>) {
    info!("Starting display task");

    let initial = views.borrow_and_update().clone();
    redraw(&initial);

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        redraw(&view);
    }

    println!();
    info!("Display task finished");
}

fn redraw(view: &TimerView) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = draw(&mut out, view) {
        warn!("Failed to draw status line: {}", e);
    }
}

/// Overwrite the current terminal line with the view
pub fn draw<W: Write>(out: &mut W, view: &TimerView) -> io::Result<()> {
    write!(out, "\r\x1b[2K{}", render_line(view))?;
    out.flush()
}
