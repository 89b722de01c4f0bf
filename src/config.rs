//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "tomato-timer")]
#[command(about = "A tomato-shaped pomodoro countdown with a synthesized bell alert")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial countdown duration in minutes (clamped to 1-30)
    #[arg(short, long, default_value = "25", allow_negative_numbers = true)]
    pub minutes: i64,

    /// Ring without sound
    #[arg(long)]
    pub mute: bool,

    /// Do not draw the clock on stdout
    #[arg(long)]
    pub no_display: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
