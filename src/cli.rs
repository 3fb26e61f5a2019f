//! Command-line interface for the voxcrm server binary

use clap::Parser;

/// Voice/text agent orchestration service for the Voxcrm CRM
#[derive(Debug, Parser)]
#[command(name = "voxcrm", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "VOXCRM_CONFIG")]
    pub config: Option<String>,

    /// Listen address override (host:port)
    #[arg(short, long, env = "VOXCRM_LISTEN")]
    pub listen: Option<String>,

    /// Session database path override
    #[arg(long, env = "VOXCRM_SESSION_DB")]
    pub session_db: Option<String>,
}

impl Cli {
    /// Parses CLI arguments from the process environment
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
