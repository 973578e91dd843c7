pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lottery")]
#[command(about = "Publish, enter and settle confidential lottery draws")]
pub struct Args {
    /// Path to the lottery directory (defaults to ~/.lottery)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level override, e.g. `debug` (defaults to the configured level)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: crate::Command,
}
