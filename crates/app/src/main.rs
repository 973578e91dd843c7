mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Draw, Init, Register, Round, Users, Version};
use state::AppState;

command_enum! {
    (Init, Init),
    (Register, Register),
    (Users, Users),
    (Draw, Draw),
    (Round, Round),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging follows the flag, then the lottery directory's config, then `warn`
    let loaded = AppState::load(args.config_path.clone()).ok();
    let level = args
        .log_level
        .or_else(|| loaded.as_ref().and_then(|s| s.config.level().ok()))
        .unwrap_or(tracing::Level::WARN);
    let log_dir = loaded.as_ref().and_then(|s| s.config.log_dir.clone());
    let guards = logging::init_logging(level, log_dir.as_deref());

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guards);
    std::process::exit(code);
}
