mod core;
mod ewmh;
#[cfg(test)]
mod testing;
mod window;

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tilite_config::TiliteConfig;

use crate::core::context::Context;
use crate::core::cursors::Cursors;
use crate::window::error::log_warn;
use crate::window::manager::WindowManager;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/tilite/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    info!("Starting tilite...");

    let config = TiliteConfig::load(args.config.as_deref())?;
    let settings = config.resolve()?;

    let ctx = match Context::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("Screen: {}, Root Window: {:#x}", ctx.screen_num, ctx.root_window);

    let cursors = log_warn(Cursors::load(&ctx.conn, ctx.screen_num), "loading cursors")
        .unwrap_or_default();

    let mut wm = WindowManager::new(ctx, settings, cursors);
    wm.setup()?;
    wm.scan_windows()?;

    loop {
        match wm.run() {
            Ok(()) => break,
            Err(e) if e.is_fatal() => {
                error!("Fatal: {}", e);
                return Err(e.into());
            }
            Err(e) => error!("Request failed (continuing): {}", e),
        }
    }

    Ok(())
}
