use std::path::Path;

use anyhow::{bail, Context, Result};
use binstage::{config::Config, index, server, shutdown::ShutdownFlag, stage};
use tempfile::TempDir;

fn usage() -> &'static str {
    "Usage:\n  binstage [config.toml]\n\nWithout a config file the compiled-in oc release layout is served."
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [] => Config::default(),
        [path] => Config::load(Path::new(path))?,
        _ => bail!(usage()),
    };

    let shutdown = ShutdownFlag::install()?;

    // Removed when the guard drops, including after a signal-triggered
    // shutdown of the serve loop.
    let staging = TempDir::new().context("creating staging directory")?;
    println!("[stage] staging in {}", staging.path().display());

    let links = stage::build_staging(&config, staging.path())?;
    index::write_indexes(staging.path(), &links)?;

    println!("[serve] listening on 0.0.0.0:{}", config.listen_port);
    server::serve(staging.path(), config.listen_port, &shutdown)?;

    println!("[serve] shutting down");
    Ok(())
}
