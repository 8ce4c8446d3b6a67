use anyhow::Context;
use clap::Parser;

use labelsheet::Args;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Args::parse()
        .into_config()
        .context("Invalid label configuration")?;

    let summary = labelsheet::run(&config).context("Could not produce the label sheet")?;
    println!("{summary}");

    Ok(())
}
