mod app;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::Write;

use app::{Cli, init_output, print_summary, process_batch, process_single, summarize_rules};
use legal_speeds::SpeedLimitsData;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let start = std::time::Instant::now();
    let data = SpeedLimitsData::load(&cli.rules)?;
    let summary = summarize_rules(&data);
    let speeds = data.into_resolver()?;
    tracing::info!(
        "Rules: loaded {:?} in {:.2}s",
        cli.rules,
        start.elapsed().as_secs_f64()
    );

    let mut out = init_output(cli.output.as_deref())?;

    if cli.check {
        print_summary(&summary, &mut out)?;
    } else {
        let assumptions: HashMap<String, bool> = cli.assumptions.iter().cloned().collect();
        match &cli.input {
            Some(input) => {
                let start = std::time::Instant::now();
                let count = process_batch(input, &speeds, &assumptions, &mut out)?;
                let elapsed = start.elapsed();
                tracing::info!(
                    "Done! Resolved {} roads in {:.2}s ({} roads/s)",
                    count,
                    elapsed.as_secs_f64(),
                    (count as f64 / elapsed.as_secs_f64()) as u64
                );
            }
            None => process_single(&cli, &speeds, &assumptions, &mut out)?,
        }
    }

    out.flush().context("Output: Failed to flush")?;
    Ok(())
}
