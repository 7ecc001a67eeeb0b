use anyhow::Context;
use args::{Cli, Format};
use clap::Parser;
use querypilot::{ConnectionPool, Registry, Workload};
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::EnvFilter;

mod args;
mod printer;

const DEFAULT_LOG_FILTER: &str = "querypilot=info";

fn main() -> anyhow::Result<()> {
    // Argument errors exit here, before any connection is attempted.
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(threads) = cli.threads {
        runtime.worker_threads(threads.get());
    }
    let runtime = runtime.build().context("failed to start the async runtime")?;

    runtime.block_on(run(cli))
}

#[instrument(name = "querypilot", skip_all, fields(host = %cli.host, database = %cli.database))]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.run_config()?;
    let domain = cli.domain()?;
    let registry = Registry::employees();

    if cli.format == Format::Text {
        print!(
            "{}",
            printer::banner(
                config.total_requests.get(),
                config.concurrency.get(),
                registry.len()
            )
        );
    }

    let pool = ConnectionPool::connect(cli.connector(), cli.pool_size(), cli.acquire_timeout)
        .await
        .with_context(|| format!("failed to create pool for {}:{}", cli.host, cli.port))?;
    let pool = Arc::new(pool);

    let report = Workload::new(pool.clone(), config)
        .registry(registry)
        .domain(domain)
        .active(cli.active())
        .await?;

    debug!("Pool stats: {:?}", pool.stats());
    pool.close();

    match cli.format {
        Format::Text => print!("{}", printer::render(&report)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
