use anyhow::Context as _;
use c_dns::{setup_logging, Args, DnsServer};
use clap::Parser as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.log_file.as_deref())?;

    let config = args.server_config();
    let mut server = DnsServer::bind(config)
        .await
        .context("failed to instantiate the DNS server")?;
    tracing::info!(
        addr = %server.local_addr()?,
        upstream = %config.upstream_resolver,
        "Listening for DNS queries over UDP and TCP"
    );

    server.add_workers(args.workers);
    server.spawn_stats_reporter(args.stats_interval());

    tokio::select! {
        result = server.block_until_completion() => result,
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for the shutdown signal")?;
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
