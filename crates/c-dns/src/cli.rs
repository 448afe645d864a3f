use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::ServerConfig;

#[derive(Parser, Debug)]
#[command(version, name = "c-dns", about = "Caching, forwarding DNS resolver")]
pub struct Args {
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(short('p'), long, value_name = "PORT", default_value_t = 2053)]
    pub port: u16,
    #[arg(long, value_name = "ADDR", default_value = "8.8.8.8")]
    pub upstream_resolver: IpAddr,
    #[arg(long, value_name = "PORT", default_value_t = 53)]
    pub upstream_port: u16,
    /// Seconds to wait for the upstream resolver
    #[arg(long, value_name = "SECONDS", default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
    pub upstream_timeout: u64,
    #[arg(long, value_name = "WORKERS", default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub workers: u8,
    /// Seconds between cache stats reports
    #[arg(long, value_name = "SECONDS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub stats_interval: u64,
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            upstream_resolver: SocketAddr::new(self.upstream_resolver, self.upstream_port),
            upstream_timeout: Duration::from_secs(self.upstream_timeout),
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval)
    }
}
