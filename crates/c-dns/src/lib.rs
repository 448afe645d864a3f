mod logging;
pub use logging::setup_logging;
mod cache;
pub use cache::{AnswerCache, CacheStats};
mod connection;
pub use connection::Connection;
mod coordinator;
pub use coordinator::QueryCoordinator;
mod upstream;
pub use upstream::{Lookup, UpstreamResolver, DEFAULT_UPSTREAM_TIMEOUT};
mod server;
pub use server::{DnsServer, ServerConfig};
mod cli;
pub use cli::Args;

/// Largest datagram accepted from clients and upstreams
pub const UDP_RECV_BUF_SIZE: usize = 4096;
