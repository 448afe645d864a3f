use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use c_dns_lib::{DnsPacket, WireError, MAX_STANDARD_DNS_MSG_SIZE, MAX_TCP_DNS_MSG_SIZE};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::{AnswerCache, Connection, QueryCoordinator, UpstreamResolver, UDP_RECV_BUF_SIZE};

type HandlerResult = anyhow::Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub upstream_resolver: SocketAddr,
    pub upstream_timeout: Duration,
}

pub struct DnsServer {
    udp_socket: Arc<UdpSocket>,
    tcp_listener: Arc<TcpListener>,
    coordinator: Arc<QueryCoordinator<UpstreamResolver>>,
    workers: JoinSet<HandlerResult>,
}

impl DnsServer {
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let udp_socket = Arc::new(
            UdpSocket::bind(config.bind_addr)
                .await
                .context("error while creating a UDP socket")?,
        );
        // Same port for both transports, even if it was picked by the OS
        let bind_addr = udp_socket
            .local_addr()
            .context("error while getting the UDP socket's address")?;
        let tcp_listener = Arc::new(
            TcpListener::bind(bind_addr)
                .await
                .context("error while creating a TcpListener")?,
        );

        let upstream = UpstreamResolver::new(config.upstream_resolver).with_timeout(config.upstream_timeout);
        let coordinator = Arc::new(QueryCoordinator::new(Arc::new(AnswerCache::new()), upstream));

        Ok(DnsServer {
            udp_socket,
            tcp_listener,
            coordinator,
            workers: JoinSet::new(),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.udp_socket
            .local_addr()
            .context("error while getting the server's address")
    }

    pub fn cache(&self) -> Arc<AnswerCache> {
        self.coordinator.cache().clone()
    }

    pub fn add_workers(&mut self, n: u8) {
        for idx in 0..n {
            let udp_socket = self.udp_socket.clone();
            let tcp_listener = self.tcp_listener.clone();
            let coordinator = self.coordinator.clone();

            self.workers.spawn(
                handle_incoming_requests(udp_socket, tcp_listener, coordinator)
                    .instrument(tracing::trace_span!("", worker = idx)),
            );
        }
    }

    /// Periodically logs the cache's occupancy, pruning expired entries on the way.
    /// `interval` must be non-zero.
    pub fn spawn_stats_reporter(&mut self, interval: Duration) {
        self.workers
            .spawn(report_cache_stats(self.cache(), interval).instrument(tracing::trace_span!("stats")));
    }

    pub async fn block_until_completion(&mut self) -> anyhow::Result<()> {
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result.context("worker task failed to execute")? {
                tracing::error!("Worker stopped: {:#}", e);
            }
        }

        // No workers left
        Ok(())
    }
}

async fn report_cache_stats(cache: Arc<AnswerCache>, interval: Duration) -> HandlerResult {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let stats = cache.stats();
        tracing::info!(
            total = stats.total,
            active = stats.active,
            expired = stats.total - stats.active,
            "Cache stats"
        );
    }
}

async fn handle_incoming_requests(
    udp_socket: Arc<UdpSocket>,
    tcp_listener: Arc<TcpListener>,
    coordinator: Arc<QueryCoordinator<UpstreamResolver>>,
) -> HandlerResult {
    let mut recv = vec![0; UDP_RECV_BUF_SIZE];
    let mut handlers: JoinSet<HandlerResult> = JoinSet::new();
    loop {
        let (connection, request) = tokio::select! {
            result = udp_socket.recv_from(&mut recv) => {
                let (length, from) = match result {
                    Ok(received) => received,
                    Err(e) => {
                        tracing::debug!("UDP: error while receiving a request: {}", e);
                        continue;
                    }
                };
                tracing::trace!(client = %from, "new UDP request");

                (Connection::Udp((udp_socket.clone(), Some(from))), Some(recv[..length].to_vec()))
            }
            result = tcp_listener.accept() => {
                let (stream, from) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::debug!("TCP: error while accepting a connection: {}", e);
                        continue;
                    }
                };
                tracing::trace!(client = %from, "new TCP connection");

                (Connection::Tcp(stream), None)
            }
            Some(result) = handlers.join_next() => {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!("Error while handling a query: {:#}", e),
                    Err(e) => tracing::error!("Query handling task failed to execute: {}", e),
                }
                continue;
            }
        };

        handlers.spawn(handle_connection(connection, request, coordinator.clone()).in_current_span());
    }
}

/// Answers a single request. `request` is only missing for TCP, where it still has to be read.
async fn handle_connection(
    mut connection: Connection,
    request: Option<Vec<u8>>,
    coordinator: Arc<QueryCoordinator<UpstreamResolver>>,
) -> HandlerResult {
    let request = match request {
        Some(request) => request,
        None => {
            let mut buf = Vec::new();
            connection.read(&mut buf).await?;
            buf
        }
    };

    let request = match DnsPacket::from_bytes(&request) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::debug!("Dropping a malformed request: {}", e);
            return Ok(());
        }
    };

    let response = coordinator.resolve(&request, connection.peer_addr()).await;
    let encoded = encode_response(&response, connection.is_tcp())?;
    connection
        .send_encoded_packet(&encoded)
        .await
        .context("error while sending a DNS response")
}

/// UDP responses that don't fit into a datagram are replaced with their truncated form
fn encode_response(response: &DnsPacket<'_>, is_tcp: bool) -> anyhow::Result<Vec<u8>> {
    if is_tcp {
        return response
            .to_bytes(MAX_TCP_DNS_MSG_SIZE)
            .context("error while encoding the response");
    }

    match response.to_bytes(MAX_STANDARD_DNS_MSG_SIZE) {
        Err(WireError::BufferOverflow { .. }) => {
            tracing::debug!("Response doesn't fit into a UDP datagram, sending it truncated");
            response
                .truncated()
                .to_bytes(MAX_STANDARD_DNS_MSG_SIZE)
                .context("error while encoding the truncated response")
        }
        result => result.context("error while encoding the response"),
    }
}
