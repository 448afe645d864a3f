use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use c_dns_lib::{DnsPacket, QueryType, MAX_STANDARD_DNS_MSG_SIZE};
use tokio::net::UdpSocket;

use crate::connection::Connection;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3);

/// Anything that can answer a single question on behalf of the coordinator
pub trait Lookup {
    fn lookup(
        &self,
        qname: &str,
        query_type: QueryType,
    ) -> impl Future<Output = anyhow::Result<DnsPacket<'static>>> + Send;
}

/// Forwards questions to a recursive resolver over UDP
#[derive(Debug, Clone)]
pub struct UpstreamResolver {
    addr: SocketAddr,
    timeout: Duration,
}

impl UpstreamResolver {
    pub fn new(addr: SocketAddr) -> Self {
        UpstreamResolver {
            addr,
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Lookup for UpstreamResolver {
    async fn lookup(&self, qname: &str, query_type: QueryType) -> anyhow::Result<DnsPacket<'static>> {
        let id = fastrand::u16(..);
        let encoded = DnsPacket::new_query(id, qname, query_type)
            .to_bytes(MAX_STANDARD_DNS_MSG_SIZE)
            .context("error while encoding the DNS packet")?;

        let bind_addr: SocketAddr = if self.addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .context("UDP: unable to bind a socket")?;
        socket
            .connect(self.addr)
            .await
            .context("UDP: error while connecting to the upstream resolver")?;
        let mut connection = Connection::Udp((Arc::new(socket), None));

        let mut buf = Vec::new();
        tokio::time::timeout(self.timeout, async {
            connection
                .send_encoded_packet(&encoded)
                .await
                .context("error while forwarding the question")?;
            connection
                .read(&mut buf)
                .await
                .context("error while reading the response")
        })
        .await
        .with_context(|| format!("no response from {} within {:?}", self.addr, self.timeout))??;

        let response = DnsPacket::from_bytes(&buf).context("error while decoding the response")?;
        if response.header.id != id {
            anyhow::bail!(
                "response ID {:#06x} doesn't match the query ID {:#06x}",
                response.header.id,
                id
            );
        }

        Ok(response)
    }
}
