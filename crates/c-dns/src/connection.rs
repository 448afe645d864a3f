use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpStream, UdpSocket};

use crate::UDP_RECV_BUF_SIZE;

/// Hides the transport from whoever exchanges DNS messages over it.
///
/// A UDP connection without a peer address talks over a connected socket.
pub enum Connection {
    Tcp(TcpStream),
    Udp((Arc<UdpSocket>, Option<SocketAddr>)),
}

impl Connection {
    pub async fn send_encoded_packet(&mut self, src: &[u8]) -> anyhow::Result<()> {
        match self {
            Connection::Tcp(socket) => {
                let length = u16::try_from(src.len())
                    .context("TCP: DNS packet doesn't fit behind a length prefix")?
                    .to_be_bytes();
                socket
                    .write_all(&length)
                    .await
                    .context("TCP: error while sending packet's length")?;
                socket
                    .write_all(src)
                    .await
                    .context("TCP: error while sending a DNS packet")?;
            }
            Connection::Udp((socket, addr)) => {
                if let Some(addr) = addr {
                    socket
                        .send_to(src, *addr)
                        .await
                        .with_context(|| format!("UDP: error while sending a DNS packet to {}", addr))?;
                } else {
                    socket
                        .send(src)
                        .await
                        .context("UDP: error while sending a DNS packet")?;
                }
            }
        };

        Ok(())
    }

    /// Reads one DNS message into `dst`, leaving it sized to the message
    pub async fn read(&mut self, dst: &mut Vec<u8>) -> anyhow::Result<usize> {
        let packet_length = match self {
            Connection::Tcp(socket) => {
                let length = socket
                    .read_u16()
                    .await
                    .context("TCP: error while reading packet's length")? as usize;
                dst.resize(length, 0);
                socket
                    .read_exact(dst)
                    .await
                    .context("TCP: error while reading a packet")?;
                length
            }
            Connection::Udp((socket, _)) => {
                dst.resize(UDP_RECV_BUF_SIZE, 0);
                let length = socket.recv(dst).await.context("UDP: error while reading a packet")?;
                dst.truncate(length);
                length
            }
        };

        Ok(packet_length)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            Connection::Tcp(socket) => socket.peer_addr().ok(),
            Connection::Udp((socket, addr)) => addr.or_else(|| socket.peer_addr().ok()),
        }
    }

    pub fn is_tcp(&self) -> bool {
        matches!(self, Connection::Tcp(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_messages_are_length_prefixed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("shouldn't have failed");
        let addr = listener.local_addr().expect("shouldn't have failed");

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.expect("shouldn't have failed");
            stream.write_all(&[0x0, 0x3, 0xa, 0xb, 0xc]).await.expect("shouldn't have failed");
            let length = stream.read_u16().await.expect("shouldn't have failed");
            let mut reply = vec![0; length as usize];
            stream.read_exact(&mut reply).await.expect("shouldn't have failed");
            reply
        });

        let (stream, _) = listener.accept().await.expect("shouldn't have failed");
        let mut connection = Connection::Tcp(stream);
        assert!(connection.is_tcp());

        let mut buf = Vec::new();
        assert_eq!(connection.read(&mut buf).await.expect("shouldn't have failed"), 3);
        assert_eq!(buf, vec![0xa, 0xb, 0xc]);

        connection.send_encoded_packet(&[0x1, 0x2]).await.expect("shouldn't have failed");
        assert_eq!(client.await.expect("shouldn't have failed"), vec![0x1, 0x2]);
    }

    #[tokio::test]
    async fn udp_connection_uses_explicit_peer() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("shouldn't have failed"));
        let client = UdpSocket::bind("127.0.0.1:0").await.expect("shouldn't have failed");
        let client_addr = client.local_addr().expect("shouldn't have failed");

        let mut connection = Connection::Udp((server, Some(client_addr)));
        assert!(!connection.is_tcp());
        assert_eq!(connection.peer_addr(), Some(client_addr));

        connection.send_encoded_packet(&[0x1, 0x2, 0x3]).await.expect("shouldn't have failed");
        let mut buf = [0; 16];
        let length = client.recv(&mut buf).await.expect("shouldn't have failed");
        assert_eq!(&buf[..length], &[0x1, 0x2, 0x3]);
    }
}
