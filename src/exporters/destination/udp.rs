// SPDX-License-Identifier: Apache-2.0

use crate::exporters::destination::{Destination, DestinationFuture};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{UdpSocket, lookup_host};

/// Connected datagram socket, one record per datagram.
///
/// Connecting a UDP socket only fixes the peer address locally, so dialing
/// fails on resolution or socket errors but never on an unreachable peer.
pub struct UdpDestination {
    socket: UdpSocket,
}

impl UdpDestination {
    pub async fn dial(address: &str) -> io::Result<Self> {
        let peer = lookup_host(address).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", address),
            )
        })?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;

        Ok(Self { socket })
    }
}

impl Destination for UdpDestination {
    fn kind(&self) -> &'static str {
        "udp"
    }

    fn write_record<'a>(&'a mut self, record: &'a [u8]) -> DestinationFuture<'a, ()> {
        Box::pin(async move {
            let sent = self.socket.send(record).await?;
            if sent != record.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short datagram write: {} of {} bytes", sent, record.len()),
                ));
            }
            Ok(())
        })
    }

    fn close(self: Box<Self>) -> DestinationFuture<'static, ()> {
        drop(self);
        Box::pin(async { Ok(()) })
    }
}
