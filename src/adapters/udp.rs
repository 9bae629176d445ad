//! [`Datagram`] over `std::net::UdpSocket`.
//!
//! ESP-IDF ships a std networking layer on top of lwIP, so the same
//! socket code runs on the device and on the host.

use std::io;
use std::net::{IpAddr, UdpSocket};

use log::info;

use super::wifi::Datagram;

#[derive(Debug, Default)]
pub struct StdUdp {
    socket: Option<UdpSocket>,
}

impl StdUdp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locally bound port, if bound.
    pub fn local_port(&self) -> Option<u16> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
    }
}

impl Datagram for StdUdp {
    type Error = io::Error;

    fn bind(&mut self, port: u16) -> io::Result<()> {
        self.socket = None;
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_nonblocking(true)?;
        info!("UDP: bound {}", socket.local_addr()?);
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        self.socket = None;
    }

    fn send_to(&mut self, data: &[u8], host: &str, port: u16) -> io::Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        let ip: IpAddr = host
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "host is not an IP address"))?;
        socket.send_to(data, (ip, port))?;
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(socket) = &self.socket else {
            return Ok(0);
        };
        match socket.recv_from(buf) {
            Ok((n, _)) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }
}
