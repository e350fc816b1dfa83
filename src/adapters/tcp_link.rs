//! TCP command-link adapter.
//!
//! Implements [`CommandLink`] over a non-blocking TCP server socket. One
//! client connection is active at a time; a newly accepted connection
//! replaces a dead one. ESP-IDF's std support provides `std::net` on
//! target, so the same code runs on the robot and on the host.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};

use log::{info, warn};

use crate::app::ports::CommandLink;
use crate::error::CommsError;

pub struct TcpCommandLink {
    listener: TcpListener,
    client: Option<TcpStream>,
}

impl TcpCommandLink {
    /// Bind the command server socket.
    pub fn bind(port: u16) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        info!("command server listening on :{port}");
        Ok(Self {
            listener,
            client: None,
        })
    }

    /// Accept a pending client, if any. Called from the loop's maintenance
    /// phase; never blocks.
    pub fn poll_accept(&mut self) {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("client {peer}: could not set non-blocking, dropping");
                    return;
                }
                let _ = stream.set_nodelay(true);
                if self.client.is_some() {
                    info!("client {peer} replaces previous session");
                } else {
                    info!("client {peer} connected");
                }
                self.client = Some(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    fn drop_client(&mut self, why: &str) {
        if self.client.take().is_some() {
            info!("client disconnected ({why})");
        }
    }
}

impl CommandLink for TcpCommandLink {
    fn client_connected(&self) -> bool {
        self.client.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CommsError> {
        let Some(stream) = self.client.as_mut() else {
            return Ok(0);
        };
        match stream.read(buf) {
            Ok(0) => {
                // Orderly shutdown from the peer.
                self.drop_client("eof");
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                warn!("client read failed: {e}");
                self.drop_client("read error");
                Err(CommsError::IoFailed)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), CommsError> {
        let Some(stream) = self.client.as_mut() else {
            return Err(CommsError::IoFailed);
        };
        match stream.write_all(data) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("client write failed: {e}");
                self.drop_client("write error");
                Err(CommsError::IoFailed)
            }
        }
    }
}
