use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Connected Unix datagram sockets carry the same one-datagram-per-message
/// contract as netlink, so a user-space stand-in for the driver can sit on
/// the other end (see `UnixDatagram::pair`).
impl Transport for UnixDatagram {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        loop {
            match UnixDatagram::send(self, datagram) {
                Ok(sent) if sent == datagram.len() => {
                    debug!(len = sent, "sent unix datagram");
                    return Ok(());
                }
                Ok(sent) => {
                    return Err(TransportError::ShortSend {
                        sent,
                        len: datagram.len(),
                    })
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Send(err)),
            }
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match UnixDatagram::recv(self, buf) {
                Ok(read) => {
                    debug!(len = read, "received unix datagram");
                    return Ok(read);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Receive(err)),
            }
        }
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        UnixDatagram::set_read_timeout(self, timeout).map_err(TransportError::Option)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        UnixDatagram::set_write_timeout(self, timeout).map_err(TransportError::Option)
    }

    fn transport_name(&self) -> &'static str {
        "unix-datagram"
    }
}
