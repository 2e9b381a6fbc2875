use std::time::Duration;

use crate::error::Result;

/// A bound, connected datagram channel to the kernel driver.
///
/// Every call to [`Transport::send`] emits exactly one datagram and every
/// call to [`Transport::recv`] consumes exactly one. Implementations block
/// until the operation completes unless a timeout has been configured.
///
/// A transport is not synchronized: callers that share one between threads
/// must serialize a send and its matching receive themselves.
pub trait Transport {
    /// Send one datagram to the peer.
    fn send(&mut self, datagram: &[u8]) -> Result<()>;

    /// Receive one datagram into `buf`, returning the number of bytes read.
    ///
    /// Datagrams larger than `buf` are truncated by the socket; the returned
    /// length never exceeds `buf.len()`.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Set (or clear) the receive timeout on the underlying descriptor.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Set (or clear) the send timeout on the underlying descriptor.
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        (**self).send(datagram)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).recv(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_write_timeout(timeout)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
