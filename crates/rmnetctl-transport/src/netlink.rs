use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Netlink protocol number the rmnet data driver registers.
pub const RMNET_NETLINK_PROTO: i32 = 31;

/// Netlink port id of the kernel.
const KERNEL_PORT_ID: u32 = 0;

/// Raw AF_NETLINK socket speaking to a kernel-side netlink listener.
///
/// The descriptor is owned and closed when the socket is dropped. Datagrams
/// are always unicast to the kernel (port id 0, no multicast groups).
pub struct NetlinkSocket {
    fd: OwnedFd,
    protocol: i32,
    port_id: Option<u32>,
}

impl NetlinkSocket {
    /// Create an unbound netlink socket for `protocol`.
    pub fn open(protocol: i32) -> Result<Self> {
        // SAFETY: socket(2) takes no pointers; the result is checked below.
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                protocol,
            )
        };
        if raw < 0 {
            return Err(TransportError::Socket {
                protocol,
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: `raw` is a freshly created descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        debug!(protocol, fd = raw, "opened netlink socket");

        Ok(Self {
            fd,
            protocol,
            port_id: None,
        })
    }

    /// Bind the socket to a local port id.
    ///
    /// Port id 0 lets the kernel pick a free id.
    pub fn bind(&mut self, port_id: u32) -> Result<()> {
        let addr = netlink_addr(port_id);

        // SAFETY: `addr` is a fully initialised sockaddr_nl and the length
        // passed matches its size; the descriptor is open for `self`'s lifetime.
        let rc = unsafe {
            libc::bind(
                self.fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_nl).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Bind {
                port_id,
                source: io::Error::last_os_error(),
            });
        }

        self.port_id = Some(port_id);
        debug!(protocol = self.protocol, port_id, "bound netlink socket");
        Ok(())
    }

    /// Netlink protocol this socket was opened for.
    pub fn protocol(&self) -> i32 {
        self.protocol
    }

    /// Local port id, once bound.
    pub fn port_id(&self) -> Option<u32> {
        self.port_id
    }

    fn set_timeout(&self, option: libc::c_int, timeout: Option<Duration>) -> Result<()> {
        let tv = match timeout {
            Some(d) if d.is_zero() => {
                return Err(TransportError::Option(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "cannot set a zero duration timeout",
                )));
            }
            Some(d) => libc::timeval {
                tv_sec: d.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
                tv_usec: d.subsec_micros() as libc::suseconds_t,
            },
            None => libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
        };

        // SAFETY: `tv` is a valid timeval and the length matches its size.
        let rc = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                libc::SOL_SOCKET,
                option,
                (&tv as *const libc::timeval).cast::<libc::c_void>(),
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Option(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Transport for NetlinkSocket {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        let dest = netlink_addr(KERNEL_PORT_ID);
        loop {
            // SAFETY: `datagram` is valid for reads of its length and `dest`
            // is a fully initialised sockaddr_nl of the declared size.
            let sent = unsafe {
                libc::sendto(
                    self.fd.as_raw_fd(),
                    datagram.as_ptr().cast::<libc::c_void>(),
                    datagram.len(),
                    0,
                    (&dest as *const libc::sockaddr_nl).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
                )
            };
            if sent < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(TransportError::Send(err));
            }

            let sent = sent as usize;
            if sent != datagram.len() {
                return Err(TransportError::ShortSend {
                    sent,
                    len: datagram.len(),
                });
            }
            debug!(len = sent, "sent netlink datagram");
            return Ok(());
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            // SAFETY: `buf` is valid for writes of its length.
            let read = unsafe {
                libc::recv(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    0,
                )
            };
            if read < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(TransportError::Receive(err));
            }
            debug!(len = read, "received netlink datagram");
            return Ok(read as usize);
        }
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_timeout(libc::SO_RCVTIMEO, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_timeout(libc::SO_SNDTIMEO, timeout)
    }

    fn transport_name(&self) -> &'static str {
        "netlink"
    }
}

impl AsFd for NetlinkSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("fd", &self.fd.as_raw_fd())
            .field("protocol", &self.protocol)
            .field("port_id", &self.port_id)
            .finish()
    }
}

fn netlink_addr(port_id: u32) -> libc::sockaddr_nl {
    // SAFETY: sockaddr_nl is plain old data; all-zero is a valid value.
    let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
    addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
    addr.nl_pid = port_id;
    addr.nl_groups = 0;
    addr
}
