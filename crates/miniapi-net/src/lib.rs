//! miniapi-net: Cross-platform socket operations adapter
//!
//! A uniform client-socket surface for TCP and connected UDP:
//!
//! - **Connect**: name resolution plus optional connect deadline
//! - **Send/receive**: blocking, with read/write deadlines configurable
//!   per handle; an elapsed deadline surfaces as `MiniapiError::Timeout`
//! - **Options**: the portable [`SocketOption`] subset; anything outside
//!   it is requested via [`SocketOption::Platform`] and rejected as
//!   `Unsupported` when the backend does not recognize the name
//!
//! Handles wrap exactly one native socket, are bound to the backend they
//! were created on, and release the socket once (explicit [`NetOps::close`]
//! or drop).

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use miniapi_core::{ops, Execution, Family, MiniapiError, MiniapiResult, PlatformContext};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

#[cfg(unix)]
use std::os::fd::{AsRawFd, RawFd as RawSock};
#[cfg(windows)]
use std::os::windows::io::{AsRawSocket, RawSocket as RawSock};

// ============================================================================
// Core Types
// ============================================================================

/// Transport protocol for [`NetOps::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    /// Connected UDP: datagrams flow only to/from the connect peer.
    Udp,
}

/// Which buffer a size option targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferDirection {
    Receive,
    Send,
}

/// Portable socket options.
///
/// The named variants are representable on every backend. `Platform`
/// carries an option outside the portable set; a backend that does not
/// recognize the name rejects it as `Unsupported` rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketOption {
    /// Deadline for blocking receives. `None` blocks forever.
    ReadTimeout(Option<Duration>),
    /// Deadline for blocking sends. `None` blocks forever.
    WriteTimeout(Option<Duration>),
    /// TCP keep-alive probes (no effect on UDP).
    KeepAlive(bool),
    /// Kernel receive buffer size in bytes.
    ReceiveBufferSize(usize),
    /// Kernel send buffer size in bytes.
    SendBufferSize(usize),
    /// Platform-exclusive option by name.
    Platform { name: String, value: i64 },
}

#[derive(Debug)]
enum Socket {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Exclusively-owned connected socket.
///
/// Bound to the backend family it was connected on; never migrated.
#[derive(Debug)]
pub struct SocketHandle {
    socket: Socket,
    peer: String,
    family: Family,
}

impl SocketHandle {
    /// The peer this handle was connected to, as given to `connect`.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// The backend family this handle is bound to.
    pub fn family(&self) -> Family {
        self.family
    }

    pub fn transport(&self) -> Transport {
        match self.socket {
            Socket::Tcp(_) => Transport::Tcp,
            Socket::Udp(_) => Transport::Udp,
        }
    }

    fn raw(&self) -> RawSock {
        #[cfg(unix)]
        match &self.socket {
            Socket::Tcp(s) => s.as_raw_fd(),
            Socket::Udp(s) => s.as_raw_fd(),
        }
        #[cfg(windows)]
        match &self.socket {
            Socket::Tcp(s) => s.as_raw_socket(),
            Socket::Udp(s) => s.as_raw_socket(),
        }
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// The socket operations adapter.
pub struct NetOps {
    ctx: Arc<PlatformContext>,
}

impl NetOps {
    pub fn new(ctx: Arc<PlatformContext>) -> Self {
        NetOps { ctx }
    }

    /// No socket operation has an emulation, and a no-op cannot stand in
    /// for wire traffic; anything but a native resolution refuses.
    fn dispatch_query(&self, operation: &str) -> MiniapiResult<()> {
        match self.ctx.dispatch(operation)? {
            Execution::Native => Ok(()),
            Execution::Emulated | Execution::Skipped => Err(MiniapiError::unsupported(
                operation,
                self.ctx.profile().family.as_str(),
            )),
        }
    }

    /// Connect to `peer` (`host:port`).
    ///
    /// With a timeout, TCP uses a bounded connect against each resolved
    /// address in turn. Connected UDP never blocks on connect, so the
    /// timeout only bounds name resolution there.
    pub fn connect(
        &self,
        peer: &str,
        transport: Transport,
        timeout: Option<Duration>,
    ) -> MiniapiResult<SocketHandle> {
        self.dispatch_query(ops::NET_CONNECT)?;
        debug!(peer, ?transport, "connecting");

        let addrs: Vec<_> = peer
            .to_socket_addrs()
            .map_err(|e| map_net_error(e, ops::NET_CONNECT, peer))?
            .collect();
        if addrs.is_empty() {
            return Err(MiniapiError::invalid_argument(format!(
                "{peer} resolved to no addresses"
            )));
        }

        let socket = match transport {
            Transport::Tcp => {
                let mut last_err = None;
                let mut stream = None;
                for addr in &addrs {
                    let attempt = match timeout {
                        Some(limit) => TcpStream::connect_timeout(addr, limit),
                        None => TcpStream::connect(addr),
                    };
                    match attempt {
                        Ok(s) => {
                            stream = Some(s);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match (stream, last_err) {
                    (Some(s), _) => Socket::Tcp(s),
                    (None, Some(e)) => return Err(map_net_error(e, ops::NET_CONNECT, peer)),
                    // Unreachable: addrs is non-empty, so one arm fired.
                    (None, None) => {
                        return Err(MiniapiError::invalid_argument(format!(
                            "{peer} resolved to no addresses"
                        )))
                    }
                }
            }
            Transport::Udp => {
                let bind_addr = if addrs[0].is_ipv4() {
                    "0.0.0.0:0"
                } else {
                    "[::]:0"
                };
                let socket = UdpSocket::bind(bind_addr)
                    .map_err(|e| map_net_error(e, ops::NET_CONNECT, peer))?;
                socket
                    .connect(addrs[0])
                    .map_err(|e| map_net_error(e, ops::NET_CONNECT, peer))?;
                Socket::Udp(socket)
            }
        };

        Ok(SocketHandle {
            socket,
            peer: peer.to_string(),
            family: self.ctx.profile().family,
        })
    }

    /// Send `buf`, returning the number of bytes handed to the transport.
    pub fn send(&self, handle: &mut SocketHandle, buf: &[u8]) -> MiniapiResult<usize> {
        self.dispatch_query(ops::NET_SEND)?;
        let peer = handle.peer.clone();
        match &mut handle.socket {
            Socket::Tcp(stream) => stream.write(buf),
            Socket::Udp(socket) => socket.send(buf),
        }
        .map_err(|e| map_net_error(e, ops::NET_SEND, &peer))
    }

    /// Receive into `buf`, returning the number of bytes read.
    ///
    /// Zero means the peer closed an orderly TCP connection. An elapsed
    /// read deadline surfaces as `Timeout`.
    pub fn receive(&self, handle: &mut SocketHandle, buf: &mut [u8]) -> MiniapiResult<usize> {
        self.dispatch_query(ops::NET_RECEIVE)?;
        let peer = handle.peer.clone();
        match &mut handle.socket {
            Socket::Tcp(stream) => stream.read(buf),
            Socket::Udp(socket) => socket.recv(buf),
        }
        .map_err(|e| map_net_error(e, ops::NET_RECEIVE, &peer))
    }

    /// Apply one socket option to a handle.
    pub fn set_option(&self, handle: &SocketHandle, option: &SocketOption) -> MiniapiResult<()> {
        match option {
            SocketOption::ReadTimeout(limit) => {
                self.dispatch_query(ops::NET_SET_OPTION_TIMEOUT)?;
                match &handle.socket {
                    Socket::Tcp(s) => s.set_read_timeout(*limit),
                    Socket::Udp(s) => s.set_read_timeout(*limit),
                }
                .map_err(|e| map_net_error(e, ops::NET_SET_OPTION_TIMEOUT, &handle.peer))
            }
            SocketOption::WriteTimeout(limit) => {
                self.dispatch_query(ops::NET_SET_OPTION_TIMEOUT)?;
                match &handle.socket {
                    Socket::Tcp(s) => s.set_write_timeout(*limit),
                    Socket::Udp(s) => s.set_write_timeout(*limit),
                }
                .map_err(|e| map_net_error(e, ops::NET_SET_OPTION_TIMEOUT, &handle.peer))
            }
            SocketOption::KeepAlive(enable) => {
                self.dispatch_query(ops::NET_SET_OPTION_KEEP_ALIVE)?;
                // Keep-alive has no meaning for datagrams; rejecting keeps
                // the option from being silently ignored.
                if matches!(handle.socket, Socket::Udp(_)) {
                    return Err(MiniapiError::unsupported(
                        ops::NET_SET_OPTION_KEEP_ALIVE,
                        self.ctx.profile().family.as_str(),
                    ));
                }
                platform::set_keep_alive(handle.raw(), *enable)
                    .map_err(|e| map_net_error(e, ops::NET_SET_OPTION_KEEP_ALIVE, &handle.peer))
            }
            SocketOption::ReceiveBufferSize(bytes) => {
                self.dispatch_query(ops::NET_SET_OPTION_BUFFER_SIZE)?;
                platform::set_buffer_size(handle.raw(), BufferDirection::Receive, *bytes)
                    .map_err(|e| map_net_error(e, ops::NET_SET_OPTION_BUFFER_SIZE, &handle.peer))
            }
            SocketOption::SendBufferSize(bytes) => {
                self.dispatch_query(ops::NET_SET_OPTION_BUFFER_SIZE)?;
                platform::set_buffer_size(handle.raw(), BufferDirection::Send, *bytes)
                    .map_err(|e| map_net_error(e, ops::NET_SET_OPTION_BUFFER_SIZE, &handle.peer))
            }
            // No backend recognizes names outside the portable set.
            SocketOption::Platform { name, .. } => Err(MiniapiError::unsupported(
                format!("net.set_option({name})"),
                self.ctx.profile().family.as_str(),
            )),
        }
    }

    /// Shut down and release the socket.
    pub fn close(&self, handle: SocketHandle) -> MiniapiResult<()> {
        let peer = handle.peer.clone();
        if let Socket::Tcp(stream) = &handle.socket {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                // Already closed by the peer: releasing is still success.
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
                Err(e) => return Err(map_net_error(e, "net.close", &peer)),
            }
        }
        Ok(())
    }
}

/// Normalize a native socket error; deadline expiry maps to `Timeout`.
/// Refusals keep their native errno in the `Platform` variant.
fn map_net_error(err: std::io::Error, operation: &str, peer: &str) -> MiniapiError {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => MiniapiError::Timeout,
        _ => MiniapiError::from_io(err, operation, peer),
    }
}
