//! Unix socket option plumbing.
//!
//! `SO_KEEPALIVE` and the buffer-size options have no portable std
//! surface, so they go through `setsockopt(2)` directly.

use std::io;
use std::os::fd::RawFd;

use libc::{c_int, c_void, socklen_t, SOL_SOCKET, SO_KEEPALIVE, SO_RCVBUF, SO_SNDBUF};

use crate::BufferDirection;

fn set_int_option(fd: RawFd, option: c_int, value: c_int) -> io::Result<()> {
    // SAFETY: value outlives the call and the length matches its type.
    let result = unsafe {
        libc::setsockopt(
            fd,
            SOL_SOCKET,
            option,
            &value as *const c_int as *const c_void,
            std::mem::size_of::<c_int>() as socklen_t,
        )
    };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn set_keep_alive(fd: RawFd, enable: bool) -> io::Result<()> {
    set_int_option(fd, SO_KEEPALIVE, c_int::from(enable))
}

pub fn set_buffer_size(fd: RawFd, direction: BufferDirection, bytes: usize) -> io::Result<()> {
    let option = match direction {
        BufferDirection::Receive => SO_RCVBUF,
        BufferDirection::Send => SO_SNDBUF,
    };
    let value = c_int::try_from(bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "buffer size too large"))?;
    set_int_option(fd, option, value)
}
