//! Winsock socket option plumbing.

use std::io;
use std::os::windows::io::RawSocket;

use windows_sys::Win32::Networking::WinSock::{
    setsockopt, SOCKET, SOL_SOCKET, SO_KEEPALIVE, SO_RCVBUF, SO_SNDBUF,
};

use crate::BufferDirection;

fn set_int_option(socket: RawSocket, option: i32, value: i32) -> io::Result<()> {
    let bytes = value.to_ne_bytes();
    // SAFETY: bytes outlives the call and the length matches.
    let result = unsafe {
        setsockopt(
            socket as SOCKET,
            SOL_SOCKET as i32,
            option,
            bytes.as_ptr(),
            bytes.len() as i32,
        )
    };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn set_keep_alive(socket: RawSocket, enable: bool) -> io::Result<()> {
    set_int_option(socket, SO_KEEPALIVE as i32, i32::from(enable))
}

pub fn set_buffer_size(
    socket: RawSocket,
    direction: BufferDirection,
    bytes: usize,
) -> io::Result<()> {
    let option = match direction {
        BufferDirection::Receive => SO_RCVBUF,
        BufferDirection::Send => SO_SNDBUF,
    };
    let value = i32::try_from(bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "buffer size too large"))?;
    set_int_option(socket, option as i32, value)
}
