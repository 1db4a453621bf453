//! End-to-end socket adapter tests against loopback listeners.

use std::io::{Read, Write};
use std::net::{TcpListener, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use miniapi_core::{ops, Config, FallbackPolicy, MiniapiError, PlatformContext};
use miniapi_net::{NetOps, SocketOption, Transport};

fn default_net() -> NetOps {
    NetOps::new(Arc::new(PlatformContext::with_defaults()))
}

#[test]
fn tcp_echo_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).unwrap();
        stream.write_all(&buf[..n]).unwrap();
    });

    let net = default_net();
    let mut handle = net
        .connect(&addr.to_string(), Transport::Tcp, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(handle.transport(), Transport::Tcp);

    assert_eq!(net.send(&mut handle, b"ping").unwrap(), 4);
    let mut buf = [0u8; 64];
    let n = net.receive(&mut handle, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping");

    net.close(handle).unwrap();
    server.join().unwrap();
}

#[test]
fn udp_connected_round_trip() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap();
    let echo = std::thread::spawn(move || {
        let mut buf = [0u8; 64];
        let (n, from) = server.recv_from(&mut buf).unwrap();
        server.send_to(&buf[..n], from).unwrap();
    });

    let net = default_net();
    let mut handle = net
        .connect(&addr.to_string(), Transport::Udp, None)
        .unwrap();
    net.set_option(&handle, &SocketOption::ReadTimeout(Some(Duration::from_secs(5))))
        .unwrap();

    net.send(&mut handle, b"datagram").unwrap();
    let mut buf = [0u8; 64];
    let n = net.receive(&mut handle, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"datagram");

    net.close(handle).unwrap();
    echo.join().unwrap();
}

#[test]
fn read_deadline_surfaces_as_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Keep the accepted connection open but silent.
    let server = std::thread::spawn(move || listener.accept().unwrap());

    let net = default_net();
    let mut handle = net
        .connect(&addr.to_string(), Transport::Tcp, None)
        .unwrap();
    net.set_option(
        &handle,
        &SocketOption::ReadTimeout(Some(Duration::from_millis(50))),
    )
    .unwrap();

    let mut buf = [0u8; 16];
    let err = net.receive(&mut handle, &mut buf).unwrap_err();
    assert!(matches!(err, MiniapiError::Timeout));

    net.close(handle).unwrap();
    server.join().unwrap();
}

#[test]
fn portable_options_apply() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = std::thread::spawn(move || listener.accept().unwrap());

    let net = default_net();
    let handle = net
        .connect(&addr.to_string(), Transport::Tcp, None)
        .unwrap();
    net.set_option(&handle, &SocketOption::KeepAlive(true)).unwrap();
    net.set_option(&handle, &SocketOption::ReceiveBufferSize(64 * 1024))
        .unwrap();
    net.set_option(&handle, &SocketOption::SendBufferSize(64 * 1024))
        .unwrap();
    net.set_option(&handle, &SocketOption::WriteTimeout(Some(Duration::from_secs(1))))
        .unwrap();
    net.close(handle).unwrap();
    server.join().unwrap();
}

#[test]
fn connect_refused_is_not_found() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let net = default_net();
    let err = net
        .connect(&addr.to_string(), Transport::Tcp, Some(Duration::from_secs(2)))
        .unwrap_err();
    assert!(matches!(
        err,
        MiniapiError::Platform { .. } | MiniapiError::Timeout
    ));
}

#[test]
fn keep_alive_on_udp_is_unsupported() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap();

    let net = default_net();
    let handle = net
        .connect(&addr.to_string(), Transport::Udp, None)
        .unwrap();
    let err = net
        .set_option(&handle, &SocketOption::KeepAlive(true))
        .unwrap_err();
    assert!(matches!(err, MiniapiError::Unsupported { .. }));
    // The handle stays usable after the rejected option.
    net.set_option(&handle, &SocketOption::SendBufferSize(32 * 1024))
        .unwrap();
    net.close(handle).unwrap();
}

#[test]
fn invalid_peer_is_rejected() {
    let net = default_net();
    let err = net
        .connect("not a host name", Transport::Tcp, None)
        .unwrap_err();
    assert!(matches!(
        err,
        MiniapiError::InvalidArgument { .. } | MiniapiError::Platform { .. }
    ));
}

#[test]
fn noop_override_cannot_fabricate_a_connection() {
    let mut config = Config::default();
    config
        .fallback_overrides
        .insert(ops::NET_CONNECT.to_string(), FallbackPolicy::NoOp);
    let net = NetOps::new(Arc::new(PlatformContext::new(&config)));

    let err = net
        .connect("127.0.0.1:9", Transport::Tcp, None)
        .unwrap_err();
    assert!(matches!(err, MiniapiError::Unsupported { .. }));
}
