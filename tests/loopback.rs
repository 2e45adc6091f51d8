use minecraft_protocol::{
    protocol::{
        packet::{
            client::{Handshake, KeepAlive, NextState, StatusRequest},
            server::StatusResponse,
        },
        Breakpoint, CompressionThreshold, FrameCodec, FrameError, Packet, VersionedPacket,
    },
    receive::{AssumeEstablished, ConnectionProbe, ReliableReceiver, SocketProbe, Transport},
    ReceiveConfig,
};
use std::{
    io::{self, Read, Write},
    net::{TcpListener, TcpStream},
    thread,
};

fn receiver() -> ReliableReceiver<AssumeEstablished> {
    ReliableReceiver::with_probe(AssumeEstablished, &ReceiveConfig::default())
}

fn codec(threshold: i32) -> FrameCodec {
    let mut codec = FrameCodec::new();
    codec.set_compression(CompressionThreshold::from_raw(threshold));
    codec
}

fn connect() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

#[test]
fn status_exchange() {
    let version = Breakpoint::V1_12_2.protocol();
    let (mut client, mut server) = connect();

    let server = thread::spawn(move || {
        let codec = codec(-1);
        let receiver = receiver();
        let packet = codec.read_packet(&receiver, &mut server).unwrap();
        let handshake = Handshake::from_packet(&packet, version).unwrap().unwrap();
        assert_eq!(handshake.next_state, NextState::Status);
        assert_eq!(handshake.protocol_version, version);

        let packet = codec.read_packet(&receiver, &mut server).unwrap();
        assert_eq!(
            StatusRequest::from_packet(&packet, version).unwrap(),
            Some(StatusRequest)
        );

        let response = StatusResponse {
            json: r#"{"version":{"name":"1.12.2","protocol":340}}"#.into(),
        };
        codec
            .write_packet(&mut server, &response.to_packet(version).unwrap())
            .unwrap();
    });

    let codec = codec(-1);
    let handshake = Handshake {
        protocol_version: version,
        server_address: "localhost".into(),
        server_port: 25565,
        next_state: NextState::Status,
    };
    // both frames in one write, so the server must not read past the first
    let mut frames = codec
        .encode_packet(&handshake.to_packet(version).unwrap())
        .unwrap();
    frames.extend(
        codec
            .encode_packet(&StatusRequest.to_packet(version).unwrap())
            .unwrap(),
    );
    client.write_all(&frames).unwrap();

    let packet = codec.read_packet(&receiver(), &mut client).unwrap();
    let status = StatusResponse::from_packet(&packet, version).unwrap().unwrap();
    assert!(status.json.contains("\"protocol\":340"));

    server.join().unwrap();
}

#[test]
fn compressed_exchange() {
    let version = Breakpoint::V1_13_2.protocol();
    let (mut client, mut server) = connect();

    let server = thread::spawn(move || {
        let codec = codec(64);
        let receiver = receiver();
        let large = codec.read_packet(&receiver, &mut server).unwrap();
        let small = codec.read_packet(&receiver, &mut server).unwrap();
        (large, small)
    });

    let codec = codec(64);
    let large = Packet::with_payload(0x20, vec![0x5a; 4096]);
    codec.write_packet(&mut client, &large).unwrap();
    let keep_alive = KeepAlive::new(-42).to_packet(version).unwrap();
    codec.write_packet(&mut client, &keep_alive).unwrap();

    let (received_large, received_small) = server.join().unwrap();
    assert_eq!(received_large, large);
    assert_eq!(received_small.id(), 0x0E);
    assert_eq!(
        KeepAlive::from_packet(&received_small, version).unwrap(),
        Some(KeepAlive::new(-42))
    );
}

#[test]
fn force_close_tears_down_the_connection() {
    let (mut client, mut server) = connect();
    let (local, remote) = client.endpoints().unwrap();
    assert_eq!(remote, server.local_addr().unwrap());
    assert_eq!(local, server.peer_addr().unwrap());

    client.force_close().unwrap();
    let mut buf = [0u8; 1];
    assert!(matches!(server.read(&mut buf), Ok(0) | Err(_)));
}

#[test]
fn socket_reports_open_until_the_peer_hangs_up() {
    let (client, mut server) = connect();
    assert!(client.is_open().unwrap());

    server.write_all(&[1]).unwrap();
    drop(server);
    // unread data still counts as open
    thread::sleep(std::time::Duration::from_millis(50));
    assert!(client.is_open().unwrap());

    let mut buf = [0u8; 1];
    (&client).read_exact(&mut buf).unwrap();
    assert!(!client.is_open().unwrap());
}

struct NoTable;

impl ConnectionProbe for NoTable {
    fn is_established<T: Transport + ?Sized>(&self, _: &T) -> io::Result<bool> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no connection table"))
    }
}

/// The peer announces a 10-byte frame, sends 3 bytes of it and hangs up.
fn truncated_frame<P: ConnectionProbe>(probe: P) {
    let (mut client, mut server) = connect();
    server.write_all(&[10, 0x00, 1, 2]).unwrap();
    drop(server);

    let receiver = ReliableReceiver::with_probe(probe, &ReceiveConfig::default());
    let error = codec(-1).read_packet(&receiver, &mut client).unwrap_err();
    match error {
        FrameError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected a connection reset, got {other:?}"),
    }
}

#[test]
fn peer_closing_mid_frame_is_detected_by_the_socket() {
    truncated_frame(SocketProbe);
}

#[test]
fn peer_closing_mid_frame_is_detected_without_a_connection_table() {
    truncated_frame(NoTable);
}

#[test]
fn default_receiver_detects_peer_closing_mid_frame() {
    truncated_frame(minecraft_protocol::receive::DefaultProbe::default());
}

#[cfg(target_os = "linux")]
#[test]
fn proc_net_sees_live_connection() {
    use minecraft_protocol::receive::proc_net::ProcNetProbe;

    let (client, _server) = connect();
    assert!(ProcNetProbe::default().is_established(&client).unwrap());
}
