use anyhow::Context;
use clap::Parser;
use minecraft_protocol::{
    address,
    config::ClientConfig,
    protocol::{
        packet::{
            client::{Handshake, NextState, PingRequest, StatusRequest},
            server::{PingResponse, StatusResponse},
        },
        version::ProtocolVersion,
        VersionedPacket,
    },
};
use std::{
    net::{TcpStream, ToSocketAddrs},
    path::PathBuf,
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tracing_subscriber::EnvFilter;

/// Queries a server's status over the Minecraft protocol.
#[derive(Parser)]
#[command(name = "minecraft-protocol")]
#[command(version)]
struct Cli {
    /// Server host name or address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 25565)]
    port: u16,

    /// Protocol version to announce, as a number or release name
    /// (overrides the config file)
    #[arg(long)]
    protocol_version: Option<ProtocolVersion>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(version) = cli.protocol_version {
        config.protocol_version = version;
    }
    let version = config.protocol_version;

    let addr = (cli.host.as_str(), cli.port)
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve {}", cli.host))?
        .next()
        .with_context(|| format!("{} has no addresses", cli.host))?;
    match address::is_reserved_ip(addr.ip()) {
        Ok(true) => tracing::info!("{} is a reserved address", addr.ip()),
        Ok(false) => tracing::info!("{} is a public address", addr.ip()),
        Err(e) => tracing::debug!("Not classifying {}: {e}", addr.ip()),
    }

    let mut stream =
        TcpStream::connect(addr).with_context(|| format!("failed to connect to {addr}"))?;
    let codec = config.frame_codec();
    let receiver = config.receiver();
    tracing::info!("Connected to {addr} using protocol {version}");

    let handshake = Handshake {
        protocol_version: version,
        server_address: cli.host.clone(),
        server_port: cli.port,
        next_state: NextState::Status,
    };
    codec.write_packet(&mut stream, &handshake.to_packet(version)?)?;
    codec.write_packet(&mut stream, &StatusRequest.to_packet(version)?)?;

    let packet = codec.read_packet(&receiver, &mut stream)?;
    let status = StatusResponse::from_packet(&packet, version)?
        .with_context(|| format!("expected a status response, got packet 0x{:02X}", packet.id()))?;
    println!("{}", status.json);

    let payload = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64);
    let sent = Instant::now();
    codec.write_packet(&mut stream, &PingRequest { payload }.to_packet(version)?)?;
    let packet = codec.read_packet(&receiver, &mut stream)?;
    match PingResponse::from_packet(&packet, version)? {
        Some(pong) if pong.payload == payload => {
            tracing::info!("Ping: {} ms", sent.elapsed().as_millis())
        }
        _ => tracing::warn!("Server answered the ping with an unexpected packet"),
    }

    Ok(())
}
