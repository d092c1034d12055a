use crate::prelude::*;

use {
    bytes::Bytes,
    futures::StreamExt,
    net2::TcpStreamExt,
    std::{net::SocketAddr, time::Duration},
    tokio::net::{TcpListener, TcpStream},
    tokio_util::codec::{BytesCodec, FramedRead},
};

// a full inverter frame is 99 bytes; anything bigger than this in one read is noise
const MAX_FRAME_SIZE: usize = 1024;
const TCP_KEEPALIVE_SECS: u64 = 60;

/// One candidate buffer exactly as it came off the socket.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Frame {
    pub peer: SocketAddr,
    pub bytes: Bytes,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChannelData {
    Connected(SocketAddr),
    Disconnected(SocketAddr),
    Frame(Frame),
    Shutdown,
}

/// Accepts connections from data loggers configured to push to this host.
///
/// Every socket read is forwarded as a separate candidate buffer; nothing is
/// stitched together across reads.
#[derive(Clone)]
pub struct Listener {
    config: ConfigWrapper,
    channels: Channels,
}

impl Listener {
    pub fn new(config: ConfigWrapper, channels: Channels) -> Self {
        Self { config, channels }
    }

    pub async fn start(&self) -> Result<()> {
        let listen = self.config.listen();
        let listener = TcpListener::bind((listen.host(), listen.port()))
            .await
            .map_err(|e| anyhow!("cannot listen on {}:{}: {}", listen.host(), listen.port(), e))?;

        info!("listening for loggers on {}:{}", listen.host(), listen.port());

        self.accept_loop(listener).await
    }

    pub fn stop(&self) {
        let _ = self.channels.to_logger.send(ChannelData::Shutdown);
    }

    async fn accept_loop(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.channels.to_logger.subscribe();

        loop {
            tokio::select! {
                msg = shutdown_rx.recv() => {
                    match msg {
                        Ok(ChannelData::Shutdown) | Err(broadcast::error::RecvError::Closed) => {
                            info!("listener received shutdown signal");
                            break;
                        }
                        _ => continue,
                    }
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("accept failed: {}", e);
                            continue;
                        }
                    };

                    let connection = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = connection.handle_connection(stream, peer).await {
                            warn!("logger {}: {}", peer, e);
                        }
                    });
                }
            }
        }

        info!("listener exiting");
        Ok(())
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        info!("logger {}: connected", peer);

        let std_stream = stream.into_std()?;
        if let Err(e) = std_stream.set_keepalive(Some(Duration::new(TCP_KEEPALIVE_SECS, 0))) {
            warn!("Failed to set TCP keepalive: {}", e);
        }
        let stream = TcpStream::from_std(std_stream)?;

        let _ = self.channels.from_logger.send(ChannelData::Connected(peer));

        let result = self.receiver(stream, peer).await;

        let _ = self.channels.from_logger.send(ChannelData::Disconnected(peer));
        info!("logger {}: disconnected", peer);

        result
    }

    // logger -> coordinator
    async fn receiver(&self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        let read_timeout = Duration::from_secs(self.config.listen().read_timeout());
        let mut shutdown_rx = self.channels.to_logger.subscribe();
        let mut reads = FramedRead::with_capacity(stream, BytesCodec::new(), MAX_FRAME_SIZE);

        loop {
            tokio::select! {
                msg = shutdown_rx.recv() => {
                    match msg {
                        Ok(ChannelData::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                        _ => continue,
                    }
                }
                read = tokio::time::timeout(read_timeout, reads.next()) => {
                    let bytes = match read {
                        Ok(Some(Ok(bytes))) => bytes,
                        Ok(Some(Err(e))) => bail!("Read error: {}", e),
                        Ok(None) => break, // closed by peer
                        Err(_) => bail!("No data received for {} seconds", read_timeout.as_secs()),
                    };

                    if bytes.len() > MAX_FRAME_SIZE {
                        warn!("logger {}: dropping {} byte read", peer, bytes.len());
                        continue;
                    }

                    debug!("logger {}: RX {}", peer, Utils::hex(&bytes));

                    let frame = Frame { peer, bytes: bytes.freeze() };
                    if self.channels.from_logger.send(ChannelData::Frame(frame)).is_err() {
                        bail!("send(from_logger) failed - channel closed?");
                    }
                }
            }
        }

        Ok(())
    }
}
