//! TCP listener and connection tasks
//!
//! Every accepted client gets its own tokio task running a
//! [`Station`](crate::station::Station). Tasks share only the immutable
//! track list and station settings.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, info_span, warn, Instrument};

use crate::config::{ServerConfig, StationConfig};
use crate::error::{Error, NetworkError, Result};
use crate::station::Station;
use crate::tracks::{RandomSelector, TrackList};

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Create a reusable listening socket with the given backlog
pub fn create_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener> {
    let bind_failed = |e: std::io::Error| NetworkError::BindFailed(format!("{}: {}", addr, e));

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_failed)?;
    socket.set_reuse_address(true).map_err(bind_failed)?;
    socket.set_nonblocking(true).map_err(bind_failed)?;
    socket.bind(&addr.into()).map_err(bind_failed)?;
    let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
    socket.listen(backlog).map_err(bind_failed)?;

    let std_listener: std::net::TcpListener = socket.into();
    let listener = TcpListener::from_std(std_listener).map_err(bind_failed)?;
    Ok(listener)
}

/// Accepts clients and spawns one station per connection
pub struct StationServer {
    listener: TcpListener,
    tracks: Arc<TrackList>,
    station: Arc<StationConfig>,
    nodelay: bool,
    base_seed: u64,
    next_id: u64,
}

impl StationServer {
    /// Bind the listener. Must be called inside a tokio runtime.
    pub fn bind(
        server: &ServerConfig,
        station: StationConfig,
        tracks: Arc<TrackList>,
    ) -> Result<Self> {
        let listener = create_listener(server.socket_addr()?, server.backlog)?;
        let base_seed = station.seed.unwrap_or_else(time_seed);

        Ok(Self {
            listener,
            tracks,
            station: Arc::new(station),
            nodelay: server.nodelay,
            base_seed,
            next_id: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Connections already being served keep running.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        warn!("{}", NetworkError::AcceptFailed(e));
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }

    fn spawn_connection(&mut self, stream: TcpStream, peer: SocketAddr) {
        let id = self.next_id;
        self.next_id += 1;

        if self.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("set_nodelay failed for {}: {}", peer, e);
            }
        }

        let seed = connection_seed(self.base_seed, id);
        let station = Station::new(
            self.tracks.clone(),
            &self.station,
            RandomSelector::from_seed(seed),
        );

        let span = info_span!("conn", id, %peer);
        tokio::spawn(serve(station, stream).instrument(span));
    }
}

async fn serve(mut station: Station<RandomSelector>, mut stream: TcpStream) {
    info!("Client connected");

    let result = station.run(&mut stream).await;
    let stats = station.stats();

    match result {
        Err(Error::Network(NetworkError::SendFailed(e))) => info!("Client disconnected: {}", e),
        Err(e) => warn!("Connection ended: {}", e),
        Ok(()) => {}
    }
    info!(
        "Played {} tracks ({} skipped), {} frames, {:.1} KB, {} late frames",
        stats.tracks_played,
        stats.tracks_skipped,
        stats.frames_sent,
        stats.bytes_sent as f64 / 1024.0,
        stats.pacer.late_frames
    );
}

fn time_seed() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

/// Distinct per-connection seed derived from the server's base seed
fn connection_seed(base: u64, id: u64) -> u64 {
    base ^ id.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
