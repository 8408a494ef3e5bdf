use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, instrument};

use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::dispatcher::{Dispatcher, Services};
use crate::stats::ServerStats;
use crate::worker::TokioWorkerPool;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;

    serve(listener, config).await
}

/// Accepts connections on `listener` until a client runs `SHUTDOWN`.
pub async fn serve(listener: TcpListener, config: Config) -> Result<(), Error> {
    let services = Services::new(
        &config,
        Arc::new(ServerStats::new()),
        Arc::new(TokioWorkerPool::current(config.workers)),
    );
    let shutdown = services.shutdown.clone();

    info!("Server listening on {}", listener.local_addr()?);

    let mut backoff = AcceptBackoff::new();
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => break,
        };
        let (socket, client_address) = match accepted {
            Ok(accepted) => {
                backoff.reset();
                accepted
            }
            Err(e) => {
                let delay = backoff.next_delay();
                error!("Failed to accept connection, retrying in {:?}: {}", delay, e);
                tokio::select! {
                    _ = time::sleep(delay) => continue,
                    _ = shutdown.cancelled() => break,
                }
            }
        };
        info!("Accepted connection from {:?}", client_address);

        let services = services.clone();
        let max_frame_size = config.max_frame_size;
        tokio::spawn(async move {
            if let Err(e) =
                handle_connection(socket, client_address, services, max_frame_size).await
            {
                error!("Connection failed: {}", e);
            }
        });
    }

    info!("Server shutting down");
    Ok(())
}

/// Delay between retries of a failing `accept`, e.g. while the process is out of file
/// descriptors. Doubles on every failure up to a cap.
struct AcceptBackoff {
    delay: Duration,
}

impl AcceptBackoff {
    const INITIAL: Duration = Duration::from_millis(10);
    const MAX: Duration = Duration::from_secs(1);

    fn new() -> AcceptBackoff {
        AcceptBackoff {
            delay: Self::INITIAL,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (self.delay * 2).min(Self::MAX);
        delay
    }

    fn reset(&mut self) {
        self.delay = Self::INITIAL;
    }
}

#[instrument(
    name = "connection",
    skip(stream, services, max_frame_size),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    services: Services,
    max_frame_size: usize,
) -> Result<(), Error> {
    let mut conn = Connection::with_max_frame_size(stream, max_frame_size);
    let shutdown = services.shutdown.clone();

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    let (sink, frames) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::with_id(conn.id, services, sink);
    let closed = dispatcher.closed();

    let writer = conn.spawn_writer(frames);

    loop {
        let frame = tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            _ = shutdown.cancelled() => break,
            frame = conn.read_frame() => frame,
        };

        match frame {
            Ok(Some(frame)) => {
                debug!("Received frame from client: {}", frame);
                match Command::try_from(frame) {
                    Ok(command) => dispatcher.on_command_received(command),
                    Err(e) => dispatcher.exception_caught(e),
                }
            }
            Ok(None) => break,
            Err(e) => dispatcher.exception_caught(e),
        }
    }

    dispatcher.on_connection_closing();

    if let Some(writer) = writer {
        match writer.await {
            Ok(Err(Error::Io(e))) => debug!("Writer stopped: {}", e),
            Ok(result) => result?,
            Err(e) => error!("Writer task failed: {}", e),
        }
    }

    info!("Connection closed");
    Ok(())
}
