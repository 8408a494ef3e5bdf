use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWrite;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;
use uuid::Uuid;

use crate::codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
use crate::frame::Frame;
use crate::Error;

/// A client connection, split into a frame reader and the raw write half.
///
/// Responses do not go through the connection directly: they are pushed onto a channel and
/// written by the task started with [`Connection::spawn_writer`], so they can be produced from
/// any thread.
pub struct Connection {
    pub id: Uuid,
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: Option<OwnedWriteHalf>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection::with_max_frame_size(stream, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(stream: TcpStream, max_frame_size: usize) -> Connection {
        let (reader, writer) = stream.into_split();

        Connection {
            id: Uuid::new_v4(),
            reader: FramedRead::new(reader, FrameCodec::new(max_frame_size)),
            writer: Some(writer),
        }
    }

    /// Reads the next frame. `None` means the peer closed the connection cleanly.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.reader.next().await.transpose()
    }

    /// Starts writing every frame received on `frames` to the socket. The write half is shut
    /// down once all senders are gone and the queued frames are flushed.
    ///
    /// Returns `None` if the writer was already started.
    pub fn spawn_writer(
        &mut self,
        frames: UnboundedReceiver<Frame>,
    ) -> Option<tokio::task::JoinHandle<Result<(), Error>>> {
        let writer = self.writer.take()?;
        Some(tokio::spawn(write_frames(writer, frames)))
    }
}

/// Encodes frames from `frames` onto `writer` until the channel closes.
pub async fn write_frames<W>(writer: W, mut frames: UnboundedReceiver<Frame>) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, FrameCodec::default());

    while let Some(frame) = frames.recv().await {
        sink.feed(frame).await?;
        // Batch whatever else is already waiting into the same flush.
        while let Ok(frame) = frames.try_recv() {
            sink.feed(frame).await?;
        }
        sink.flush().await?;
    }

    debug!("Outbound channel closed, shutting down writer");
    sink.close().await
}
