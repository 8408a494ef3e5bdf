use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use cachedis::connection::Connection;
use cachedis::frame::Frame;
use cachedis::Error;

/// Returns the server side of a fresh TCP connection wrapped in a `Connection`, and the raw
/// client side.
async fn connection_pair(max_frame_size: Option<usize>) -> (Connection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let client = TcpStream::connect(address).await.unwrap();
    let (socket, _) = listener.accept().await.unwrap();

    let connection = match max_frame_size {
        Some(max) => Connection::with_max_frame_size(socket, max),
        None => Connection::new(socket),
    };
    (connection, client)
}

fn request(parts: &[&str]) -> Frame {
    Frame::Array(
        parts
            .iter()
            .map(|part| Frame::Bulk(Bytes::from(part.to_string())))
            .collect(),
    )
}

#[tokio::test]
async fn test_read_pipelined_requests() {
    let (mut connection, mut client) = connection_pair(None).await;

    client
        .write_all(b"*2\r\n$3\r\nGET\r\n$1\r\na\r\n*1\r\n$4\r\nPING\r\n*3\r\n$3\r\nSET\r\n$1\r\nb\r\n$0\r\n\r\n")
        .await
        .unwrap();

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(request(&["GET", "a"]))
    );
    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(request(&["PING"]))
    );
    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(request(&["SET", "b", ""]))
    );
}

#[tokio::test]
async fn test_read_request_split_across_writes() {
    let (mut connection, mut client) = connection_pair(None).await;

    tokio::spawn(async move {
        for part in [&b"*3\r\n$3\r\nSE"[..], b"T\r\n$5\r\nmyke", b"y\r\n$7\r\nmyvalue\r\n"] {
            client.write_all(part).await.unwrap();
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
        // Keep the socket open until the reader is done.
        let mut rest = vec![];
        let _ = client.read_to_end(&mut rest).await;
    });

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(request(&["SET", "mykey", "myvalue"]))
    );
}

#[tokio::test]
async fn test_clean_close_reads_none() {
    let (mut connection, mut client) = connection_pair(None).await;

    client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
    client.shutdown().await.unwrap();
    drop(client);

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(request(&["PING"]))
    );
    assert_eq!(connection.read_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_invalid_data_type_is_a_protocol_error() {
    let (mut connection, mut client) = connection_pair(None).await;

    client.write_all(b"?nope\r\n").await.unwrap();

    let err = connection.read_frame().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_oversized_request_is_rejected() {
    let (mut connection, mut client) = connection_pair(Some(16)).await;

    client
        .write_all(b"*1\r\n$64\r\n0123456789012345678901234567890123456789")
        .await
        .unwrap();

    let err = connection.read_frame().await.unwrap_err();
    assert!(err.to_string().contains("frame size exceeds limit"));
}

#[tokio::test]
async fn test_writer_flushes_responses_then_closes() {
    let (mut connection, mut client) = connection_pair(None).await;
    let (tx, rx) = mpsc::unbounded_channel();

    let writer = connection.spawn_writer(rx).unwrap();
    assert!(connection.spawn_writer(mpsc::unbounded_channel().1).is_none());

    tx.send(Frame::Simple("PONG".to_string())).unwrap();
    tx.send(Frame::Null).unwrap();
    tx.send(Frame::Array(vec![Frame::Integer(1), Frame::Error("ERR x".to_string())]))
        .unwrap();
    drop(tx);

    writer.await.unwrap().unwrap();

    let mut written = vec![];
    client.read_to_end(&mut written).await.unwrap();
    assert_eq!(
        written,
        b"+PONG\r\n$-1\r\n*2\r\n:1\r\n-ERR x\r\n".to_vec()
    );
}
