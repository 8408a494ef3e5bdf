// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::str;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("unsupported frame data type: {0:?}")]
    UnsupportedDataType(char),
    /// Invalid message encoding.
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    pub fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    /// A generic error reply, rendered as `-ERR <message>`.
    pub fn error(message: impl AsRef<str>) -> Frame {
        Frame::Error(format!("ERR {}", message.as_ref()))
    }

    /// A type mismatch reply, rendered as `-WRONGTYPE <message>`.
    pub fn wrong_type(message: impl AsRef<str>) -> Frame {
        Frame::Error(format!("WRONGTYPE {}", message.as_ref()))
    }

    /// An error reply whose message already carries its own error code.
    pub fn custom_error(message: impl Into<String>) -> Frame {
        Frame::Error(message.into())
    }

    pub fn bulk_from(value: impl Into<Bytes>) -> Frame {
        Frame::Bulk(value.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Frame::Error(_))
    }

    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let string = get_line_string(src)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let string = get_line_string(src)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let integer = get_line_string(src)?
                    .parse::<i64>()
                    .map_err(|_| Error::Other("protocol error; invalid integer".to_string()))?;

                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => Ok(Frame::Bulk(get_exact(src, length)?)),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match get_length(src)? {
                // NOTE: the protocol does not specify a way to represent a null bulk error
                None => Ok(Frame::Null),
                Some(length) => {
                    let msg = get_exact(src, length)?;
                    let msg = String::from_utf8(msg.to_vec())?;
                    Ok(Frame::Error(msg))
                }
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    let mut frames = Vec::with_capacity(length.min(1024));
                    for _ in 0..length {
                        frames.push(Self::parse(src)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            DataType::Null => {
                // Advance the cursor to the end of the frame.
                get_line(src)?;
                Ok(Frame::Null)
            }
            data_type => Err(Error::UnsupportedDataType(u8::from(data_type) as char)),
        }
    }

    /// Writes the RESP2 encoding of this frame into `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(u8::from(DataType::SimpleString));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Error(s) => {
                dst.put_u8(u8::from(DataType::SimpleError));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Integer(i) => {
                dst.put_u8(u8::from(DataType::Integer));
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Bulk(bytes) => {
                dst.reserve(bytes.len() + 16);
                dst.put_u8(u8::from(DataType::BulkString));
                dst.extend_from_slice(bytes.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(bytes);
                dst.extend_from_slice(CRLF);
            }
            // Clients speaking RESP2 only understand the null bulk string.
            Frame::Null => dst.extend_from_slice(b"$-1\r\n"),
            Frame::Array(arr) => {
                dst.put_u8(u8::from(DataType::Array));
                dst.extend_from_slice(arr.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    frame.encode(dst);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        let mut dst = BytesMut::new();
        frame.encode(&mut dst);
        dst.to_vec()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

fn get_line_string(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    let line = get_line(src)?;
    Ok(String::from_utf8(line.to_vec())?)
}

/// Reads a `<length>\r\n` header. `-1` is the RESP2 null marker.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    let line = get_line(src)?;
    let length = str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<isize>().ok())
        .ok_or_else(|| Error::Other("protocol error; invalid length".to_string()))?;

    match length {
        -1 => Ok(None),
        length if length < 0 => Err(Error::Other(format!(
            "protocol error; invalid length {}",
            length
        ))),
        length => Ok(Some(length as usize)),
    }
}

fn get_exact(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    if src.remaining() < length + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let start = src.position() as usize;
    let data = Bytes::copy_from_slice(&src.get_ref()[start..start + length]);
    src.advance(length);

    if &src.chunk()[..CRLF.len()] != CRLF {
        return Err(Error::Other(
            "protocol error; bulk data not terminated by CRLF".to_string(),
        ));
    }
    src.advance(CRLF.len());

    Ok(data)
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString,   // '+'
    BulkString,     // '$'
    VerbatimString, // '='
    SimpleError,    // '-'
    BulkError,      // '!'
    Boolean,        // '#'
    Integer,        // ':'
    Double,         // ','
    BigNumber,      // '('
    Array,          // '*'
    Map,            // '%'
    Set,            // '~'
    Push,           // '>'
    Null,           // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            b'#' => Ok(Self::Boolean),
            b',' => Ok(Self::Double),
            b'(' => Ok(Self::BigNumber),
            b'=' => Ok(Self::VerbatimString),
            b'%' => Ok(Self::Map),
            b'~' => Ok(Self::Set),
            b'>' => Ok(Self::Push),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
            DataType::Boolean => b'#',
            DataType::Double => b',',
            DataType::BigNumber => b'(',
            DataType::VerbatimString => b'=',
            DataType::Map => b'%',
            DataType::Set => b'~',
            DataType::Push => b'>',
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_src: std::string::FromUtf8Error) -> Error {
        Error::Other("protocol error; invalid frame format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Frame, Error> {
        let mut cursor = Cursor::new(data);
        Frame::parse(&mut cursor)
    }

    #[test]
    fn parse_simple_string_frame() {
        assert_eq!(parse(b"+OK\r\n"), Ok(Frame::Simple("OK".to_string())));
    }

    #[test]
    fn parse_simple_error_frame() {
        assert_eq!(
            parse(b"-Error message\r\n"),
            Ok(Frame::Error("Error message".to_string()))
        );
    }

    #[test]
    fn parse_integer_frames() {
        assert_eq!(parse(b":1000\r\n"), Ok(Frame::Integer(1000)));
        assert_eq!(parse(b":-1000\r\n"), Ok(Frame::Integer(-1000)));
        assert_eq!(parse(b":+1000\r\n"), Ok(Frame::Integer(1000)));
    }

    #[test]
    fn parse_bulk_string_frame() {
        assert_eq!(
            parse(b"$6\r\nfoobar\r\n"),
            Ok(Frame::Bulk(Bytes::from("foobar")))
        );
        assert_eq!(parse(b"$0\r\n\r\n"), Ok(Frame::Bulk(Bytes::new())));
        assert_eq!(parse(b"$-1\r\n"), Ok(Frame::Null));
    }

    #[test]
    fn parse_bulk_string_with_embedded_crlf() {
        assert_eq!(
            parse(b"$8\r\nfoo\r\nbar\r\n"),
            Ok(Frame::Bulk(Bytes::from("foo\r\nbar")))
        );
    }

    #[test]
    fn parse_incomplete_bulk_string() {
        assert_eq!(parse(b"$6\r\nfoo"), Err(Error::Incomplete));
        assert_eq!(parse(b"$6\r\nfoobar"), Err(Error::Incomplete));
    }

    #[test]
    fn parse_bulk_error_frame() {
        assert_eq!(
            parse(b"!6\r\nfoobar\r\n"),
            Ok(Frame::Error("foobar".to_string()))
        );
    }

    #[test]
    fn parse_array_frame_nested() {
        let frame = parse(b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Array(vec![
                Frame::Array(vec![
                    Frame::Integer(1),
                    Frame::Integer(2),
                    Frame::Integer(3)
                ]),
                Frame::Array(vec![
                    Frame::Simple("Hello".to_string()),
                    Frame::Error("World".to_string())
                ]),
            ]))
        );
    }

    #[test]
    fn parse_array_frame_null_in_the_middle() {
        let frame = parse(b"*3\r\n$5\r\nhello\r\n$-1\r\n$5\r\nworld\r\n");

        assert_eq!(
            frame,
            Ok(Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Null,
                Frame::Bulk(Bytes::from("world")),
            ]))
        );
    }

    #[test]
    fn parse_unknown_data_type() {
        assert_eq!(parse(b"?oops\r\n"), Err(Error::InvalidDataType(b'?')));
        assert_eq!(
            parse(b"%1\r\n+a\r\n+b\r\n"),
            Err(Error::UnsupportedDataType('%'))
        );
    }

    #[test]
    fn encode_frames() {
        let frame = Frame::Array(vec![
            Frame::ok(),
            Frame::error("boom"),
            Frame::Integer(-3),
            Frame::Bulk(Bytes::from("hi")),
            Frame::Null,
        ]);

        let bytes: Vec<u8> = frame.into();

        assert_eq!(
            bytes,
            b"*5\r\n+OK\r\n-ERR boom\r\n:-3\r\n$2\r\nhi\r\n$-1\r\n".to_vec()
        );
    }

    #[test]
    fn error_constructors() {
        assert_eq!(Frame::error("x"), Frame::Error("ERR x".to_string()));
        assert_eq!(Frame::wrong_type("x"), Frame::Error("WRONGTYPE x".to_string()));
        assert_eq!(
            Frame::custom_error("NOAUTH x"),
            Frame::Error("NOAUTH x".to_string())
        );
    }
}
