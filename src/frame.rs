// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::{Buf, BufMut};
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("unsupported frame data type: {0}")]
    UnsupportedDataType(char),
    /// Invalid message encoding.
    #[error("{0}")]
    Invalid(String),
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

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_frame_bytes(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_frame_bytes(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let integer = get_length(src)?;
                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = get_length(src)?;
                if length == -1 {
                    return Ok(Frame::Null);
                }

                let data = get_sized_bytes(src, length)?;
                Ok(Frame::Bulk(Bytes::copy_from_slice(data)))
            }
            // !<length>\r\n<error>\r\n
            DataType::BulkError => {
                let length = get_length(src)?;

                // NOTE: the protocol does not specify a way to represent a null bulk error
                if length == -1 {
                    return Ok(Frame::Null);
                }

                let msg = get_sized_bytes(src, length)?;
                let msg = String::from_utf8(msg.to_vec())?;

                Ok(Frame::Error(msg))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = get_length(src)?;
                if length == -1 {
                    return Ok(Frame::Null);
                }
                if length < 0 {
                    return Err(Error::Invalid(format!(
                        "protocol error; invalid array length {length}"
                    )));
                }

                // The declared length is untrusted until the elements actually arrive.
                let mut frames = Vec::with_capacity(length.min(1024) as usize);
                for _ in 0..length {
                    let frame = Self::parse(src)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
            DataType::Null => {
                // Advance the cursor to the end of the frame.
                let _ = get_frame_bytes(src)?;

                Ok(Frame::Null)
            }
            data_type => Err(Error::UnsupportedDataType(u8::from(data_type) as char)),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        bytes
    }

    /// Appends the wire representation of the frame to `dst`, avoiding an intermediate
    /// allocation per nested frame.
    pub fn write_to<B: BufMut>(&self, dst: &mut B) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(u8::from(DataType::SimpleString));
                dst.put_slice(s.as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Error(s) => {
                dst.put_u8(u8::from(DataType::SimpleError));
                dst.put_slice(s.as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Integer(i) => {
                dst.put_u8(u8::from(DataType::Integer));
                dst.put_slice(i.to_string().as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Bulk(bytes) => {
                dst.put_u8(u8::from(DataType::BulkString));
                dst.put_slice(bytes.len().to_string().as_bytes());
                dst.put_slice(CRLF);
                dst.put_slice(bytes);
                dst.put_slice(CRLF);
            }
            // RESP2 peers only understand the null bulk string.
            Frame::Null => dst.put_slice(b"$-1\r\n"),
            Frame::Array(arr) => {
                dst.put_u8(u8::from(DataType::Array));
                dst.put_slice(arr.len().to_string().as_bytes());
                dst.put_slice(CRLF);
                for frame in arr {
                    frame.write_to(dst);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
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

fn get_frame_bytes<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let frame_end_position = src.get_ref()[start..end]
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)
        .map(|index| start + index)?;

    src.set_position((frame_end_position + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..frame_end_position])
}

/// Reads exactly `length` bytes followed by CRLF. Bulk payloads are binary safe, so the
/// terminator is located by length rather than by scanning.
fn get_sized_bytes<'a>(src: &mut Cursor<&'a [u8]>, length: i64) -> Result<&'a [u8], Error> {
    if length < 0 {
        return Err(Error::Invalid(format!(
            "protocol error; invalid bulk length {length}"
        )));
    }

    let start = src.position() as usize;
    let data_end = start.saturating_add(length as usize);
    if src.get_ref().len() < data_end.saturating_add(CRLF.len()) {
        return Err(Error::Incomplete);
    }

    if &src.get_ref()[data_end..data_end + CRLF.len()] != CRLF {
        return Err("protocol error; bulk payload is not terminated by CRLF".into());
    }

    src.set_position((data_end + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..data_end])
}

fn get_length(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let bytes = get_frame_bytes(src)?;
    let string = std::str::from_utf8(bytes)
        .map_err(|_| Error::from("protocol error; invalid frame format"))?;

    string
        .parse::<i64>()
        .map_err(|e| Error::Invalid(format!("protocol error; invalid integer {string:?}: {e}")))
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
    // Due to historical reasons, RESP2 features two specially crafted values for representing null
    // values of bulk strings and arrays. This duality has always been a redundancy that added zero
    // semantical value to the protocol itself. The null type, introduced in RESP3, aims to fix
    // this wrong.
    Null, // '_'
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

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        Error::Invalid(src.to_string())
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Invalid(src)
    }
}
