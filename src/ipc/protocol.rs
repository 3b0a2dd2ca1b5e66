//! Wire protocol for client-daemon communication
//!
//! The protocol has exactly one request and one reply, both fixed-size:
//! - Request (5 bytes): 4-byte magic `"wifr"` followed by 1 flag byte
//!   (0 = bring AWDL down, nonzero = bring it up)
//! - Reply (1 byte): a status code
//!
//! Both ends validate the exact size and the magic before interpreting
//! anything. There is no length prefix, no versioning, and no other
//! message in this protocol version.

use std::fmt;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Protocol magic, the first four bytes of every request.
pub const MAGIC: [u8; 4] = *b"wifr";

/// Exact size of an encoded request.
pub const REQUEST_LEN: usize = 5;

/// Exact size of an encoded reply.
pub const REPLY_LEN: usize = 1;

/// Decode failures for incoming requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("truncated request: got {0} bytes, need 5")]
    Truncated(usize),
    #[error("oversized request: got {0} bytes, expected 5")]
    Oversized(usize),
}

/// The single request message: set the AWDL interface up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub up: bool,
}

impl Request {
    /// Encode to the fixed wire layout.
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut buf = [0u8; REQUEST_LEN];
        buf[..4].copy_from_slice(&MAGIC);
        buf[4] = u8::from(self.up);
        buf
    }

    /// Decode from a byte buffer, validating exact size and magic.
    ///
    /// The flag byte keeps C `bool` semantics: any nonzero value is up.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < REQUEST_LEN {
            return Err(DecodeError::Truncated(bytes.len()));
        }
        if bytes.len() > REQUEST_LEN {
            return Err(DecodeError::Oversized(bytes.len()));
        }
        if bytes[..4] != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&bytes[..4]);
            return Err(DecodeError::BadMagic(found));
        }
        Ok(Request { up: bytes[4] != 0 })
    }
}

/// Status byte returned by the daemon for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reply {
    /// State change applied (or interface already in the requested state).
    Ok = 0x00,
    /// The interface-state primitive failed.
    ApplyFailed = 0x01,
    /// The request did not decode; no state change occurred.
    BadRequest = 0x02,
    /// The AWDL interface is not present on this machine.
    InterfaceMissing = 0x03,
}

impl Reply {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Reply::Ok),
            0x01 => Some(Reply::ApplyFailed),
            0x02 => Some(Reply::BadRequest),
            0x03 => Some(Reply::InterfaceMissing),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "ok"),
            Reply::ApplyFailed => write!(f, "state change failed"),
            Reply::BadRequest => write!(f, "malformed request"),
            Reply::InterfaceMissing => write!(f, "interface not present"),
        }
    }
}

/// Read exactly one request from an async reader.
///
/// Decode failures are mapped to `io::ErrorKind::InvalidData`; a peer that
/// closes before sending a full request surfaces as `UnexpectedEof`.
pub async fn read_request<R>(reader: &mut R) -> io::Result<Request>
where
    R: AsyncReadExt + Unpin,
{
    let mut buf = [0u8; REQUEST_LEN];
    reader.read_exact(&mut buf).await?;
    Request::decode(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write one request to an async writer.
pub async fn write_request<W>(writer: &mut W, request: &Request) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_all(&request.encode()).await?;
    writer.flush().await
}

/// Read the raw reply byte from an async reader.
///
/// Interpretation is left to the caller so that an unknown byte can be
/// reported as a malformed response rather than an I/O error.
pub async fn read_reply<R>(reader: &mut R) -> io::Result<u8>
where
    R: AsyncReadExt + Unpin,
{
    let mut buf = [0u8; REPLY_LEN];
    reader.read_exact(&mut buf).await?;
    Ok(buf[0])
}

/// Write one reply byte to an async writer.
pub async fn write_reply<W>(writer: &mut W, reply: Reply) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_all(&[reply.to_byte()]).await?;
    writer.flush().await
}
