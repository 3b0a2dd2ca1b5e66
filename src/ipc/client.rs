//! IPC client for the menu-bar side
//!
//! Opens one connection per request: connect, write the fixed-size
//! request, read the single reply byte, close. Every step runs under a
//! bounded timeout so a hung daemon can never wedge the caller, and all
//! failures collapse into [`ClientError`] so the UI layer needs no
//! protocol detail.

use super::protocol::{read_reply, write_request, Reply, Request};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// Default cap on each connect/write/read step.
const IPC_TIMEOUT: Duration = Duration::from_secs(2);

/// Client-visible failures, small enough for the UI to render a generic
/// "could not change state" without inspecting the wire.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("helper socket does not exist")]
    NoSuchAddress,
    #[error("permission denied opening helper socket")]
    PermissionDenied,
    #[error("helper is not accepting connections")]
    ConnectionRefused,
    #[error("timed out waiting for the helper")]
    Timeout,
    #[error("helper reported failure: {0}")]
    Daemon(Reply),
    #[error("malformed response byte {0:#04x}")]
    MalformedResponse(u8),
    #[error("i/o error talking to helper: {0}")]
    Io(#[from] io::Error),
}

fn map_connect_error(e: io::Error) -> ClientError {
    match e.kind() {
        io::ErrorKind::NotFound => ClientError::NoSuchAddress,
        io::ErrorKind::PermissionDenied => ClientError::PermissionDenied,
        io::ErrorKind::ConnectionRefused => ClientError::ConnectionRefused,
        _ => ClientError::Io(e),
    }
}

/// Outcome delivered to the UI layer after a dispatched request:
/// the state now in effect, or the error that prevented it.
pub type RequestOutcome = Result<bool, ClientError>;

/// IPC client for talking to the helper daemon.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Create a client for the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: IPC_TIMEOUT,
        }
    }

    /// Override the per-step timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Request the daemon to bring AWDL up or down.
    ///
    /// Safe to repeat: the daemon is state-setting, so a duplicate request
    /// is a no-op that still succeeds.
    pub async fn set_awdl(&self, up: bool) -> Result<(), ClientError> {
        debug!("Sending AWDL change request: up={}", up);

        let mut stream = match timeout(self.timeout, UnixStream::connect(&self.socket_path)).await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                debug!("Failed to connect to helper: {}", e);
                return Err(map_connect_error(e));
            }
            Err(_) => {
                debug!("Helper connect timeout");
                return Err(ClientError::Timeout);
            }
        };

        let request = Request { up };
        match timeout(self.timeout, write_request(&mut stream, &request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ClientError::Io(e)),
            Err(_) => return Err(ClientError::Timeout),
        }

        let byte = match timeout(self.timeout, read_reply(&mut stream)).await {
            Ok(Ok(byte)) => byte,
            Ok(Err(e)) => return Err(ClientError::Io(e)),
            Err(_) => return Err(ClientError::Timeout),
        };

        match Reply::from_byte(byte) {
            Some(Reply::Ok) => {
                debug!("Helper acknowledged: up={}", up);
                Ok(())
            }
            Some(status) => Err(ClientError::Daemon(status)),
            None => Err(ClientError::MalformedResponse(byte)),
        }
    }

    /// Dispatch a request off the caller's thread and deliver the outcome
    /// through `sink`. The UI stays responsive while the request is in
    /// flight and applies the result from its own event handling.
    pub fn spawn_set_awdl(&self, up: bool, sink: mpsc::UnboundedSender<RequestOutcome>) {
        let client = self.clone();
        tokio::spawn(async move {
            let outcome = client.set_awdl(up).await.map(|()| up);
            if sink.send(outcome).is_err() {
                debug!("Request outcome dropped, receiver gone");
            }
        });
    }

    /// Whether the helper is accepting connections at all.
    pub async fn helper_is_reachable(&self) -> bool {
        matches!(
            timeout(self.timeout, UnixStream::connect(&self.socket_path)).await,
            Ok(Ok(_))
        )
    }
}
