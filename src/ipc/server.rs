//! IPC server for the privileged helper daemon
//!
//! Listens on a Unix socket at a well-known path and serves one request
//! per connection. The accept loop never exits because of a single bad
//! connection; the only fatal errors are the ones [`IpcServer::bind`]
//! returns before the loop starts.

use super::protocol::{read_request, write_reply, Reply};
use crate::platform::AwdlControl;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Cap on reading a request and writing its reply. Waiting for a new
/// connection is the only thing the daemon blocks on indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fatal setup failures. These terminate the daemon; everything after a
/// successful bind is recovered per-connection.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("another helper instance already owns {}", .0.display())]
    AddressInUse(PathBuf),
    #[error("failed to bind helper socket: {0}")]
    Bind(#[source] io::Error),
}

/// IPC server owning the listening socket and the privileged control.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    control: Arc<dyn AwdlControl>,
    apply_lock: Arc<Mutex<()>>,
    request_timeout: Duration,
}

impl IpcServer {
    /// Bind the well-known socket path, taking over a stale socket file
    /// from an unclean shutdown but refusing to displace a live daemon.
    pub async fn bind(
        path: impl Into<PathBuf>,
        control: Arc<dyn AwdlControl>,
    ) -> Result<Self, ServerError> {
        let socket_path = path.into();

        if let Some(parent) = socket_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        if socket_path.exists() {
            // A live daemon answers a connect on the path; a leftover
            // file from an unclean shutdown does not.
            match UnixStream::connect(&socket_path).await {
                Ok(_) => return Err(ServerError::AddressInUse(socket_path)),
                Err(_) => {
                    info!("Removing stale socket at {}", socket_path.display());
                    std::fs::remove_file(&socket_path).map_err(ServerError::Bind)?;
                }
            }
        }

        let listener = UnixListener::bind(&socket_path).map_err(|e| {
            if e.kind() == io::ErrorKind::AddrInUse {
                ServerError::AddressInUse(socket_path.clone())
            } else {
                ServerError::Bind(e)
            }
        })?;

        // The daemon runs as root but the menu-bar client does not; the
        // socket permissions are the protocol's entire access control.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o666);
            let _ = std::fs::set_permissions(&socket_path, perms);
        }

        info!("Listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path,
            control,
            apply_lock: Arc::new(Mutex::new(())),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-connection read/write deadline.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Run the accept loop. Only returns on listener failure; individual
    /// connection errors are logged and dropped.
    pub async fn run(self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let control = Arc::clone(&self.control);
                    let apply_lock = Arc::clone(&self.apply_lock);
                    let request_timeout = self.request_timeout;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, control, apply_lock, request_timeout).await
                        {
                            debug!("Connection ended with error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Serve one connection: read exactly one request, apply it under the
/// state-change lock, write one reply, close. Every exit path releases
/// the lock (RAII) and drops the connection.
async fn handle_connection(
    mut stream: UnixStream,
    control: Arc<dyn AwdlControl>,
    apply_lock: Arc<Mutex<()>>,
    request_timeout: Duration,
) -> io::Result<()> {
    let request = match timeout(request_timeout, read_request(&mut stream)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            // Client went away before sending a full request; there is
            // nothing to reply to.
            debug!("Client disconnected mid-request");
            return Ok(());
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
            warn!("Rejecting malformed request: {}", e);
            let _ = write_reply(&mut stream, Reply::BadRequest).await;
            return Ok(());
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            debug!("Timed out waiting for a request, closing connection");
            return Ok(());
        }
    };

    debug!("Received request: up={}", request.up);

    let reply = {
        // One state change at a time; opposing requests cannot interleave.
        let _applying = apply_lock.lock().await;
        apply(&*control, request.up)
    };

    match timeout(request_timeout, write_reply(&mut stream, reply)).await {
        Ok(result) => result?,
        Err(_) => debug!("Timed out writing reply, closing connection"),
    }
    Ok(())
}

/// Apply a requested state through the platform primitive. The current
/// state is re-read from the system first; it is logged, not trusted as a
/// cache, and the set happens regardless (state-setting, idempotent).
fn apply(control: &dyn AwdlControl, up: bool) -> Reply {
    if !control.has_awdl() {
        warn!("AWDL interface not present, rejecting request");
        return Reply::InterfaceMissing;
    }

    match control.is_awdl_up() {
        Ok(current) if current == up => debug!("Interface already {}", if up { "up" } else { "down" }),
        Ok(current) => debug!("Changing interface: {} -> {}", current, up),
        Err(e) => debug!("Could not read current state: {}", e),
    }

    match control.set_awdl(up) {
        Ok(()) => {
            info!("AWDL set {}", if up { "up" } else { "down" });
            Reply::Ok
        }
        Err(e) => {
            warn!("Failed to apply AWDL state: {}", e);
            Reply::ApplyFailed
        }
    }
}
