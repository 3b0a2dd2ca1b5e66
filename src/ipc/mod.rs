//! IPC between the menu-bar client and the privileged helper daemon
//!
//! A minimal local control plane over a Unix socket:
//! - the daemon binds a well-known path exclusively and serves one
//!   fixed-size request per connection
//! - the client opens a connection per request, sends 5 bytes, reads a
//!   1-byte status, and closes
//!
//! Trust comes from the transport, not the protocol: only processes that
//! can open the socket path may connect, and only the daemon holds the
//! privilege to change interface state.
//!
//! # Usage
//!
//! ## Daemon side (server)
//!
//! ```ignore
//! use std::sync::Arc;
//! use wifried::ipc::IpcServer;
//! use wifried::platform;
//!
//! let control = Arc::from(platform::get_awdl_control("awdl0")?);
//! let server = IpcServer::bind("/var/tmp/wifried.sock", control).await?;
//! server.run().await?;
//! ```
//!
//! ## Client side
//!
//! ```ignore
//! use wifried::ipc::IpcClient;
//!
//! let client = IpcClient::new("/var/tmp/wifried.sock");
//! client.set_awdl(false).await?;
//! ```

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{ClientError, IpcClient, RequestOutcome};
pub use protocol::{DecodeError, Reply, Request, MAGIC, REPLY_LEN, REQUEST_LEN};
pub use server::{IpcServer, ServerError};
