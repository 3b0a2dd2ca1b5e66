//! WiFried - Toggles the AWDL interface to reduce wireless interference
//!
//! The menu-bar UI lives elsewhere; this crate is the privileged helper
//! daemon, the IPC protocol the UI uses to reach it, and the observer
//! that keeps the UI in sync with interface state.

pub mod config;
pub mod ipc;
pub mod launchd;
pub mod observer;
pub mod platform;

pub use config::Config;
pub use observer::{InterfaceEvent, InterfaceObserver};
