//! Platform-specific interface control
//!
//! The daemon owns the only privileged capability in the system: flipping
//! the AWDL interface. That capability is expressed as the [`AwdlControl`]
//! trait so the IPC layer and the observer can be tested against a mock,
//! and so the macOS implementation stays behind one seam.

#[cfg(target_os = "macos")]
pub mod mac;

#[cfg(test)]
pub mod mock;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("failed to set interface state: {0}")]
    SetError(String),
    #[error("failed to query interface state: {0}")]
    QueryError(String),
    #[error("interface not present")]
    InterfaceMissing,
    #[error("unsupported platform")]
    UnsupportedPlatform,
}

/// Privileged control over the AWDL interface.
///
/// `set_awdl` requires root; the two read operations do not, which is why
/// the client process can answer status queries locally without a wire
/// message.
pub trait AwdlControl: Send + Sync {
    /// Bring the interface up (true) or down (false). State-setting and
    /// idempotent: applying the current state succeeds.
    fn set_awdl(&self, up: bool) -> Result<(), PlatformError>;

    /// Read the current interface state from the system, never a cache.
    fn is_awdl_up(&self) -> Result<bool, PlatformError>;

    /// Whether the interface exists on this machine at all.
    fn has_awdl(&self) -> bool;
}

/// Get the AWDL control implementation for the current platform.
pub fn get_awdl_control(interface: &str) -> Result<Box<dyn AwdlControl>, PlatformError> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(mac::MacAwdlControl::new(interface.to_string())))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = interface;
        Err(PlatformError::UnsupportedPlatform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_display() {
        let err = PlatformError::SetError("ifconfig exited 1".to_string());
        assert_eq!(err.to_string(), "failed to set interface state: ifconfig exited 1");

        let err = PlatformError::QueryError("no output".to_string());
        assert_eq!(err.to_string(), "failed to query interface state: no output");

        let err = PlatformError::InterfaceMissing;
        assert_eq!(err.to_string(), "interface not present");

        let err = PlatformError::UnsupportedPlatform;
        assert_eq!(err.to_string(), "unsupported platform");
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_get_awdl_control_on_macos() {
        assert!(get_awdl_control("awdl0").is_ok());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_get_awdl_control_unsupported_elsewhere() {
        assert!(matches!(
            get_awdl_control("awdl0"),
            Err(PlatformError::UnsupportedPlatform)
        ));
    }
}
