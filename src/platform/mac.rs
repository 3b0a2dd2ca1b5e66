//! macOS AWDL control via `ifconfig`
//!
//! AWDL is exposed as a regular network interface (`awdl0`), so state
//! changes go through `ifconfig <if> up|down` and the current state is
//! read back from the flags line of `ifconfig <if>`:
//!
//! ```text
//! awdl0: flags=8943<UP,BROADCAST,RUNNING,PROMISC,SIMPLEX,MULTICAST> mtu 1484
//! ```
//!
//! Bringing the interface up or down requires root; reading flags does not.

use super::{AwdlControl, PlatformError};
use std::process::Command;
use tracing::{debug, warn};

pub struct MacAwdlControl {
    interface: String,
}

impl MacAwdlControl {
    pub fn new(interface: String) -> Self {
        Self { interface }
    }

    fn ifconfig_output(&self) -> Result<String, PlatformError> {
        let output = Command::new("ifconfig")
            .arg(&self.interface)
            .output()
            .map_err(|e| PlatformError::QueryError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if stderr.contains("does not exist") {
                return Err(PlatformError::InterfaceMissing);
            }
            return Err(PlatformError::QueryError(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl AwdlControl for MacAwdlControl {
    fn set_awdl(&self, up: bool) -> Result<(), PlatformError> {
        let state = if up { "up" } else { "down" };
        debug!("Setting {} {}", self.interface, state);

        let output = Command::new("ifconfig")
            .args([self.interface.as_str(), state])
            .output()
            .map_err(|e| PlatformError::SetError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if stderr.contains("does not exist") {
                return Err(PlatformError::InterfaceMissing);
            }
            warn!("ifconfig {} {} failed: {}", self.interface, state, stderr);
            return Err(PlatformError::SetError(stderr));
        }

        Ok(())
    }

    fn is_awdl_up(&self) -> Result<bool, PlatformError> {
        let output = self.ifconfig_output()?;
        Ok(interface_flags_up(&output))
    }

    fn has_awdl(&self) -> bool {
        Command::new("ifconfig")
            .arg(&self.interface)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

/// Parse the UP flag out of `ifconfig` output.
fn interface_flags_up(ifconfig_output: &str) -> bool {
    ifconfig_output
        .lines()
        .next()
        .and_then(|line| {
            let flags = line.split("flags=").nth(1)?;
            let names = flags.split('<').nth(1)?.split('>').next()?;
            Some(names.split(',').any(|flag| flag == "UP"))
        })
        .unwrap_or(false)
}
