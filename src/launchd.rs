//! macOS LaunchDaemon management for the privileged helper
//!
//! Installs the helper daemon via launchd so it runs as root, owns the
//! control socket, and is restarted if it dies. Installation goes through
//! a one-time osascript authorization prompt; the helper itself never
//! escalates privileges, it assumes this step already ran.

use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// LaunchDaemon label
pub const HELPER_LABEL: &str = "com.wifried.helper";

/// Path to the LaunchDaemon plist
pub const HELPER_PLIST_PATH: &str = "/Library/LaunchDaemons/com.wifried.helper.plist";

/// Where the helper writes its log under launchd
pub const HELPER_LOG_PATH: &str = "/tmp/wifried-daemon.log";

/// Generate the LaunchDaemon plist content
///
/// # Arguments
/// * `exe_path` - Path to the wifried executable
///
/// # Returns
/// XML plist string suitable for LaunchDaemon
pub fn generate_helper_plist(exe_path: &Path) -> String {
    let exe_path_str = exe_path.display();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{}</string>
        <string>daemon</string>
        <string>--log-file</string>
        <string>{}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <true/>
    <key>StandardOutPath</key>
    <string>{}</string>
    <key>StandardErrorPath</key>
    <string>{}</string>
</dict>
</plist>"#,
        HELPER_LABEL, exe_path_str, HELPER_LOG_PATH, HELPER_LOG_PATH, HELPER_LOG_PATH
    )
}

/// Escape a string for use in AppleScript
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Install and start the helper via launchd
///
/// Uses osascript with admin privileges to:
/// 1. Write plist to /Library/LaunchDaemons/
/// 2. Set ownership to root:wheel
/// 3. Set permissions to 644
/// 4. Run launchctl load
///
/// # Arguments
/// * `exe_path` - Path to the wifried executable
///
/// # Returns
/// Ok(()) on success, Err with message on failure
pub fn install_helper(exe_path: &Path) -> Result<(), String> {
    info!("Installing LaunchDaemon: {}", HELPER_LABEL);
    debug!("Executable: {}", exe_path.display());

    let plist_content = generate_helper_plist(exe_path);

    // Build the shell command that will run with admin privileges
    let shell_cmd = format!(
        r#"launchctl unload {} 2>/dev/null
cat > {} << 'PLIST_EOF'
{}
PLIST_EOF
chown root:wheel {}
chmod 644 {}
launchctl load -w {}"#,
        HELPER_PLIST_PATH,
        HELPER_PLIST_PATH,
        plist_content,
        HELPER_PLIST_PATH,
        HELPER_PLIST_PATH,
        HELPER_PLIST_PATH
    );

    let escaped_shell_cmd = applescript_escape(&shell_cmd);

    let applescript = format!(
        r#"do shell script "{}" with administrator privileges"#,
        escaped_shell_cmd
    );

    debug!("Executing osascript for helper installation");
    let status = Command::new("osascript")
        .arg("-e")
        .arg(&applescript)
        .status()
        .map_err(|e| format!("Failed to execute osascript: {}", e))?;
    if !status.success() {
        return Err("Helper installation was cancelled or failed".to_string());
    }

    info!("Helper installation completed");
    Ok(())
}

/// Stop and uninstall the helper
///
/// Uses osascript with admin privileges to:
/// 1. Run launchctl unload (ignore errors if not loaded)
/// 2. Remove plist file
///
/// # Returns
/// Ok(()) on success, Err with message on failure
pub fn uninstall_helper() -> Result<(), String> {
    info!("Stopping and uninstalling LaunchDaemon: {}", HELPER_LABEL);

    // Use 2>/dev/null to ignore errors if the helper is not loaded
    let shell_cmd = format!(
        r#"launchctl unload {} 2>/dev/null; rm -f {}"#,
        HELPER_PLIST_PATH, HELPER_PLIST_PATH
    );

    let escaped_shell_cmd = applescript_escape(&shell_cmd);

    let applescript = format!(
        r#"do shell script "{}" with administrator privileges"#,
        escaped_shell_cmd
    );

    debug!("Executing osascript for helper uninstallation");
    let status = Command::new("osascript")
        .arg("-e")
        .arg(&applescript)
        .status()
        .map_err(|e| format!("Failed to execute osascript: {}", e))?;
    if !status.success() {
        return Err("Helper uninstallation was cancelled or failed".to_string());
    }

    info!("Helper uninstallation completed");
    Ok(())
}

/// Check if the helper plist exists
pub fn is_helper_installed() -> bool {
    Path::new(HELPER_PLIST_PATH).exists()
}

/// Check whether the installed plist matches the current executable.
pub fn is_helper_plist_current(exe_path: &Path) -> bool {
    let actual = match std::fs::read_to_string(HELPER_PLIST_PATH) {
        Ok(v) => v,
        Err(_) => return false,
    };

    let expected = generate_helper_plist(exe_path);
    actual == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_generate_helper_plist() {
        let exe_path = PathBuf::from("/usr/local/bin/wifried");

        let plist = generate_helper_plist(&exe_path);

        // Verify key elements are present
        assert!(plist.contains("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(plist.contains("<plist version=\"1.0\">"));
        assert!(plist.contains(HELPER_LABEL));
        assert!(plist.contains("/usr/local/bin/wifried"));
        assert!(plist.contains("<string>daemon</string>"));
        assert!(plist.contains("<string>--log-file</string>"));
        assert!(plist.contains("<key>RunAtLoad</key>"));
        assert!(plist.contains("<key>KeepAlive</key>"));
        assert!(plist.contains(HELPER_LOG_PATH));
    }

    #[test]
    fn test_applescript_escape() {
        assert_eq!(applescript_escape("hello"), "hello");
        assert_eq!(applescript_escape("hello\"world"), "hello\\\"world");
        assert_eq!(applescript_escape("path\\to\\file"), "path\\\\to\\\\file");
        assert_eq!(applescript_escape("path\\to\"file"), "path\\\\to\\\"file");
    }

    #[test]
    fn test_helper_label() {
        assert_eq!(HELPER_LABEL, "com.wifried.helper");
    }

    #[test]
    fn test_helper_plist_path() {
        assert_eq!(
            HELPER_PLIST_PATH,
            "/Library/LaunchDaemons/com.wifried.helper.plist"
        );
    }
}
