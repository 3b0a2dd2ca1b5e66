use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wifried::ipc::{ClientError, IpcClient, IpcServer};
use wifried::launchd;
use wifried::observer::{InterfaceEvent, InterfaceObserver};
use wifried::platform::{self, AwdlControl};
use wifried::Config;

/// Get the config file path (respects XDG_CONFIG_HOME and HOME)
fn get_config_path() -> PathBuf {
    // Try XDG_CONFIG_HOME first
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("wifried").join("config.toml");
    }

    // Fall back to HOME/.config
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("wifried")
            .join("config.toml");
    }

    // Last resort: use dirs crate
    if let Some(config) = dirs::config_dir() {
        return config.join("wifried").join("config.toml");
    }

    // Fallback to relative path (shouldn't happen)
    PathBuf::from("wifried.toml")
}

#[derive(Parser)]
#[command(name = "wifried")]
#[command(about = "Toggle the AWDL interface to reduce wireless interference")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the privileged helper daemon (requires root)
    Daemon {
        /// Listen on an alternate socket path
        #[arg(long)]
        socket: Option<PathBuf>,

        /// Log to a file instead of stderr (used under launchd)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Bring the AWDL interface up
    Enable,
    /// Bring the AWDL interface down
    Disable,
    /// Show interface and helper status
    Status,
    /// Watch the interface and print state changes
    Watch,
    /// Install the helper as a LaunchDaemon (one-time authorization prompt)
    Install,
    /// Stop and uninstall the helper LaunchDaemon
    Uninstall,
    /// Generate default config file
    Init,
}

/// Check if running with root privileges
fn is_admin() -> bool {
    unsafe { nix::libc::geteuid() == 0 }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Under launchd stdout/stderr go to the void; the daemon logs to a file
    let log_file = match &cli.command {
        Commands::Daemon { log_file, .. } => log_file.clone(),
        _ => None,
    };

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        // Truncate on start for clean logs
        let file = std::fs::File::create(&log_path)?;

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        info!("Helper started, logging to {:?}", log_path);
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let config_path = cli.config.clone().unwrap_or_else(get_config_path);
    let config = if config_path.exists() {
        match Config::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config file: {}", e);
                eprintln!();
                eprintln!("Your config file may be corrupted. Options:");
                eprintln!("  1. Fix the syntax error in {}", config_path.display());
                eprintln!("  2. Delete it and run 'wifried init' to recreate");
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Daemon { socket, .. } => {
            run_daemon(&config, socket).await?;
        }
        Commands::Enable => request_change(&config, true).await,
        Commands::Disable => request_change(&config, false).await,
        Commands::Status => show_status(&config).await,
        Commands::Watch => watch_interface(&config).await,
        Commands::Install => {
            let exe = std::env::current_exe()?;
            if launchd::is_helper_installed() && launchd::is_helper_plist_current(&exe) {
                println!("Helper already installed and current.");
            } else {
                match launchd::install_helper(&exe) {
                    Ok(()) => println!("Helper installed and started."),
                    Err(e) => {
                        error!("Install failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Commands::Uninstall => match launchd::uninstall_helper() {
            Ok(()) => println!("Helper uninstalled."),
            Err(e) => {
                error!("Uninstall failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Init => {
            info!("Generating default config...");
            let config = Config::default();
            config.save(&config_path)?;
            println!("Created default config: {}", config_path.display());
        }
    }

    Ok(())
}

/// Run the privileged helper until a signal or a fatal setup error.
async fn run_daemon(
    config: &Config,
    socket: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // The installer guarantees the daemon runs as root; a plain
    // `wifried daemon` without it fails here, before binding anything.
    if !is_admin() {
        eprintln!("ERROR: The helper daemon requires root privileges.\n");
        eprintln!("Run with: sudo wifried daemon");
        eprintln!("Or install it once via: wifried install");
        std::process::exit(1);
    }

    let socket_path = socket.unwrap_or_else(|| config.socket.path.clone());

    let control: Arc<dyn AwdlControl> = match platform::get_awdl_control(&config.interface.name) {
        Ok(control) => Arc::from(control),
        Err(e) => {
            error!("Cannot control {}: {}", config.interface.name, e);
            std::process::exit(1);
        }
    };

    // Bind failure is the one fatal error class; once the loop is running
    // every failure is recovered per-connection.
    let server = match IpcServer::bind(&socket_path, control).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start helper: {}", e);
            std::process::exit(1);
        }
    };

    info!("WiFried helper running");

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }

    Ok(())
}

/// Send one state-change request to the helper and report the outcome.
async fn request_change(config: &Config, up: bool) {
    let client = IpcClient::new(&config.socket.path);
    match client.set_awdl(up).await {
        Ok(()) => {
            println!("AWDL {}", if up { "enabled" } else { "disabled" });
        }
        Err(e @ (ClientError::NoSuchAddress | ClientError::ConnectionRefused)) => {
            error!("Could not reach the helper: {}", e);
            eprintln!("Could not reach the helper daemon.");
            eprintln!("Install or reinstall it with: wifried install");
            std::process::exit(1);
        }
        Err(e) => {
            error!("State change failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print interface state (read locally, no wire message) and helper status.
async fn show_status(config: &Config) {
    match platform::get_awdl_control(&config.interface.name) {
        Ok(control) => {
            if !control.has_awdl() {
                println!("AWDL interface: {} (not present)", config.interface.name);
            } else {
                match control.is_awdl_up() {
                    Ok(true) => println!("AWDL interface: {} (up)", config.interface.name),
                    Ok(false) => println!("AWDL interface: {} (down)", config.interface.name),
                    Err(e) => {
                        println!("AWDL interface: {} (unknown: {})", config.interface.name, e)
                    }
                }
            }
        }
        Err(e) => println!("AWDL interface: unavailable ({})", e),
    }

    println!(
        "Helper installed: {}",
        if launchd::is_helper_installed() {
            "yes"
        } else {
            "no"
        }
    );

    let client = IpcClient::new(&config.socket.path);
    println!(
        "Helper reachable: {}",
        if client.helper_is_reachable().await {
            "yes"
        } else {
            "no"
        }
    );
}

/// Run the observer in the foreground and print every state transition.
async fn watch_interface(config: &Config) {
    let control: Arc<dyn AwdlControl> = match platform::get_awdl_control(&config.interface.name) {
        Ok(control) => Arc::from(control),
        Err(e) => {
            error!("Cannot observe {}: {}", config.interface.name, e);
            std::process::exit(1);
        }
    };

    let observer = InterfaceObserver::new(
        control,
        Duration::from_secs(config.interface.poll_interval_secs),
    );
    let mut events = observer.subscribe();
    tokio::spawn(observer.run());

    println!("Watching {} (Ctrl+C to stop)", config.interface.name);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(InterfaceEvent::AwdlChanged(up)) => {
                    println!("AWDL {}", if up { "up" } else { "down" });
                }
                Ok(InterfaceEvent::AwdlMissing) => {
                    println!("AWDL interface gone");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Missed {} interface events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}
