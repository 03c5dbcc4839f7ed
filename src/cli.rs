use crate::login;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

const LOGIN_EXAMPLES: &str = "\
Examples:
  Remote login:     bmcctl login <url/hostname> -u <username> -p <password>
  Local login:      bmcctl login
  VNIC login:       bmcctl login --force_vnic -u <username> -p <password>
  Implicit OTP:     bmcctl login -u <username> -p <password> --wait_for_otp
  Explicit OTP:     bmcctl login -u <username> -p <password> -o <passcode>

A [URL] can be specified with an IPv4, IPv6, or hostname address.";

#[derive(Parser)]
#[command(
    name = "bmcctl",
    version,
    about = "Connects to a management controller, establishes a secure session, and discovers its data"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Print extra detail about what the command did
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Emit machine-readable JSON instead of human-oriented output
    #[arg(long, global = true)]
    pub json: bool,
    /// Force the Redfish API even on controllers that still expose legacy REST
    #[arg(long, global = true)]
    pub redfish: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a controller and establish a secure session
    #[command(after_help = LOGIN_EXAMPLES)]
    Login(LoginArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Globals {
    pub verbose: bool,
    pub json: bool,
    pub redfish: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Controller URL or hostname (omit to log in to the local controller)
    pub url: Option<String>,
    /// Account username
    #[arg(short, long)]
    pub username: Option<String>,
    /// Account password
    #[arg(short, long)]
    pub password: Option<String>,
    /// BIOS setup password, carried with the session for later BIOS operations
    #[arg(long = "biospassword")]
    pub bios_password: Option<String>,
    /// Reuse an existing session id instead of credentials
    #[arg(long = "sessionid")]
    pub session_id: Option<String>,
    /// One-time passcode for accounts with two-factor login enabled
    #[arg(short = 'o', long = "otp")]
    pub otp: Option<String>,
    /// Wait for the controller to send a one-time passcode, then prompt for it
    #[arg(long = "wait_for_otp")]
    pub wait_for_otp: bool,
    /// Log in over the virtual NIC link-local address
    #[arg(long = "force_vnic")]
    pub force_vnic: bool,
    /// Outbound proxy, overriding https_proxy/http_proxy and the config file
    #[arg(long = "useproxy")]
    pub proxy: Option<String>,
    /// CA certificate bundle used to verify the controller
    #[arg(long = "ca_cert_bundle")]
    pub ca_cert_bundle: Option<String>,
    /// Client certificate for certificate-based login
    #[arg(long = "user_certificate")]
    pub user_certificate: Option<String>,
    /// Private key matching --user_certificate
    #[arg(long = "user_root_ca_key")]
    pub user_root_ca_key: Option<String>,
    /// Password protecting --user_root_ca_key
    #[arg(long = "user_root_ca_password")]
    pub user_root_ca_password: Option<String>,
    /// Treat the supplied username and password as base64 obfuscated
    #[arg(long)]
    pub encode: bool,
    /// Include log entries when discovering controller data
    #[arg(long = "includelogs")]
    pub include_logs: bool,
    /// Limit discovery to the given resource path
    #[arg(long)]
    pub path: Option<String>,
    /// Select a resource type to operate on after login
    #[arg(long)]
    pub selector: Option<String>,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let globals = Globals {
        verbose: cli.verbose,
        json: cli.json,
        redfish: cli.redfish,
    };
    match cli.command {
        Commands::Login(args) => {
            login::run(&globals, args).await?;
        }
    }
    Ok(())
}
