use crate::certs::CertificateBundle;
use crate::cli::LoginArgs;
use crate::config::PersistedConfig;
use crate::credentials::Credentials;
use log::{debug, info};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Link-local address of the virtual NIC exposed by the management
/// controller.
pub const VNIC_URL: &str = "https://16.1.15.1";

/// In-process transport for the local controller, no network hop.
pub const LOCAL_URL: &str = "local://.";

const MANAGEMENT_PORT: u16 = 443;
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("empty username or password was entered")]
    MissingCredentials,
    #[error("please provide credentials to log in over VNIC")]
    VnicCredentialsRequired,
}

/// Decides the base transport address and checks that the chosen mode has
/// enough credential material to stand a chance.
pub fn resolve(
    args: &LoginArgs,
    config: &PersistedConfig,
    creds: &Credentials,
    certs: &CertificateBundle,
) -> Result<String, TargetError> {
    if let Some(url) = args.url.as_deref() {
        if !creds.has_pair() && !certs.has_client_material() {
            return Err(TargetError::MissingCredentials);
        }
        return Ok(normalize(url));
    }

    if args.force_vnic {
        if certs.is_empty() && !creds.has_pair() && args.session_id.is_none() {
            return Err(TargetError::VnicCredentialsRequired);
        }
        info!("attempting login over the VNIC link-local address");
        return Ok(VNIC_URL.to_string());
    }

    if let Some(url) = config.url.as_deref().filter(|url| !url.is_empty()) {
        return Ok(url.to_string());
    }

    Ok(LOCAL_URL.to_string())
}

fn normalize(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Best-effort reachability check against the management port. The outcome is
/// logged and otherwise ignored; login proceeds either way, and the probe
/// socket is dropped on every path.
pub async fn probe(url: &str) {
    let Some(host) = probe_host(url) else { return };
    match timeout(
        PROBE_TIMEOUT,
        TcpStream::connect((host.as_str(), MANAGEMENT_PORT)),
    )
    .await
    {
        Ok(Ok(_)) => debug!("management port open on {host}"),
        Ok(Err(err)) => debug!("reachability probe to {host} failed: {err}"),
        Err(_) => debug!("reachability probe to {host} timed out"),
    }
}

fn probe_host(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split('/').next()?;
    if authority.is_empty() || authority.starts_with('[') {
        return None;
    }
    let host = authority
        .rsplit_once(':')
        .map_or(authority, |(host, _port)| host);
    Some(host.to_string())
}
