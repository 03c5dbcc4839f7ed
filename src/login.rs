use crate::certs;
use crate::cli::{Globals, LoginArgs};
use crate::config::{self, PersistedConfig};
use crate::credentials;
use crate::proxy;
use crate::redfish::RedfishClient;
use crate::session::{LoginRequest, Session, SessionClient, SessionError};
use crate::target;
use anyhow::{Context, Result};
use log::warn;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("the path specified by the --path flag is unavailable")]
    PathUnavailable,
    #[error("no instance of type '{selector}' was found on this controller")]
    InstanceNotFound {
        selector: String,
        #[source]
        source: SessionError,
    },
}

/// Terminal state of one login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(Session),
    /// The server could not be reached. Reported to the user, not fatal.
    Unreachable,
}

pub async fn run(globals: &Globals, args: LoginArgs) -> Result<()> {
    let config = config::load()
        .await
        .context("failed to load persisted configuration")?;
    let client = RedfishClient::default();
    run_with(
        &client,
        globals,
        &args,
        &config,
        || rpassword::prompt_password("password: "),
        read_otp,
    )
    .await?;
    Ok(())
}

/// The full login workflow over an arbitrary session client. Split from
/// `run` so tests can drive it with scripted clients and prompts.
pub async fn run_with<C: SessionClient>(
    client: &C,
    globals: &Globals,
    args: &LoginArgs,
    config: &PersistedConfig,
    password_prompt: impl FnOnce() -> io::Result<String>,
    otp_prompt: impl FnOnce() -> io::Result<String>,
) -> Result<LoginOutcome> {
    let creds = credentials::resolve(args, config, password_prompt)?;
    let bundle = certs::build(args, config);
    let base_url = target::resolve(args, config, &creds, &bundle)?;
    if base_url != target::LOCAL_URL {
        target::probe(&base_url).await;
    }

    let request = LoginRequest {
        base_url,
        username: creds.username,
        password: creds.password,
        bios_password: creds.bios_password,
        session_id: args.session_id.clone(),
        otp: args.otp.clone(),
        path: args.path.clone(),
        proxy: proxy::resolve(args.proxy.as_deref(), config),
        certs: bundle,
        include_logs: args.include_logs,
        is_redfish: globals.redfish,
        json_out: globals.json,
        wait_for_otp: args.wait_for_otp,
    };

    let outcome = establish(client, &request, otp_prompt).await;
    // Resolved credentials live only as long as the attempt.
    drop(request);
    let outcome = outcome?;

    if !config.encode_credentials {
        warn!("cache is activated: session keys are stored in plaintext");
    }
    if config.debug {
        warn!("debug logging is activated and stored in plaintext");
    }

    let session = match outcome {
        LoginOutcome::Authenticated(session) => session,
        LoginOutcome::Unreachable => return Ok(LoginOutcome::Unreachable),
    };

    if let Some(selector) = args.selector.as_deref() {
        client
            .select(&session, selector)
            .await
            .map_err(|source| LoginError::InstanceNotFound {
                selector: selector.to_string(),
                source,
            })?;
        if globals.verbose && !globals.json {
            println!("Selected option: '{selector}'");
        }
    }

    if session.discovered_paths.is_empty() {
        client
            .logout(&session)
            .await
            .context("failed to tear down session with no reachable paths")?;
        return Err(LoginError::PathUnavailable.into());
    }

    Ok(LoginOutcome::Authenticated(session))
}

/// One login attempt as an explicit state machine: a first call, and on an
/// OTP challenge in waiting mode exactly one retry carrying the passcode
/// entered at the prompt. Any outcome of the retry is terminal.
async fn establish<C: SessionClient>(
    client: &C,
    request: &LoginRequest,
    otp_prompt: impl FnOnce() -> io::Result<String>,
) -> Result<LoginOutcome> {
    match client.login(request).await {
        Ok(session) => Ok(LoginOutcome::Authenticated(session)),
        Err(SessionError::Unreachable(reason)) => {
            warn!("the following error occurred during login: {reason}");
            Ok(LoginOutcome::Unreachable)
        }
        Err(SessionError::OtpRequired) if request.wait_for_otp => {
            println!("One-time passcode sent to the registered channel.");
            let otp = otp_prompt().context("failed to read one-time passcode")?;
            let retry = request.with_otp(otp.trim().to_string());
            match client.login(&retry).await {
                Ok(session) => Ok(LoginOutcome::Authenticated(session)),
                Err(SessionError::Unreachable(reason)) => {
                    warn!("the following error occurred during login: {reason}");
                    Ok(LoginOutcome::Unreachable)
                }
                Err(err) => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn read_otp() -> io::Result<String> {
    print!("Enter OTP: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
