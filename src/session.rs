use crate::certs::CertificateBundle;
use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

/// Everything one login attempt needs, assembled once per invocation and
/// immutable afterwards. Credential fields are wiped when the request is
/// dropped at the end of the attempt.
#[derive(Clone)]
pub struct LoginRequest {
    pub base_url: String,
    pub username: Option<Zeroizing<String>>,
    pub password: Option<Zeroizing<String>>,
    pub session_id: Option<String>,
    pub bios_password: Option<Zeroizing<String>>,
    pub otp: Option<String>,
    pub path: Option<String>,
    pub proxy: Option<String>,
    pub certs: CertificateBundle,
    pub include_logs: bool,
    pub is_redfish: bool,
    pub json_out: bool,
    pub wait_for_otp: bool,
}

impl LoginRequest {
    /// Copy of the request carrying the interactively-entered passcode, used
    /// for the single OTP retry.
    pub fn with_otp(&self, otp: String) -> Self {
        Self {
            otp: Some(otp),
            ..self.clone()
        }
    }
}

/// Authenticated context returned by the session service.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub base_url: String,
    pub session_key: Option<String>,
    pub session_location: Option<String>,
    pub discovered_paths: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("server is down or unreachable: {0}")]
    Unreachable(String),
    /// The controller sent a one-time passcode out of band and expects it on
    /// the next attempt.
    #[error("one-time passcode required to complete login")]
    OtpRequired,
    #[error("authentication was denied: {0}")]
    AuthDenied(String),
    #[error("no instance of the requested type was found: {0}")]
    InstanceNotFound(String),
    #[error("session service error: {0}")]
    Protocol(String),
}

/// Boundary to the session service. The login workflow drives this trait and
/// never speaks the wire protocol itself.
#[async_trait]
pub trait SessionClient {
    async fn login(&self, request: &LoginRequest) -> Result<Session, SessionError>;
    async fn select(&self, session: &Session, type_name: &str) -> Result<(), SessionError>;
    async fn logout(&self, session: &Session) -> Result<(), SessionError>;
}
