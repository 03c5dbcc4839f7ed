use crate::cli::LoginArgs;
use crate::config::PersistedConfig;
use crate::encoding;
use std::io;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("empty or invalid password was entered")]
    EmptyPassword,
    #[error("failed to read password: {0}")]
    Prompt(#[from] io::Error),
    #[error("failed to decode obfuscated credentials: {0}")]
    Decode(#[from] encoding::DecodeError),
}

/// Credential material for a single login attempt. The strings are wiped when
/// the attempt ends and the value is dropped.
#[derive(Default)]
pub struct Credentials {
    pub username: Option<Zeroizing<String>>,
    pub password: Option<Zeroizing<String>>,
    pub bios_password: Option<Zeroizing<String>>,
}

impl Credentials {
    pub fn has_pair(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Merges CLI and config-file credentials, prompting for a password only when
/// a username resolved without one and no certificate material is in play.
pub fn resolve(
    args: &LoginArgs,
    config: &PersistedConfig,
    prompt: impl FnOnce() -> io::Result<String>,
) -> Result<Credentials, CredentialError> {
    let username =
        non_empty(args.username.as_deref()).or_else(|| non_empty(config.username.as_deref()));
    let mut password =
        non_empty(args.password.as_deref()).or_else(|| non_empty(config.password.as_deref()));

    let cert_material = args.user_certificate.is_some()
        || args.user_root_ca_key.is_some()
        || args.user_root_ca_password.is_some()
        || config.user_cert.is_some()
        || config.user_root_ca_key.is_some()
        || config.user_root_ca_password.is_some();

    if username.is_some() && password.is_none() && !cert_material {
        let entered = prompt()?;
        let entered = entered.trim();
        if entered.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        password = Some(entered.to_string());
    }

    let (username, password) = if args.encode || config.encode_credentials {
        (
            username
                .map(|user| encoding::decode_credentials(&user))
                .transpose()?,
            password
                .map(|pass| encoding::decode_credentials(&pass))
                .transpose()?,
        )
    } else {
        (username, password)
    };

    Ok(Credentials {
        username: username.map(Zeroizing::new),
        password: password.map(Zeroizing::new),
        bios_password: non_empty(args.bios_password.as_deref()).map(Zeroizing::new),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_prompt() -> io::Result<String> {
        panic!("prompt must not be invoked");
    }

    #[test]
    fn test_cli_pair_skips_prompt() {
        let args = LoginArgs {
            username: Some("admin".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &PersistedConfig::default(), no_prompt).unwrap();
        assert_eq!(creds.username.as_deref().map(String::as_str), Some("admin"));
        assert_eq!(
            creds.password.as_deref().map(String::as_str),
            Some("hunter2")
        );
    }

    #[test]
    fn test_config_fallback_skips_prompt() {
        let args = LoginArgs::default();
        let config = PersistedConfig {
            username: Some("admin".into()),
            password: Some("stored".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &config, no_prompt).unwrap();
        assert_eq!(
            creds.password.as_deref().map(String::as_str),
            Some("stored")
        );
    }

    #[test]
    fn test_cli_wins_over_config() {
        let args = LoginArgs {
            username: Some("cli-user".into()),
            password: Some("cli-pass".into()),
            ..Default::default()
        };
        let config = PersistedConfig {
            username: Some("cfg-user".into()),
            password: Some("cfg-pass".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &config, no_prompt).unwrap();
        assert_eq!(
            creds.username.as_deref().map(String::as_str),
            Some("cli-user")
        );
        assert_eq!(
            creds.password.as_deref().map(String::as_str),
            Some("cli-pass")
        );
    }

    #[test]
    fn test_prompts_when_password_missing() {
        let args = LoginArgs {
            username: Some("admin".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &PersistedConfig::default(), || {
            Ok("typed\n".to_string())
        })
        .unwrap();
        assert_eq!(creds.password.as_deref().map(String::as_str), Some("typed"));
    }

    #[test]
    fn test_empty_prompt_response_fails() {
        let args = LoginArgs {
            username: Some("admin".into()),
            ..Default::default()
        };
        let result = resolve(&args, &PersistedConfig::default(), || Ok("   ".to_string()));
        assert!(matches!(result, Err(CredentialError::EmptyPassword)));
    }

    #[test]
    fn test_cert_material_suppresses_prompt() {
        let args = LoginArgs {
            username: Some("admin".into()),
            user_certificate: Some("/etc/bmcctl/client.pem".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &PersistedConfig::default(), no_prompt).unwrap();
        assert!(creds.password.is_none());
    }

    #[test]
    fn test_encode_decodes_both_fields() {
        let args = LoginArgs {
            username: Some("YWRtaW4=".into()),
            password: Some("aHVudGVyMg==".into()),
            encode: true,
            ..Default::default()
        };
        let creds = resolve(&args, &PersistedConfig::default(), no_prompt).unwrap();
        assert_eq!(creds.username.as_deref().map(String::as_str), Some("admin"));
        assert_eq!(
            creds.password.as_deref().map(String::as_str),
            Some("hunter2")
        );
    }

    #[test]
    fn test_empty_cli_value_falls_back() {
        let args = LoginArgs {
            username: Some(String::new()),
            password: Some("pass".into()),
            ..Default::default()
        };
        let config = PersistedConfig {
            username: Some("cfg-user".into()),
            ..Default::default()
        };
        let creds = resolve(&args, &config, no_prompt).unwrap();
        assert_eq!(
            creds.username.as_deref().map(String::as_str),
            Some("cfg-user")
        );
    }
}
