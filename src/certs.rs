use crate::cli::LoginArgs;
use crate::config::PersistedConfig;

/// Client-certificate authentication material, the alternative to
/// username/password login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateBundle {
    pub ca_certs: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub key_password: Option<String>,
    pub bundle_disabled: bool,
}

impl CertificateBundle {
    /// True when no field is present at all. An empty bundle leaves the
    /// session client on its default CA trust.
    pub fn is_empty(&self) -> bool {
        self.ca_certs.is_none() && !self.has_client_material()
    }

    /// Client certificate, private key, or key password.
    pub fn has_client_material(&self) -> bool {
        self.cert_file.is_some() || self.key_file.is_some() || self.key_password.is_some()
    }
}

/// Assembles the certificate descriptor. The three client-material fields
/// fall back to the config file only when the flag was not given at all;
/// `--ca_cert_bundle` has no config fallback. Client material without an
/// explicit CA bundle disables the bundle and drops any CA path.
pub fn build(args: &LoginArgs, config: &PersistedConfig) -> CertificateBundle {
    let ca_certs = non_empty(args.ca_cert_bundle.clone());
    let cert_file = non_empty(
        args.user_certificate
            .clone()
            .or_else(|| config.user_cert.clone()),
    );
    let key_file = non_empty(
        args.user_root_ca_key
            .clone()
            .or_else(|| config.user_root_ca_key.clone()),
    );
    let key_password = non_empty(
        args.user_root_ca_password
            .clone()
            .or_else(|| config.user_root_ca_password.clone()),
    );

    let bundle_disabled = (cert_file.is_some() || key_file.is_some() || key_password.is_some())
        && ca_certs.is_none();
    let ca_certs = if bundle_disabled { None } else { ca_certs };

    CertificateBundle {
        ca_certs,
        cert_file,
        key_file,
        key_password,
        bundle_disabled,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_material_disables_bundle() {
        let args = LoginArgs {
            user_certificate: Some("/certs/client.pem".into()),
            ..Default::default()
        };
        let bundle = build(&args, &PersistedConfig::default());
        assert!(bundle.bundle_disabled);
        assert!(bundle.ca_certs.is_none());
        assert_eq!(bundle.cert_file.as_deref(), Some("/certs/client.pem"));
    }

    #[test]
    fn test_explicit_ca_bundle_keeps_bundle_enabled() {
        let args = LoginArgs {
            ca_cert_bundle: Some("/certs/ca.pem".into()),
            user_certificate: Some("/certs/client.pem".into()),
            ..Default::default()
        };
        let bundle = build(&args, &PersistedConfig::default());
        assert!(!bundle.bundle_disabled);
        assert_eq!(bundle.ca_certs.as_deref(), Some("/certs/ca.pem"));
    }

    #[test]
    fn test_ca_bundle_alone() {
        let args = LoginArgs {
            ca_cert_bundle: Some("/certs/ca.pem".into()),
            ..Default::default()
        };
        let bundle = build(&args, &PersistedConfig::default());
        assert!(!bundle.bundle_disabled);
        assert!(!bundle.is_empty());
        assert!(!bundle.has_client_material());
    }

    #[test]
    fn test_absent_flags_fall_back_to_config() {
        let config = PersistedConfig {
            user_cert: Some("/stored/client.pem".into()),
            user_root_ca_key: Some("/stored/client.key".into()),
            user_root_ca_password: Some("keypass".into()),
            ..Default::default()
        };
        let bundle = build(&LoginArgs::default(), &config);
        assert_eq!(bundle.cert_file.as_deref(), Some("/stored/client.pem"));
        assert_eq!(bundle.key_file.as_deref(), Some("/stored/client.key"));
        assert_eq!(bundle.key_password.as_deref(), Some("keypass"));
        assert!(bundle.bundle_disabled);
    }

    #[test]
    fn test_empty_flag_does_not_fall_back() {
        let config = PersistedConfig {
            user_cert: Some("/stored/client.pem".into()),
            ..Default::default()
        };
        let args = LoginArgs {
            user_certificate: Some(String::new()),
            ..Default::default()
        };
        let bundle = build(&args, &config);
        assert!(bundle.cert_file.is_none());
        assert!(bundle.is_empty());
        assert!(!bundle.bundle_disabled);
    }

    #[test]
    fn test_no_fields_builds_empty_bundle() {
        let bundle = build(&LoginArgs::default(), &PersistedConfig::default());
        assert!(bundle.is_empty());
        assert!(!bundle.bundle_disabled);
        assert_eq!(bundle, CertificateBundle::default());
    }
}
