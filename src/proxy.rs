use crate::config::PersistedConfig;
use std::env;

/// Picks the outbound proxy for the login call. First non-empty wins:
/// explicit flag, https_proxy, http_proxy, config file.
pub fn resolve(cli_proxy: Option<&str>, config: &PersistedConfig) -> Option<String> {
    cli_proxy
        .filter(|proxy| !proxy.is_empty())
        .map(str::to_string)
        .or_else(|| env_proxy("https_proxy"))
        .or_else(|| env_proxy("http_proxy"))
        .or_else(|| config.proxy.clone().filter(|proxy| !proxy.is_empty()))
}

fn env_proxy(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the proxy environment variables are only touched from
    // one thread.
    #[test]
    fn test_precedence_chain() {
        let config = PersistedConfig {
            proxy: Some("http://config:3128".into()),
            ..Default::default()
        };

        env::set_var("https_proxy", "http://secure:3128");
        env::set_var("http_proxy", "http://plain:3128");

        assert_eq!(
            resolve(Some("http://flag:3128"), &config).as_deref(),
            Some("http://flag:3128")
        );
        assert_eq!(
            resolve(None, &config).as_deref(),
            Some("http://secure:3128")
        );

        env::remove_var("https_proxy");
        assert_eq!(resolve(None, &config).as_deref(), Some("http://plain:3128"));

        env::remove_var("http_proxy");
        assert_eq!(
            resolve(None, &config).as_deref(),
            Some("http://config:3128")
        );

        assert_eq!(resolve(None, &PersistedConfig::default()), None);
        assert_eq!(resolve(Some(""), &PersistedConfig::default()), None);
    }
}
