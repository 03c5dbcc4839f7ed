use crate::session::{LoginRequest, Session, SessionClient, SessionError};
use crate::target;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header, Certificate, Client, Identity, Proxy, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(90);
const X_AUTH_TOKEN: &str = "x-auth-token";

/// Production session client speaking Redfish (or legacy REST) over HTTPS.
/// The HTTP client built for login is kept around so select and logout reuse
/// the same proxy and certificate settings.
#[derive(Default)]
pub struct RedfishClient {
    http: Mutex<Option<Client>>,
}

#[async_trait]
impl SessionClient for RedfishClient {
    async fn login(&self, request: &LoginRequest) -> Result<Session, SessionError> {
        let base_url = rewrite_local(&request.base_url);
        let client = build_client(request).await?;
        *self.http.lock().await = Some(client.clone());

        let mut session = Session {
            base_url: base_url.clone(),
            ..Default::default()
        };

        if let Some(id) = request.session_id.as_deref() {
            debug!("reusing existing session id");
            session.session_key = Some(id.to_string());
        } else {
            let url = format!("{base_url}{}", sessions_path(request.is_redfish));
            let mut body = json!({});
            if let Some(user) = request.username.as_deref() {
                body["UserName"] = json!(user.as_str());
            }
            if let Some(pass) = request.password.as_deref() {
                body["Password"] = json!(pass.as_str());
            }
            if let Some(otp) = request.otp.as_deref() {
                body["Token"] = json!(otp);
            }

            let response = client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(connect_error)?;
            let status = response.status();

            if status.is_success() {
                session.session_key = header_string(&response, X_AUTH_TOKEN);
                session.session_location = header_string(&response, header::LOCATION.as_str());
            } else {
                let text = response.text().await.unwrap_or_default();
                if text.contains("OneTimePasscode") {
                    return Err(SessionError::OtpRequired);
                }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(SessionError::AuthDenied(format!(
                        "session create returned {status}"
                    )));
                }
                return Err(SessionError::Protocol(format!(
                    "session create returned {status}"
                )));
            }
        }

        session.discovered_paths = discover(&client, &session, request).await?;
        if !request.json_out {
            info!(
                "discovered {} resource paths under {base_url}",
                session.discovered_paths.len()
            );
        }
        Ok(session)
    }

    async fn select(&self, session: &Session, type_name: &str) -> Result<(), SessionError> {
        let client = self.cached_client().await?;
        let wanted = type_name.trim_end_matches('.').to_ascii_lowercase();

        for path in &session.discovered_paths {
            let mut get = client.get(format!("{}{}", session.base_url, path));
            if let Some(key) = &session.session_key {
                get = get.header(X_AUTH_TOKEN, key);
            }
            let Ok(response) = get.send().await else {
                continue;
            };
            let Ok(body) = response.json::<Value>().await else {
                continue;
            };
            if let Some(odata_type) = body.get("@odata.type").and_then(Value::as_str) {
                if odata_type.to_ascii_lowercase().contains(&wanted) {
                    debug!("selected {odata_type} at {path}");
                    return Ok(());
                }
            }
        }
        Err(SessionError::InstanceNotFound(type_name.to_string()))
    }

    async fn logout(&self, session: &Session) -> Result<(), SessionError> {
        let Some(location) = session.session_location.as_deref() else {
            return Ok(());
        };
        let client = self.cached_client().await?;
        let url = if location.starts_with("http") {
            location.to_string()
        } else {
            format!("{}{}", session.base_url, location)
        };
        let mut delete = client.delete(url);
        if let Some(key) = &session.session_key {
            delete = delete.header(X_AUTH_TOKEN, key);
        }
        let response = delete.send().await.map_err(connect_error)?;
        if !response.status().is_success() {
            return Err(SessionError::Protocol(format!(
                "session delete returned {}",
                response.status()
            )));
        }
        debug!("session at {location} torn down");
        Ok(())
    }
}

impl RedfishClient {
    async fn cached_client(&self) -> Result<Client, SessionError> {
        if let Some(client) = self.http.lock().await.clone() {
            return Ok(client);
        }
        Client::builder()
            .timeout(LOGIN_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| SessionError::Protocol(err.to_string()))
    }
}

async fn build_client(request: &LoginRequest) -> Result<Client, SessionError> {
    let certs = &request.certs;
    let mut builder = Client::builder().timeout(LOGIN_TIMEOUT);

    // Controllers ship self-signed certificates out of the box; only an
    // explicit CA bundle turns verification on.
    if let Some(path) = certs.ca_certs.as_deref() {
        let pem = read_file(path).await?;
        let ca = Certificate::from_pem(&pem)
            .map_err(|err| SessionError::Protocol(format!("invalid CA bundle {path}: {err}")))?;
        builder = builder.add_root_certificate(ca);
    } else {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(cert_path) = certs.cert_file.as_deref() {
        let cert = read_file(cert_path).await?;
        let identity = match (certs.key_file.as_deref(), certs.key_password.as_deref()) {
            (Some(key_path), _) => {
                let mut pem = cert;
                pem.extend_from_slice(&read_file(key_path).await?);
                Identity::from_pem(&pem)
            }
            (None, Some(password)) => Identity::from_pkcs12_der(&cert, password),
            (None, None) => Identity::from_pem(&cert),
        }
        .map_err(|err| {
            SessionError::Protocol(format!("invalid client certificate {cert_path}: {err}"))
        })?;
        builder = builder.identity(identity);
    }

    if let Some(proxy) = request.proxy.as_deref() {
        let proxy = Proxy::all(proxy)
            .map_err(|err| SessionError::Protocol(format!("invalid proxy {proxy}: {err}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|err| SessionError::Protocol(err.to_string()))
}

async fn discover(
    client: &Client,
    session: &Session,
    request: &LoginRequest,
) -> Result<Vec<String>, SessionError> {
    let path = request
        .path
        .as_deref()
        .unwrap_or_else(|| service_root(request.is_redfish));
    let mut get = client.get(format!("{}{}", session.base_url, path));
    if let Some(key) = &session.session_key {
        get = get.header(X_AUTH_TOKEN, key);
    }

    let response = get.send().await.map_err(connect_error)?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        debug!("requested path {path} was not found during discovery");
        return Ok(Vec::new());
    }
    if !status.is_success() {
        return Err(SessionError::Protocol(format!(
            "discovery of {path} returned {status}"
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|err| SessionError::Protocol(format!("discovery of {path} failed: {err}")))?;

    let mut paths = vec![path.to_string()];
    paths.extend(collect_odata_ids(&body));
    if !request.include_logs {
        paths.retain(|entry| !entry.contains("LogServices"));
    }
    Ok(paths)
}

fn collect_odata_ids(body: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    if let Value::Object(map) = body {
        for entry in map.values() {
            if let Value::Object(link) = entry {
                if let Some(id) = link.get("@odata.id").and_then(Value::as_str) {
                    paths.push(id.to_string());
                }
            }
        }
    }
    paths
}

fn service_root(is_redfish: bool) -> &'static str {
    if is_redfish {
        "/redfish/v1/"
    } else {
        "/rest/v1"
    }
}

fn sessions_path(is_redfish: bool) -> &'static str {
    if is_redfish {
        "/redfish/v1/SessionService/Sessions/"
    } else {
        "/rest/v1/Sessions"
    }
}

/// The local in-process transport is served over the loopback interface.
fn rewrite_local(url: &str) -> String {
    if url == target::LOCAL_URL {
        "https://127.0.0.1".to_string()
    } else {
        url.to_string()
    }
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn read_file(path: &str) -> Result<Vec<u8>, SessionError> {
    fs::read(path)
        .await
        .map_err(|err| SessionError::Protocol(format!("failed to read {path}: {err}")))
}

fn connect_error(err: reqwest::Error) -> SessionError {
    if err.is_connect() || err.is_timeout() {
        SessionError::Unreachable(err.to_string())
    } else {
        SessionError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_odata_ids() {
        let body = json!({
            "@odata.id": "/redfish/v1/",
            "Systems": {"@odata.id": "/redfish/v1/Systems"},
            "Managers": {"@odata.id": "/redfish/v1/Managers"},
            "RedfishVersion": "1.6.0",
        });
        let mut paths = collect_odata_ids(&body);
        paths.sort();
        assert_eq!(paths, vec!["/redfish/v1/Managers", "/redfish/v1/Systems"]);
    }

    #[test]
    fn test_collect_odata_ids_ignores_non_objects() {
        assert!(collect_odata_ids(&json!(["a", "b"])).is_empty());
        assert!(collect_odata_ids(&json!("plain")).is_empty());
    }

    #[test]
    fn test_rewrite_local() {
        assert_eq!(rewrite_local(target::LOCAL_URL), "https://127.0.0.1");
        assert_eq!(rewrite_local("https://10.0.0.5"), "https://10.0.0.5");
    }

    #[test]
    fn test_service_paths_per_mode() {
        assert_eq!(service_root(true), "/redfish/v1/");
        assert_eq!(service_root(false), "/rest/v1");
        assert!(sessions_path(true).contains("SessionService"));
        assert!(!sessions_path(false).contains("SessionService"));
    }
}
