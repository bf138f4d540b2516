//! Top-level navigation probe.
//!
//! Issues one `GET` for the kiosk URL and reports the outcome as render
//! surface events: `PageStarted`, then either `PageFinished` or a main-frame
//! `LoadError`. Certificate failures are handed to the controller and the
//! request is repeated without verification if it trusts them.

use crate::app::event::{AppEvent, AttemptId};
use crate::error::ProbeError;
use crate::surface::policy::{CertDecision, CertReply, CertificateIssue};
use crate::surface::tls;
use reqwest::header::ACCEPT;
use reqwest::redirect;
use rustls::ClientConfig;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub ca_bundle: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: u16,
    pub reason: String,
}

/// Run one navigation and report it. Never returns an error; every outcome
/// becomes an event.
pub async fn navigate(
    attempt: AttemptId,
    url: String,
    settings: Arc<ProbeSettings>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
) {
    let _ = event_tx.send(AppEvent::PageStarted {
        attempt,
        url: url.clone(),
    });

    let event = match load(attempt, &url, &settings, &event_tx).await {
        Ok(report) => {
            tracing::debug!(attempt, status = report.status, "probe ok");
            AppEvent::PageFinished {
                attempt,
                url,
                status: Some(report.status),
            }
        }
        Err(e) => AppEvent::LoadError {
            attempt,
            description: e.to_string(),
            main_frame: true,
        },
    };
    let _ = event_tx.send(event);
}

/// Parse a kiosk URL. A URL typed without a scheme is treated as http.
pub fn parse_url(raw: &str) -> Result<Url, ProbeError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let url = Url::parse(&candidate).map_err(|source| ProbeError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::UnsupportedScheme(other.to_string())),
    }
}

async fn load(
    attempt: AttemptId,
    raw: &str,
    settings: &ProbeSettings,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Result<ProbeReport, ProbeError> {
    let url = parse_url(raw)?;
    let verifying = tls::verifying_config(&settings.ca_bundle)?;
    match fetch(&url, verifying, settings).await {
        Err(ProbeError::Certificate(reason)) => {
            let (reply, decision) = CertReply::channel();
            let _ = event_tx.send(AppEvent::CertificateError {
                attempt,
                issue: CertificateIssue {
                    url: raw.to_string(),
                    reason: reason.clone(),
                },
                reply,
            });
            match decision.await {
                Ok(CertDecision::Trust) => fetch(&url, tls::trusting_config()?, settings).await,
                _ => Err(ProbeError::CertificateRejected(reason)),
            }
        }
        other => other,
    }
}

/// One request, status only. Redirects are reported as they are, not
/// followed.
pub async fn fetch(
    url: &Url,
    tls_config: ClientConfig,
    settings: &ProbeSettings,
) -> Result<ProbeReport, ProbeError> {
    let client = reqwest::Client::builder()
        .use_preconfigured_tls(tls_config)
        .redirect(redirect::Policy::none())
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.as_str())
        .build()?;

    let response = client
        .get(url.clone())
        .header(ACCEPT, "text/html,*/*")
        .send()
        .await
        .map_err(|e| classify(url, settings, e))?;

    let status = response.status();
    let report = ProbeReport {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    };
    if report.status >= 400 {
        return Err(ProbeError::Http {
            code: report.status,
            reason: report.reason,
        });
    }
    Ok(report)
}

fn classify(url: &Url, settings: &ProbeSettings, err: reqwest::Error) -> ProbeError {
    if let Some(reason) = tls::certificate_failure(&err) {
        return ProbeError::Certificate(reason);
    }
    if err.is_timeout() {
        return ProbeError::Timeout(settings.timeout.as_millis() as u64);
    }
    if let Some(tls_err) = tls::rustls_error(&err) {
        return ProbeError::Tls(tls_err.to_string());
    }
    if err.is_connect() {
        return ProbeError::Connect {
            addr: format!(
                "{}:{}",
                url.host_str().unwrap_or_default(),
                url.port_or_known_default().unwrap_or_default()
            ),
            reason: root_cause(&err),
        };
    }
    ProbeError::Request(err)
}

fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut cause = err;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Host;

    fn settings() -> Arc<ProbeSettings> {
        Arc::new(ProbeSettings {
            timeout: Duration::from_secs(5),
            user_agent: "test KioskBrowser/1.0".into(),
            ca_bundle: PathBuf::from("/nonexistent/ca.pem"),
        })
    }

    /// Answers one connection on `path` with `response` and returns the
    /// request text.
    async fn serve_once(
        path: &str,
        response: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            sock.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{}{}", addr, path), handle)
    }

    async fn run(url: String) -> Vec<AppEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        navigate(9, url, settings(), tx).await;
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[test]
    fn test_parse_home_assistant_default() {
        let url = parse_url("http://homeassistant.local:8123").unwrap();
        assert_eq!(url.host_str(), Some("homeassistant.local"));
        assert_eq!(url.port(), Some(8123));
        assert_eq!(url.path(), "/");

        let bare = parse_url("  wall-display.lan ").unwrap();
        assert_eq!(bare.scheme(), "http");
        assert_eq!(bare.port_or_known_default(), Some(80));

        let secure = parse_url("HTTPS://user:pw@panel.lan/lovelace/0?kiosk#top").unwrap();
        assert_eq!(secure.scheme(), "https");
        assert_eq!(secure.host_str(), Some("panel.lan"));
        assert_eq!(secure.port_or_known_default(), Some(443));
    }

    #[test]
    fn test_parse_encodes_space_and_non_ascii() {
        let url = parse_url("http://panel.lan/lovelace/wohn zimmer/küche?k=ü").unwrap();
        assert_eq!(url.path(), "/lovelace/wohn%20zimmer/k%C3%BCche");
        assert_eq!(url.query(), Some("k=%C3%BC"));
    }

    #[test]
    fn test_parse_ipv6_hosts() {
        let url = parse_url("http://[fd00::2]:8080/x").unwrap();
        assert!(matches!(url.host(), Some(Host::Ipv6(ip)) if ip.to_string() == "fd00::2"));
        assert_eq!(url.port(), Some(8080));

        // Without brackets the colons cannot be told apart from a port.
        assert!(matches!(
            parse_url("http://fd00::2/"),
            Err(ProbeError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_url("ftp://files.lan"),
            Err(ProbeError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            parse_url("http://:8123"),
            Err(ProbeError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_url("http://host:99999"),
            Err(ProbeError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_ok_page_reports_started_then_finished() {
        let (url, server) =
            serve_once("/lovelace/0", "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
        let events = run(url.clone()).await;

        assert!(matches!(&events[0], AppEvent::PageStarted { attempt: 9, url: u } if *u == url));
        assert!(matches!(
            &events[1],
            AppEvent::PageFinished { attempt: 9, status: Some(200), .. }
        ));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /lovelace/0 HTTP/1.1\r\n"));
        assert!(request.contains("KioskBrowser/1.0"));
    }

    #[tokio::test]
    async fn test_space_and_non_ascii_path_is_sent_encoded() {
        let (url, server) = serve_once(
            "/lovelace/wohn zimmer?k=ü",
            "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        )
        .await;
        let events = run(url).await;

        assert!(matches!(
            &events[1],
            AppEvent::PageFinished { status: Some(200), .. }
        ));
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /lovelace/wohn%20zimmer?k=%C3%BC HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_redirect_counts_as_finished() {
        let (url, _server) = serve_once(
            "/",
            "HTTP/1.1 302 Found\r\nLocation: http://127.0.0.1:1/\r\nContent-Length: 0\r\n\r\n",
        )
        .await;
        let events = run(url).await;
        assert!(matches!(
            &events[1],
            AppEvent::PageFinished { status: Some(302), .. }
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_main_frame_error() {
        let (url, _server) = serve_once(
            "/",
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n",
        )
        .await;
        let events = run(url).await;
        assert!(matches!(
            &events[1],
            AppEvent::LoadError { attempt: 9, description, main_frame: true }
                if description == "HTTP 503 Service Unavailable"
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_is_load_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let events = run(format!("http://{}", addr)).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            AppEvent::LoadError { main_frame: true, description, .. }
                if description.starts_with("Could not connect")
        ));
    }

    #[tokio::test]
    async fn test_bad_url_is_load_error() {
        let events = run("gopher://old.lan".into()).await;
        assert!(matches!(
            &events[1],
            AppEvent::LoadError { description, .. } if description.contains("gopher")
        ));
    }
}
