//! HTTP adapter: `AnalysisBackend` over reqwest's blocking client.
//!
//! One POST per submission, no retries. The UI runs this on a worker thread,
//! so blocking here never stalls rendering.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::AppConfig;
use crate::domain::{AnalysisRequest, AnalysisResponse, MalformedResponse};
use crate::ports::{AnalysisBackend, BackendError, BackendHealth, CancelToken};

/// Upper bound for the liveness probe, independent of the analysis timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpAnalysisBackend {
    http: Client,
    base_url: String,
    analyze_url: String,
    health_url: String,
    timeout: Duration,
}

impl HttpAnalysisBackend {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    /// Returns `BackendError::Network` if the TLS backend cannot be initialized.
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("symptom-assist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(classify)?;

        Ok(Self {
            http,
            base_url: config.backend_url.clone(),
            analyze_url: config.analyze_url(),
            health_url: config.health_url(),
            timeout: config.request_timeout,
        })
    }
}

fn classify(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(err.to_string())
    }
}

impl AnalysisBackend for HttpAnalysisBackend {
    fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse, BackendError> {
        cancel.check()?;

        let timeout = cancel.effective_timeout(self.timeout);
        if timeout.is_zero() {
            return Err(BackendError::Timeout);
        }

        let response = self
            .http
            .post(&self.analyze_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .json(request)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(classify)?;

        // The request cannot be aborted mid-flight; a cancel that landed while
        // waiting still discards the result.
        cancel.check()?;

        Ok(AnalysisResponse::from_json(&body)?)
    }

    fn health(&self) -> Result<BackendHealth, BackendError> {
        let response = self
            .http
            .get(&self.health_url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout.min(HEALTH_TIMEOUT))
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(classify)?;
        serde_json::from_str(&body).map_err(|e| BackendError::Malformed(MalformedResponse::Json(e)))
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::fixtures::FULL_RESPONSE;
    use crate::domain::SymptomForm;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    struct Captured {
        head: String,
        body: String,
    }

    /// Serve exactly one canned HTTP response on a loopback port.
    fn serve_once(status_line: &str, body: &str) -> (AppConfig, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let header_end = loop {
                let n = stream.read(&mut chunk).expect("read");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break buf.len();
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = stream.read(&mut chunk).expect("read body");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
            let _ = tx.send(Captured { head, body });
            stream.write_all(reply.as_bytes()).expect("write reply");
        });

        let config = AppConfig::for_backend(&format!("http://127.0.0.1:{port}")).expect("config");
        (config, rx)
    }

    fn request() -> AnalysisRequest {
        SymptomForm {
            symptom: "headache".to_string(),
            ..Default::default()
        }
        .build_request()
        .expect("valid")
    }

    #[test]
    fn test_posts_json_to_analyze_path() {
        let (config, rx) = serve_once("200 OK", FULL_RESPONSE);
        let backend = HttpAnalysisBackend::new(&config).expect("client");

        let response = backend
            .analyze(&request(), &CancelToken::new())
            .expect("success");
        assert_eq!(response.possible_causes.len(), 2);

        let captured = rx.recv().expect("request captured");
        assert!(captured.head.starts_with("POST /api/analyze-symptom HTTP/1.1"));
        assert!(captured
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        assert_eq!(
            captured.body,
            r#"{"symptom":"headache","duration":"","severity":"","additional_info":""}"#
        );
    }

    #[test]
    fn test_non_success_status_fails_regardless_of_body() {
        for status in ["500 Internal Server Error", "404 Not Found", "302 Found"] {
            let (config, _rx) = serve_once(status, FULL_RESPONSE);
            let backend = HttpAnalysisBackend::new(&config).expect("client");
            let err = backend
                .analyze(&request(), &CancelToken::new())
                .expect_err("must fail");
            assert!(matches!(err, BackendError::Status { .. }), "{status}: {err:?}");
        }
    }

    #[test]
    fn test_unparseable_body_is_malformed() {
        let (config, _rx) = serve_once("200 OK", "<html>gateway</html>");
        let backend = HttpAnalysisBackend::new(&config).expect("client");
        let err = backend
            .analyze(&request(), &CancelToken::new())
            .expect_err("must fail");
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn test_cancelled_token_never_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let config = AppConfig::for_backend(&format!("http://127.0.0.1:{port}")).expect("config");
        let backend = HttpAnalysisBackend::new(&config).expect("client");

        let token = CancelToken::new();
        token.cancel();
        let err = backend.analyze(&request(), &token).expect_err("cancelled");
        assert!(matches!(err, BackendError::Cancelled));

        listener.set_nonblocking(true).expect("nonblocking");
        assert!(listener.accept().is_err(), "no connection should be made");
    }

    #[test]
    fn test_unreachable_backend_is_network_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let config = AppConfig::for_backend(&format!("http://127.0.0.1:{port}")).expect("config");
        let backend = HttpAnalysisBackend::new(&config).expect("client");
        let err = backend
            .analyze(&request(), &CancelToken::new())
            .expect_err("refused");
        assert!(matches!(err, BackendError::Network(_) | BackendError::Timeout));
    }

    #[test]
    fn test_health_probe() {
        let (config, rx) = serve_once(
            "200 OK",
            r#"{"status":"healthy","service":"AI Health Assistant","ai_enhanced":true}"#,
        );
        let backend = HttpAnalysisBackend::new(&config).expect("client");
        let health = backend.health().expect("healthy");
        assert!(health.is_healthy());
        assert!(health.ai_enhanced);
        assert!(rx
            .recv()
            .expect("captured")
            .head
            .starts_with("GET /api/health HTTP/1.1"));
    }
}
