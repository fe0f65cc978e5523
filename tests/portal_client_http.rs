//! PortalClient against a local HTTP listener: request shape and status mapping.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vdab_job_archiver_lib::domain::{ApplicationId, PageContext, SessionIdentifier};
use vdab_job_archiver_lib::infrastructure::{PortalApi, PortalClient, PortalConfig, PortalError};

/// Serves one canned response per connection and keeps every raw request.
struct CannedServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                seen.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        Self { base, requests }
    }

    fn config(&self) -> PortalConfig {
        PortalConfig {
            list_endpoint: format!("{}/rest/vindeenjob/v4/sollicitaties/page", self.base),
            archive_endpoint: format!("{}/api/vindeenjob/prive/sollicitaties", self.base),
            probe_endpoint: format!("{}/rest/vindeenjob/v4/bewaardeVacatures", self.base),
            ..PortalConfig::default()
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Head plus however much of the body `content-length` announces.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let line = line.to_ascii_lowercase();
                    line.strip_prefix("content-length:").map(|v| v.trim().to_string())
                })
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= head_end + 4 + length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&raw).to_string()
}

fn session_page() -> PageContext {
    PageContext::new("https://www.vdab.be/vindeenjob".parse().unwrap())
        .with_cookie_header("XSRF-TOKEN=tok-42; JSESSIONID=s1")
}

fn id() -> SessionIdentifier {
    SessionIdentifier::parse("12345678").unwrap()
}

#[tokio::test]
async fn list_request_carries_session_headers() {
    let body = r#"{"aantalPaginas":2,"results":[{"id":7}]}"#;
    let server = CannedServer::start(vec![(200, body)]).await;
    let client = PortalClient::with_config(server.config()).unwrap();

    let page = client.fetch_applications_page(&id(), 1, &session_page()).await.unwrap();

    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.results.len(), 1);
    let request = &server.requests()[0];
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with(
        "GET /rest/vindeenjob/v4/sollicitaties/page?actief=true&werkzoekendeRol=KLANT&pageNumber=1&listSize=150&werkzoekendeId=12345678&pageSize=150 "
    ));
    assert!(lower.contains("cookie: xsrf-token=tok-42; jsessionid=s1"));
    assert!(lower.contains("vej-key-monitor: b277002f-e1fa-4fc5-868a-fdab633c3851"));
    assert!(!lower.contains("x-xsrf-token"));
}

#[tokio::test]
async fn archive_request_is_a_put_with_token_and_id_body() {
    let server = CannedServer::start(vec![(200, "")]).await;
    let client = PortalClient::with_config(server.config()).unwrap();

    client
        .archive_application(&ApplicationId::new("4711"), &session_page())
        .await
        .unwrap();

    let request = &server.requests()[0];
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("PUT /api/vindeenjob/prive/sollicitaties/4711/archiveer "));
    assert!(lower.contains("x-xsrf-token: tok-42"));
    assert!(lower.contains("content-type: application/json"));
    assert!(request.ends_with("\r\n\r\n4711"));
}

#[tokio::test]
async fn status_codes_map_to_portal_errors() {
    let server = CannedServer::start(vec![(401, "{}"), (500, "{}"), (403, "{}")]).await;
    let client = PortalClient::with_config(server.config()).unwrap();
    let page = session_page();

    assert_eq!(
        client.fetch_applications_page(&id(), 0, &page).await.unwrap_err(),
        PortalError::Authentication { status: 401 }
    );
    assert_eq!(
        client.fetch_applications_page(&id(), 0, &page).await.unwrap_err(),
        PortalError::Http { status: 500 }
    );
    let probe = client.probe_identifier(&id(), &page).await.unwrap_err();
    assert_eq!(
        probe.to_string(),
        "Authentication error (403). Please refresh the page and try again."
    );
}
