//! JSON API consumed by the dashboard front end.

pub mod routes;

use anyhow::{Result, anyhow};
use log::{info, warn};
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};
use url::Url;

use crate::clean::AnonymizationConfig;
use crate::mail::MailSource;

pub use routes::{ApiResponse, Method, Router};

const POLL: Duration = Duration::from_millis(500);

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Serve requests one at a time until Ctrl-C.
pub fn run_server(bind: &str, source: &dyn MailSource, defaults: &AnonymizationConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    let server = Server::http(bind).map_err(|e| anyhow!("cannot bind {bind}: {e}"))?;
    info!("server running on http://{bind}");

    let router = Router { source, defaults };

    while running.load(Ordering::SeqCst) {
        let Ok(maybe_request) = server.recv_timeout(POLL) else {
            continue;
        };
        if let Some(request) = maybe_request {
            if let Err(e) = serve_one(&router, request) {
                warn!("failed to answer request: {e}");
            }
        }
    }

    info!("shutting down");
    Ok(())
}

fn serve_one(router: &Router<'_>, mut request: Request) -> Result<()> {
    info!("{} {}", request.method(), request.url());

    let method = match request.method() {
        tiny_http::Method::Get => Method::Get,
        tiny_http::Method::Post => Method::Post,
        tiny_http::Method::Options => Method::Options,
        _ => Method::Other,
    };

    let url = format!("http://localhost{}", request.url());
    let path = Url::parse(&url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| request.url().to_string());

    let mut body = String::new();
    if method == Method::Post {
        request.as_reader().read_to_string(&mut body)?;
    }

    let resp = router.handle(method, &path, &body);
    request.respond(to_http(resp)?)?;
    Ok(())
}

fn to_http(resp: ApiResponse) -> Result<Response<std::io::Cursor<Vec<u8>>>> {
    let payload = if resp.body.is_null() {
        String::new()
    } else {
        serde_json::to_string(&resp.body)?
    };

    let mut out = Response::from_data(payload.into_bytes()).with_status_code(resp.status);
    let mut headers = vec![("Content-Type", "application/json")];
    headers.extend(CORS_HEADERS);
    for (name, value) in headers {
        let header = Header::from_bytes(name.as_bytes(), value.as_bytes())
            .map_err(|_| anyhow!("invalid header {name}"))?;
        out.add_header(header);
    }
    Ok(out)
}
