use serde::Deserialize;
use serde_json::{Value, json};

use crate::clean::{AnonymizationConfig, ViewMode, render, split_message};
use crate::domain::email::{Credentials, FetchRange};
use crate::export::{analysis_filename, bodies_filename, export_bodies, export_messages, now_millis};
use crate::mail::MailSource;
use crate::mail::decoders::{extract_body_text, header_field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Options,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: Value::Null,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FetchRequest {
    #[serde(flatten)]
    creds: Credentials,
    #[serde(rename = "box", default = "default_mailbox")]
    mailbox: String,
    #[serde(default)]
    range: Option<Value>,
    #[serde(default)]
    start: Option<Value>,
    #[serde(default)]
    end: Option<Value>,
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

impl FetchRequest {
    /// Explicit `start`/`end` bounds win. Otherwise the dashboard sends either
    /// a sequence string or a bare count.
    fn range(&self) -> FetchRange {
        let start = bound_text(self.start.as_ref());
        let end = bound_text(self.end.as_ref());
        if let Some(range) = FetchRange::from_bounds(start.as_deref(), end.as_deref()) {
            return range;
        }
        match &self.range {
            Some(Value::String(s)) if !s.trim().is_empty() => FetchRange::parse(s),
            Some(Value::Number(n)) => FetchRange::parse(&n.to_string()),
            _ => FetchRange::default(),
        }
    }
}

fn bound_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct CleanRequest {
    raw: String,
    #[serde(default)]
    mode: Option<ViewMode>,
    #[serde(default)]
    options: Option<AnonymizationConfig>,
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    messages: Vec<String>,
    #[serde(default)]
    mode: Option<ViewMode>,
    #[serde(default)]
    options: Option<AnonymizationConfig>,
    #[serde(rename = "box", default = "default_mailbox")]
    mailbox: String,
    /// Export only the body text of each message.
    #[serde(default)]
    bodies: bool,
}

pub struct Router<'a> {
    pub source: &'a dyn MailSource,
    pub defaults: &'a AnonymizationConfig,
}

impl Router<'_> {
    pub fn handle(&self, method: Method, path: &str, body: &str) -> ApiResponse {
        match (method, path.trim_end_matches('/')) {
            (Method::Options, _) => ApiResponse::no_content(),
            (Method::Get, "/api/health") => {
                ApiResponse::ok(json!({ "status": "ok", "time": now_millis() as u64 }))
            }
            (Method::Post, "/api/connect") => self.connect(body),
            (Method::Post, "/api/get-boxes") => self.get_boxes(body),
            (Method::Post, "/api/fetch-headers") => self.fetch_headers(body),
            (Method::Post, "/api/clean") => self.clean(body),
            (Method::Post, "/api/export") => self.export(body),
            _ => ApiResponse::status(404, json!({ "error": format!("no route for {path}") })),
        }
    }

    fn connect(&self, body: &str) -> ApiResponse {
        let creds: Credentials = match parse_body(body) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        if !creds.is_complete() {
            return ApiResponse::status(400, json!({ "error": "Email and password are required" }));
        }
        match self.source.verify(&creds) {
            Ok(()) => ApiResponse::ok(json!({
                "status": "success",
                "message": "Connected successfully",
            })),
            Err(e) => {
                log::error!("connection failed: {e:#}");
                ApiResponse::status(
                    401,
                    json!({
                        "status": "error",
                        "message": "Authentication failed. Check credentials.",
                        "details": format!("{e:#}"),
                    }),
                )
            }
        }
    }

    fn get_boxes(&self, body: &str) -> ApiResponse {
        let creds: Credentials = match parse_body(body) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        if !creds.is_complete() {
            return ApiResponse::status(400, json!({ "error": "Missing credentials" }));
        }
        match self.source.list_folders(&creds) {
            Ok(boxes) => ApiResponse::ok(json!({ "status": "success", "boxes": boxes })),
            Err(e) => {
                log::error!("listing mailboxes failed: {e:#}");
                ApiResponse::status(500, json!({ "error": format!("{e:#}") }))
            }
        }
    }

    fn fetch_headers(&self, body: &str) -> ApiResponse {
        let req: FetchRequest = match parse_body(body) {
            Ok(r) => r,
            Err(resp) => return resp,
        };
        if !req.creds.is_complete() {
            return ApiResponse::status(400, json!({ "error": "Email and password are required" }));
        }
        let range = req.range();
        match self.source.fetch(&req.creds, &req.mailbox, &range) {
            Ok(messages) => ApiResponse::ok(json!({ "status": "success", "data": messages })),
            Err(e) => {
                log::error!("fetch failed: {e:#}");
                ApiResponse::status(
                    500,
                    json!({
                        "status": "error",
                        "message": "Failed to fetch messages",
                        "details": format!("{e:#}"),
                    }),
                )
            }
        }
    }

    fn clean(&self, body: &str) -> ApiResponse {
        let req: CleanRequest = match parse_body(body) {
            Ok(r) => r,
            Err(resp) => return resp,
        };
        let cfg = req.options.as_ref().unwrap_or(self.defaults);
        let mode = req.mode.unwrap_or(ViewMode::Cleaned);
        let (header, _) = split_message(&req.raw);
        ApiResponse::ok(json!({
            "status": "success",
            "content": render(&req.raw, mode, cfg),
            "from": header_field(header, "From").unwrap_or_default(),
            "subject": header_field(header, "Subject").unwrap_or_default(),
        }))
    }

    fn export(&self, body: &str) -> ApiResponse {
        let req: ExportRequest = match parse_body(body) {
            Ok(r) => r,
            Err(resp) => return resp,
        };
        if req.messages.is_empty() {
            return ApiResponse::status(400, json!({ "error": "No emails to export" }));
        }
        let millis = now_millis();
        let (content, filename) = if req.bodies {
            let texts: Vec<String> = req
                .messages
                .iter()
                .map(|raw| extract_body_text(raw.as_bytes()))
                .collect();
            (
                export_bodies(texts.iter().map(String::as_str)),
                bodies_filename(millis),
            )
        } else {
            let cfg = req.options.as_ref().unwrap_or(self.defaults);
            let mode = req.mode.unwrap_or(ViewMode::Cleaned);
            (
                export_messages(req.messages.iter().map(String::as_str), mode, cfg),
                analysis_filename(&req.mailbox, millis),
            )
        };
        ApiResponse::ok(json!({
            "status": "success",
            "count": req.messages.len(),
            "content": content,
            "filename": filename,
        }))
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiResponse> {
    serde_json::from_str(body).map_err(|e| {
        log::warn!("rejected request body: {e}");
        ApiResponse::status(400, json!({ "error": format!("Invalid JSON body: {e}") }))
    })
}
