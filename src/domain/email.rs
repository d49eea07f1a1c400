use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type EmailId = u32;

/// Header values keyed by lowercase field name, in order of appearance.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

pub const DEFAULT_LATEST: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedMessage {
    pub id: EmailId,
    pub seq: u32,
    pub headers: HeaderMap,
    pub raw: String,
    pub body_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.trim().is_empty()
    }
}

/// Which messages of a mailbox to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRange {
    /// An IMAP sequence set such as `1:*` or `100:150`.
    Sequence(String),
    /// The newest N messages, newest first.
    Latest(u32),
}

impl FetchRange {
    /// Anything containing `:` is a sequence set, anything else a count.
    /// Counts that are not positive numbers fall back to [`DEFAULT_LATEST`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.contains(':') {
            return FetchRange::Sequence(s.to_string());
        }
        let n = s
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_LATEST);
        FetchRange::Latest(n)
    }

    /// Build a sequence set from optional bounds, defaulting to `1` and `*`.
    /// `None` when neither bound is given.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        fn pick(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }
        let (start, end) = (pick(start), pick(end));
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(FetchRange::Sequence(format!(
            "{}:{}",
            start.unwrap_or("1"),
            end.unwrap_or("*")
        )))
    }
}

impl Default for FetchRange {
    fn default() -> Self {
        FetchRange::Sequence("1:*".to_string())
    }
}

/// What the dashboard list shows for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub id: EmailId,
    pub sender: String,
    pub subject: String,
    pub day_month: String,
}

impl MessageSummary {
    pub fn from_message(msg: &FetchedMessage) -> Self {
        let first = |name: &str| {
            msg.headers
                .get(name)
                .and_then(|v| v.first())
                .map(String::as_str)
        };

        let sender = first("from")
            .map(|from| {
                from.split('<')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .trim_matches('"')
                    .to_string()
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "System".to_string());

        let subject = first("subject")
            .map(str::to_string)
            .unwrap_or_else(|| "(No Subject)".to_string());

        let day_month = first("date")
            .map(|d| d.split(' ').skip(1).take(2).collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        Self {
            id: msg.id,
            sender,
            subject,
            day_month,
        }
    }
}
