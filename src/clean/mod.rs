//! Anonymizing raw messages before they are shared.

pub mod body;
pub mod header;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

pub use body::{split_message, trim_quoted_tail};
pub use header::{FieldKind, anonymize, classify};

pub const DEFAULT_MESSAGE_ID_TAG: &str = "[EID]";

/// Options for one cleaning pass. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnonymizationConfig {
    /// Replacement sender domain; empty strips it.
    pub domain: String,
    #[serde(alias = "message_id_tag")]
    pub message_id_tag: String,
    #[serde(alias = "replace_date")]
    pub replace_date: bool,
    #[serde(alias = "replace_to")]
    pub replace_to: bool,
    #[serde(alias = "keep_received")]
    pub keep_received: bool,
    #[serde(alias = "keep_reply_to")]
    pub keep_reply_to: bool,
    #[serde(alias = "add_cc")]
    pub add_cc: bool,
    #[serde(alias = "remove_body")]
    pub remove_body: bool,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            message_id_tag: DEFAULT_MESSAGE_ID_TAG.to_string(),
            replace_date: false,
            replace_to: false,
            keep_received: false,
            keep_reply_to: false,
            add_cc: false,
            remove_body: false,
        }
    }
}

impl AnonymizationConfig {
    pub fn domain(&self) -> &str {
        self.domain.trim()
    }

    /// The Message-ID tag, falling back to the default when left empty.
    pub fn id_tag(&self) -> &str {
        if self.message_id_tag.is_empty() {
            DEFAULT_MESSAGE_ID_TAG
        } else {
            &self.message_id_tag
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Raw,
    Cleaned,
}

/// Anonymized header followed by the body cut at its first quote marker,
/// or the header alone when `remove_body` is set.
pub fn clean_message(raw: &str, cfg: &AnonymizationConfig) -> String {
    let (header, body) = split_message(raw);
    let mut out = anonymize(header, cfg);
    if !cfg.remove_body {
        out.push_str(trim_quoted_tail(body));
    }
    out
}

pub fn render<'a>(raw: &'a str, mode: ViewMode, cfg: &AnonymizationConfig) -> Cow<'a, str> {
    match mode {
        ViewMode::Raw => Cow::Borrowed(raw),
        ViewMode::Cleaned => Cow::Owned(clean_message(raw, cfg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "Received: by mx\r\n\tfrom relay\r\nFrom: Jane <jane@example.com>\r\nSubject: Hello\r\nMessage-ID: <m1@example.com>\r\n\r\nHi there\r\n-----Original Message-----\r\nold stuff";

    #[test]
    fn clean_message_joins_header_and_trimmed_body() {
        let out = clean_message(RAW, &AnonymizationConfig::default());
        assert_eq!(
            out,
            "From: Jane jane\nSubject: Hello\nMessage-ID: <m1[EID]@example.com>\n\r\n\r\nHi there\r\n"
        );
    }

    #[test]
    fn remove_body_keeps_header_only() {
        let cfg = AnonymizationConfig {
            remove_body: true,
            ..Default::default()
        };
        let out = clean_message(RAW, &cfg);
        assert!(out.ends_with("Message-ID: <m1[EID]@example.com>\n"));
        assert!(!out.contains("Hi there"));
    }

    #[test]
    fn raw_mode_is_identity() {
        let out = render(RAW, ViewMode::Raw, &AnonymizationConfig::default());
        assert_eq!(out, RAW);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let cfg: AnonymizationConfig =
            serde_json::from_str(r#"{"domain":"corp.test","addCc":true}"#).unwrap();
        assert_eq!(cfg.domain(), "corp.test");
        assert!(cfg.add_cc);
        assert_eq!(cfg.id_tag(), "[EID]");
        assert!(!cfg.keep_received);

        let snake: AnonymizationConfig =
            serde_json::from_str(r#"{"keep_received":true,"message_id_tag":""}"#).unwrap();
        assert!(snake.keep_received);
        assert_eq!(snake.id_tag(), DEFAULT_MESSAGE_ID_TAG);
    }

    #[test]
    fn view_mode_names() {
        let mode: ViewMode = serde_json::from_str(r#""cleaned""#).unwrap();
        assert_eq!(mode, ViewMode::Cleaned);
    }
}
