use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use super::AnonymizationConfig;

pub const SYNTHETIC_CC: &str = "Cc: [*to]";
pub const DATE_PLACEHOLDER: &str = "Date: [DATE]";
pub const TO_PLACEHOLDER: &str = "To: [*to]";

/// Bucket a primary header line falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    HardDrop,
    From,
    To,
    Date,
    MessageId,
    Received,
    ReplyTo,
    Cc,
    PassThrough,
}

// Checked top to bottom, first match wins. `received-spf` has to stay above
// `received:` and every trace prefix above the addressing fields.
const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("received-spf", FieldKind::HardDrop),
    ("arc-", FieldKind::HardDrop),
    ("dkim-", FieldKind::HardDrop),
    ("spf-", FieldKind::HardDrop),
    ("authentication-results", FieldKind::HardDrop),
    ("delivered-to", FieldKind::HardDrop),
    ("return-path", FieldKind::HardDrop),
    ("x-", FieldKind::HardDrop),
    ("from:", FieldKind::From),
    ("to:", FieldKind::To),
    ("date:", FieldKind::Date),
    ("message-id:", FieldKind::MessageId),
    ("received:", FieldKind::Received),
    ("reply-to:", FieldKind::ReplyTo),
    ("cc:", FieldKind::Cc),
];

/// Classify a primary header line by case-insensitive name prefix.
pub fn classify(line: &str) -> FieldKind {
    FIELD_TABLE
        .iter()
        .find(|(prefix, _)| starts_with_ignore_case(line, prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or(FieldKind::PassThrough)
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Rewrite a raw header block for sharing.
///
/// Single pass over the lines. A continuation line always shares the fate of
/// the primary line that owns it: dropped when the field was dropped or
/// replaced by a placeholder, emitted untouched otherwise. A folded From field
/// is unfolded onto one line before it is rewritten. Blank lines are kept as
/// they are and end any running suppression.
///
/// The result is `\n`-joined and ends with exactly one `\n`.
pub fn anonymize(raw_header: &str, cfg: &AnonymizationConfig) -> String {
    let mut out: Vec<Cow<'_, str>> = Vec::new();
    let mut suppressing = false;
    let mut saw_cc = false;
    let mut pending_from: Option<String> = None;

    for line in raw_header.lines() {
        let blank = line.trim().is_empty();

        if !blank && is_continuation(line) {
            if let Some(from) = pending_from.as_mut() {
                from.push(' ');
                from.push_str(line.trim());
            } else if !suppressing {
                out.push(Cow::Borrowed(line));
            }
            continue;
        }

        flush_from(&mut out, &mut pending_from, cfg);

        if blank {
            suppressing = false;
            out.push(Cow::Borrowed(line));
            continue;
        }

        let (emitted, keep_continuations) = match classify(line) {
            FieldKind::HardDrop => (None, false),
            FieldKind::From => {
                pending_from = Some(line.to_string());
                (None, true)
            }
            FieldKind::To if cfg.replace_to => (Some(Cow::Borrowed(TO_PLACEHOLDER)), false),
            FieldKind::Date if cfg.replace_date => (Some(Cow::Borrowed(DATE_PLACEHOLDER)), false),
            FieldKind::MessageId => (Some(tag_message_id(line, cfg.id_tag())), true),
            FieldKind::Received if !cfg.keep_received => (None, false),
            FieldKind::ReplyTo if !cfg.keep_reply_to => (None, false),
            FieldKind::Cc => {
                saw_cc = true;
                (Some(Cow::Borrowed(line)), true)
            }
            _ => (Some(Cow::Borrowed(line)), true),
        };

        suppressing = !keep_continuations;
        out.extend(emitted);
    }
    flush_from(&mut out, &mut pending_from, cfg);

    if cfg.add_cc && !saw_cc {
        out.push(Cow::Borrowed(SYNTHETIC_CC));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn flush_from(
    out: &mut Vec<Cow<'_, str>>,
    pending: &mut Option<String>,
    cfg: &AnonymizationConfig,
) {
    if let Some(from) = pending.take() {
        out.push(Cow::Owned(rewrite_from(&from, cfg.domain()).into_owned()));
    }
}

fn angle_address() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^from:\s*(.*?)\s*<\s*([^<>@\s]+)@([^<>\s]+)\s*>(.*)$")
            .expect("valid From address regex")
    })
}

fn bare_host() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[\w.-]+").expect("valid host regex"))
}

/// `Name <local@host>` keeps the name, the local part and any trailing
/// comment. The host becomes `domain`, or the whole `<...@host>` collapses to
/// the bare local part when `domain` is empty. Any other form only has its
/// first `@host` token rewritten the same way.
fn rewrite_from<'a>(line: &'a str, domain: &str) -> Cow<'a, str> {
    if let Some(caps) = angle_address().captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let local = caps.get(2).map_or("", |m| m.as_str());
        let rest = caps.get(4).map_or("", |m| m.as_str().trim_end());
        let address = if domain.is_empty() {
            local.to_string()
        } else {
            format!("<{local}@{domain}>")
        };
        return if name.is_empty() {
            Cow::Owned(format!("From: {address}{rest}"))
        } else {
            Cow::Owned(format!("From: {name} {address}{rest}"))
        };
    }

    if domain.is_empty() {
        bare_host().replace(line, "")
    } else {
        let replacement = format!("@{domain}");
        bare_host().replace(line, NoExpand(&replacement))
    }
}

fn tag_message_id<'a>(line: &'a str, tag: &str) -> Cow<'a, str> {
    match line.find('@') {
        Some(at) => Cow::Owned(format!("{}{}{}", &line[..at], tag, &line[at..])),
        None => Cow::Borrowed(line),
    }
}
