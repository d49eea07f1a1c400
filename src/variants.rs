//! Batch test variants: one filled-in creative per version.

use serde::Serialize;

use crate::export::SEPARATOR;

pub const PLACEHOLDER: &str = "{{NEWS}}";

#[derive(Debug, Clone, Default)]
pub struct Templates {
    pub creative: String,
    pub header: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// 1-based position in the versions file.
    pub index: usize,
    pub creative: String,
    pub header: Option<String>,
    pub recipient: Option<String>,
}

/// Split a versions file on the separator, dropping empty entries.
pub fn split_versions(text: &str) -> Vec<&str> {
    text.split(SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// `local+tag@domain` -> `local@domain`. Anything without `@` is returned as is.
pub fn base_address(addr: &str) -> String {
    match addr.split_once('@') {
        Some((local, domain)) => {
            let local = local.split('+').next().unwrap_or(local);
            format!("{local}@{domain}")
        }
        None => addr.to_string(),
    }
}

pub fn plus_address(base: &str, n: usize) -> Option<String> {
    let (local, domain) = base.split_once('@')?;
    Some(format!("{local}+{n}@{domain}"))
}

pub fn plan(templates: &Templates, versions: &[&str], recipient: Option<&str>) -> Vec<Variant> {
    let base = recipient.map(|r| base_address(r.trim()));
    versions
        .iter()
        .enumerate()
        .map(|(i, version)| {
            let index = i + 1;
            Variant {
                index,
                creative: templates.creative.replace(PLACEHOLDER, version),
                header: templates
                    .header
                    .as_ref()
                    .map(|h| h.replace(PLACEHOLDER, version)),
                recipient: base.as_deref().and_then(|b| plus_address(b, index)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_split_and_trimmed() {
        let text = "first\n__SEP__\n\n  second  \n__SEP__\n   \n__SEP__";
        assert_eq!(split_versions(text), vec!["first", "second"]);
    }

    #[test]
    fn base_address_drops_plus_tag() {
        assert_eq!(base_address("me+7@example.com"), "me@example.com");
        assert_eq!(base_address("me@example.com"), "me@example.com");
        assert_eq!(base_address("not-an-address"), "not-an-address");
    }

    #[test]
    fn plan_fills_every_placeholder() {
        let templates = Templates {
            creative: "<p>{{NEWS}}</p><i>{{NEWS}}</i>".into(),
            header: Some("Subject: {{NEWS}}".into()),
        };
        let variants = plan(&templates, &["a", "b"], Some("me+3@example.com"));
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].creative, "<p>a</p><i>a</i>");
        assert_eq!(variants[1].header.as_deref(), Some("Subject: b"));
        assert_eq!(variants[0].recipient.as_deref(), Some("me+1@example.com"));
        assert_eq!(variants[1].recipient.as_deref(), Some("me+2@example.com"));
    }

    #[test]
    fn plan_without_recipient_or_header() {
        let templates = Templates {
            creative: "{{NEWS}}".into(),
            header: None,
        };
        let variants = plan(&templates, &["x"], Some("nobody"));
        assert_eq!(variants[0].header, None);
        assert_eq!(variants[0].recipient, None);
    }
}
