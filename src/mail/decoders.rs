use crate::domain::email::HeaderMap;

pub const BODY_PARSE_ERROR: &str = "(Error parsing body)";

const HTML_WIDTH: usize = 100;

/// Parse a header block into lowercase name -> values.
///
/// mailparse unfolds and decodes encoded-words; if it rejects the block we
/// fall back to one field per `Name: value` line.
pub fn parse_header_map(raw_header: &[u8]) -> HeaderMap {
    let mut map = HeaderMap::new();
    match mailparse::parse_headers(raw_header) {
        Ok((headers, _)) => {
            for h in headers {
                map.entry(h.get_key().to_ascii_lowercase())
                    .or_default()
                    .push(h.get_value());
            }
        }
        Err(e) => {
            log::debug!("header block rejected by mailparse ({e}); using line split");
            let text = String::from_utf8_lossy(raw_header);
            for line in text.lines() {
                if line.starts_with(' ') || line.starts_with('\t') {
                    continue;
                }
                if let Some((name, value)) = line.split_once(':') {
                    map.entry(name.trim().to_ascii_lowercase())
                        .or_default()
                        .push(value.trim().to_string());
                }
            }
        }
    }
    map
}

/// First value of `name` in a raw header block, continuation lines unfolded.
pub fn header_field(raw_header: &str, name: &str) -> Option<String> {
    let mut lines = raw_header.lines();
    while let Some(line) = lines.next() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if line.starts_with([' ', '\t']) || !key.trim().eq_ignore_ascii_case(name) {
            continue;
        }
        let mut value = value.trim().to_string();
        for cont in lines.by_ref() {
            if !cont.starts_with([' ', '\t']) {
                break;
            }
            value.push(' ');
            value.push_str(cont.trim());
        }
        return Some(value);
    }
    None
}

/// Best readable text of a full RFC 822 message: the first text/plain part,
/// else the first text/html part rendered as text.
pub fn extract_body_text(raw_rfc822: &[u8]) -> String {
    match mailparse::parse_mail(raw_rfc822) {
        Ok(parsed) => {
            if let Some(text) = find_part(&parsed, "text/plain")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
            {
                return text;
            }
            find_part(&parsed, "text/html")
                .map(|html| html_to_text(&html))
                .unwrap_or_default()
        }
        Err(e) => {
            log::warn!("failed to parse message body: {e}");
            BODY_PARSE_ERROR.to_string()
        }
    }
}

fn find_part(p: &mailparse::ParsedMail, mime: &str) -> Option<String> {
    if p.ctype.mimetype.eq_ignore_ascii_case(mime) {
        return p.get_body().ok();
    }
    p.subparts.iter().find_map(|sp| find_part(sp, mime))
}

fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), HTML_WIDTH)
        .unwrap_or_else(|_| strip_html_minimal(html));
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_html_minimal(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_groups_repeated_fields() {
        let raw = b"Received: a\r\n\tb\r\nReceived: c\r\nSubject: =?UTF-8?Q?Caf=C3=A9?=\r\n\r\n";
        let map = parse_header_map(raw);
        assert_eq!(map["received"].len(), 2);
        assert_eq!(map["subject"], vec!["Café".to_string()]);
    }

    #[test]
    fn header_field_unfolds_continuations() {
        let raw = "From: Jane\r\n <jane@example.com>\r\nsubject: Hi\r\n";
        assert_eq!(
            header_field(raw, "from").as_deref(),
            Some("Jane <jane@example.com>")
        );
        assert_eq!(header_field(raw, "Subject").as_deref(), Some("Hi"));
        assert_eq!(header_field(raw, "Date"), None);
    }

    #[test]
    fn plain_text_part_preferred() {
        let raw = b"Content-Type: multipart/alternative; boundary=\"b\"\r\n\r\n--b\r\nContent-Type: text/html\r\n\r\n<p>html</p>\r\n--b\r\nContent-Type: text/plain\r\n\r\n  plain text  \r\n--b--\r\n";
        assert_eq!(extract_body_text(raw), "plain text");
    }

    #[test]
    fn html_only_is_flattened() {
        let raw = b"Content-Type: text/html\r\n\r\n<p>Hello</p>\n<p>there</p>";
        let text = extract_body_text(raw);
        assert!(text.contains("Hello"));
        assert!(text.contains("there"));
        assert!(!text.contains('<'));
        assert!(!text.contains('\n'));
    }
}
