/// Markers that start a quoted or forwarded copy of an earlier message.
pub const QUOTE_MARKERS: [&str; 3] = [
    "-----Original Message-----",
    "----- Original Message -----",
    "Begin forwarded message:",
];

/// Split a raw message at its first blank line.
///
/// `\r\n\r\n` wins over `\n\n` wherever it appears. The separator stays at the
/// front of the body; without one, the whole text is header.
pub fn split_message(raw: &str) -> (&str, &str) {
    match raw.find("\r\n\r\n").or_else(|| raw.find("\n\n")) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    }
}

/// Cut the body at the earliest quote marker.
pub fn trim_quoted_tail(body: &str) -> &str {
    QUOTE_MARKERS
        .iter()
        .filter_map(|marker| body.find(marker))
        .min()
        .map_or(body, |cut| &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prefers_crlf_separator() {
        let raw = "Subject: a\r\nFrom: b\r\n\r\nhello\n\nworld";
        let (header, body) = split_message(raw);
        assert_eq!(header, "Subject: a\r\nFrom: b");
        assert_eq!(body, "\r\n\r\nhello\n\nworld");
    }

    #[test]
    fn split_falls_back_to_lf() {
        let (header, body) = split_message("Subject: a\n\nbody");
        assert_eq!(header, "Subject: a");
        assert_eq!(body, "\n\nbody");
    }

    #[test]
    fn split_without_separator_is_all_header() {
        assert_eq!(split_message("Subject: a"), ("Subject: a", ""));
    }

    #[test]
    fn earliest_marker_wins() {
        let body = "\n\nThanks!\nBegin forwarded message:\nold\n-----Original Message-----\nolder";
        assert_eq!(trim_quoted_tail(body), "\n\nThanks!\n");

        let body = "hi\n----- Original Message -----\nx\nBegin forwarded message:";
        assert_eq!(trim_quoted_tail(body), "hi\n");
    }

    #[test]
    fn body_without_marker_is_untouched() {
        assert_eq!(trim_quoted_tail("plain body"), "plain body");
        assert_eq!(trim_quoted_tail(""), "");
    }
}
