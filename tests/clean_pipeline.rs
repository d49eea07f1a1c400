//! End-to-end checks of the cleaning pipeline on a realistic message.

use mail_inspector::clean::{AnonymizationConfig, ViewMode, anonymize, clean_message, render};
use mail_inspector::export::export_messages;

const GMAIL_MESSAGE: &str = concat!(
    "Delivered-To: me@example.com\r\n",
    "Received: by 2002:a05:6a10:1234 with SMTP id abc;\r\n",
    "        Mon, 1 Jan 2024 10:00:01 -0800 (PST)\r\n",
    "X-Received: by 2002:a17:90a:5678 with SMTP id def;\r\n",
    "        Mon, 1 Jan 2024 10:00:00 -0800 (PST)\r\n",
    "ARC-Seal: i=1; a=rsa-sha256; t=1704132000; cv=none;\r\n",
    "        d=google.com; s=arc-20160816;\r\n",
    "Return-Path: <news@shop.example>\r\n",
    "Received-SPF: pass (google.com: domain of news@shop.example designates 1.2.3.4)\r\n",
    "Authentication-Results: mx.google.com;\r\n",
    "       dkim=pass header.i=@shop.example\r\n",
    "DKIM-Signature: v=1; a=rsa-sha256; c=relaxed/relaxed; d=shop.example;\r\n",
    "        h=from:to:subject; bh=xyz=;\r\n",
    "From: \"Shop News\" <news@shop.example>\r\n",
    "To: me@example.com\r\n",
    "Reply-To: support@shop.example\r\n",
    "Subject: Weekly deals\r\n",
    "Date: Mon, 1 Jan 2024 10:00:00 -0800\r\n",
    "Message-ID: <20240101.abc123@mail.shop.example>\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: text/plain; charset=UTF-8\r\n",
    "\r\n",
    "Deals inside.\r\n",
    "\r\n",
    "Begin forwarded message:\r\n",
    "From: someone else\r\n",
);

fn options() -> AnonymizationConfig {
    AnonymizationConfig {
        domain: "corp.test".into(),
        replace_date: true,
        replace_to: true,
        add_cc: true,
        ..Default::default()
    }
}

// ─── Full message ───────────────────────────────────────────────────

#[test]
fn gmail_message_is_fully_cleaned() {
    let out = clean_message(GMAIL_MESSAGE, &options());
    assert_eq!(
        out,
        "From: \"Shop News\" <news@corp.test>\n\
         To: [*to]\n\
         Subject: Weekly deals\n\
         Date: [DATE]\n\
         Message-ID: <20240101.abc123[EID]@mail.shop.example>\n\
         MIME-Version: 1.0\n\
         Content-Type: text/plain; charset=UTF-8\n\
         Cc: [*to]\n\
         \r\n\r\nDeals inside.\r\n\r\n"
    );
}

#[test]
fn no_trace_survives() {
    let out = clean_message(GMAIL_MESSAGE, &options());
    for needle in ["2002:a05", "arc-20160816", "dkim=pass", "bh=xyz", "1.2.3.4", "support@"] {
        assert!(!out.contains(needle), "{needle} leaked into {out:?}");
    }
}

// ─── Received handling ──────────────────────────────────────────────

#[test]
fn kept_received_stays_in_order_with_continuation() {
    let opts = AnonymizationConfig {
        keep_received: true,
        ..options()
    };
    let out = clean_message(GMAIL_MESSAGE, &opts);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Received: by 2002:a05:6a10:1234 with SMTP id abc;");
    assert_eq!(lines[1], "        Mon, 1 Jan 2024 10:00:01 -0800 (PST)");
    assert_eq!(lines[2], "From: \"Shop News\" <news@corp.test>");
}

// ─── Modes and export ───────────────────────────────────────────────

#[test]
fn raw_mode_leaves_message_alone() {
    assert_eq!(
        render(GMAIL_MESSAGE, ViewMode::Raw, &options()),
        GMAIL_MESSAGE
    );
}

#[test]
fn export_cleans_each_message_independently() {
    let out = export_messages(
        [GMAIL_MESSAGE, GMAIL_MESSAGE],
        ViewMode::Cleaned,
        &options(),
    );
    let parts: Vec<&str> = out.split("\n\n__SEP__\n\n").collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], parts[1]);
    assert_eq!(parts[0].matches("Cc: [*to]").count(), 1);
}

#[test]
fn header_only_input() {
    let header = "Subject: hi\r\nX-Mailer: test\r\n";
    assert_eq!(
        anonymize(header, &AnonymizationConfig::default()),
        "Subject: hi\n"
    );
}
