//! Joining several messages into one shareable text blob.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use regex::Regex;

use crate::clean::{AnonymizationConfig, ViewMode, render};

pub const SEPARATOR: &str = "__SEP__";

/// The separator as it appears between two exported items.
pub fn joiner() -> String {
    format!("\n\n{SEPARATOR}\n\n")
}

/// Render every message in `mode` and join them with the separator.
pub fn export_messages<'a, I>(raws: I, mode: ViewMode, cfg: &AnonymizationConfig) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    raws.into_iter()
        .map(|raw| render(raw, mode, cfg).into_owned())
        .collect::<Vec<_>>()
        .join(joiner().as_str())
}

fn blank_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid newline regex"))
}

/// Body text only: runs of blank lines squeezed to one, edges trimmed.
pub fn export_bodies<'a, I>(bodies: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    bodies
        .into_iter()
        .map(|body| blank_run().replace_all(body, "\n\n").trim().to_string())
        .collect::<Vec<_>>()
        .join(joiner().as_str())
}

pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

pub fn analysis_filename(mailbox: &str, millis: u128) -> String {
    format!("analysis_{}_{millis}.txt", sanitize_filename_part(mailbox))
}

pub fn bodies_filename(millis: u128) -> String {
    format!("emails_export_{millis}.txt")
}

/// Keep ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn sanitize_filename_part(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "mailbox".to_string()
    } else {
        cleaned
    }
}

pub fn write_export(output_dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(filename);
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
