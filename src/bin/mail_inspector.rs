use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;

use mail_inspector::clean::{AnonymizationConfig, ViewMode, render};
use mail_inspector::config::{Config, load_config, resolve_export_dir};
use mail_inspector::domain::email::{Credentials, FetchRange, MessageSummary};
use mail_inspector::export::{
    analysis_filename, bodies_filename, export_bodies, export_messages, now_millis, write_export,
};
use mail_inspector::mail::MailSource;
use mail_inspector::mail::imap_client::ImapClient;
use mail_inspector::server::run_server;
use mail_inspector::variants::{Templates, plan, split_versions};

const PASSWORD_ENV: &str = "MAIL_INSPECTOR_PASSWORD";

#[derive(Parser)]
#[command(name = "mail_inspector")]
#[command(about = "Inspect and anonymize mail headers (JSON API + CLI)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON API used by the dashboard
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Clean a raw message read from a file or stdin
    Clean {
        file: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Mode::Cleaned)]
        mode: Mode,

        #[command(flatten)]
        opts: CleanFlags,
    },

    /// List the folders of an account
    Boxes {
        #[arg(long)]
        email: String,
    },

    /// Fetch messages and write them to an export file
    Fetch {
        #[arg(long)]
        email: String,

        #[arg(long = "box", default_value = "INBOX")]
        mailbox: String,

        /// Sequence set like `1:*`, or a count of newest messages
        #[arg(long, default_value = "20")]
        range: String,

        /// First sequence number; with `--end` overrides `--range`
        #[arg(long)]
        start: Option<String>,

        /// Last sequence number, `*` when omitted
        #[arg(long)]
        end: Option<String>,

        #[arg(long, value_enum, default_value_t = Mode::Cleaned)]
        mode: Mode,

        /// Export body text only
        #[arg(long)]
        bodies: bool,

        /// Output directory (overrides config)
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        opts: CleanFlags,
    },

    /// Expand a creative template once per version
    Variants {
        #[arg(long)]
        template: PathBuf,

        #[arg(long)]
        header: Option<PathBuf>,

        /// Versions separated by __SEP__
        #[arg(long)]
        versions: PathBuf,

        #[arg(long)]
        recipient: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Raw,
    Cleaned,
}

impl From<Mode> for ViewMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Raw => ViewMode::Raw,
            Mode::Cleaned => ViewMode::Cleaned,
        }
    }
}

/// Flags layered on top of the `[anonymize]` table of the config file.
///
/// Switches are tri-state: absent keeps the config value, `--flag` or
/// `--flag=true` turns it on, `--flag=false` turns it off.
#[derive(Args)]
struct CleanFlags {
    #[arg(long)]
    domain: Option<String>,
    #[arg(long)]
    message_id_tag: Option<String>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    replace_date: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    replace_to: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    keep_received: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    keep_reply_to: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    add_cc: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    remove_body: Option<bool>,
}

impl CleanFlags {
    fn apply(self, base: &AnonymizationConfig) -> AnonymizationConfig {
        AnonymizationConfig {
            domain: self.domain.unwrap_or_else(|| base.domain.clone()),
            message_id_tag: self
                .message_id_tag
                .unwrap_or_else(|| base.message_id_tag.clone()),
            replace_date: self.replace_date.unwrap_or(base.replace_date),
            replace_to: self.replace_to.unwrap_or(base.replace_to),
            keep_received: self.keep_received.unwrap_or(base.keep_received),
            keep_reply_to: self.keep_reply_to.unwrap_or(base.keep_reply_to),
            add_cc: self.add_cc.unwrap_or(base.add_cc),
            remove_body: self.remove_body.unwrap_or(base.remove_body),
        }
    }
}

fn read_password(email: &str) -> Result<Credentials> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(p) => p,
        Err(_) => {
            eprintln!("Paste password for {email} (end with Ctrl-D):");
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            s
        }
    };
    Ok(Credentials {
        email: email.to_string(),
        password: password.trim().to_string(),
    })
}

fn fetch_range(range: &str, start: Option<&str>, end: Option<&str>) -> FetchRange {
    FetchRange::from_bounds(start, end).unwrap_or_else(|| FetchRange::parse(range))
}

fn imap_client(cfg: &Config) -> ImapClient {
    ImapClient::new(cfg.imap_server.clone(), cfg.imap_port)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;

    match cli.cmd {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.bind.clone());
            let imap = imap_client(&cfg);
            run_server(&bind, &imap, &cfg.anonymize)
        }

        Command::Clean { file, mode, opts } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut s = String::new();
                    std::io::stdin().read_to_string(&mut s)?;
                    s
                }
            };
            let options = opts.apply(&cfg.anonymize);
            print!("{}", render(&raw, mode.into(), &options));
            Ok(())
        }

        Command::Boxes { email } => {
            let creds = read_password(&email)?;
            for name in imap_client(&cfg).list_folders(&creds)? {
                println!("{name}");
            }
            Ok(())
        }

        Command::Fetch {
            email,
            mailbox,
            range,
            start,
            end,
            mode,
            bodies,
            out,
            opts,
        } => {
            let range = fetch_range(&range, start.as_deref(), end.as_deref());
            let creds = read_password(&email)?;
            let messages = imap_client(&cfg).fetch(&creds, &mailbox, &range)?;
            if messages.is_empty() {
                println!("No emails to save");
                return Ok(());
            }

            for m in &messages {
                let s = MessageSummary::from_message(m);
                println!("{:>6}  {:<8} {:<24} {}", s.id, s.day_month, s.sender, s.subject);
            }

            let millis = now_millis();
            let (content, filename) = if bodies {
                let texts = messages.iter().map(|m| m.body_text.as_str());
                (export_bodies(texts), bodies_filename(millis))
            } else {
                let options = opts.apply(&cfg.anonymize);
                let raws = messages.iter().map(|m| m.raw.as_str());
                (
                    export_messages(raws, mode.into(), &options),
                    analysis_filename(&mailbox, millis),
                )
            };

            let dir = out.unwrap_or_else(|| resolve_export_dir(&cfg));
            let path = write_export(&dir, &filename, &content)?;
            println!("Saved {} messages to {}", messages.len(), path.display());
            Ok(())
        }

        Command::Variants {
            template,
            header,
            versions,
            recipient,
        } => {
            let templates = Templates {
                creative: std::fs::read_to_string(&template)
                    .with_context(|| format!("reading {}", template.display()))?,
                header: header.map(std::fs::read_to_string).transpose()?,
            };
            let text = std::fs::read_to_string(&versions)
                .with_context(|| format!("reading {}", versions.display()))?;
            let versions = split_versions(&text);
            if versions.is_empty() {
                return Err(anyhow!("No versions found"));
            }
            let variants = plan(&templates, &versions, recipient.as_deref());
            println!("{}", serde_json::to_string_pretty(&variants)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_flags(args: &[&str]) -> CleanFlags {
        let argv = ["mail_inspector", "clean"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().cmd {
            Command::Clean { opts, .. } => opts,
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn flags_can_turn_config_switches_off() {
        let base = AnonymizationConfig {
            keep_received: true,
            add_cc: true,
            ..Default::default()
        };
        let out = clean_flags(&["--keep-received=false", "--replace-date"]).apply(&base);
        assert!(!out.keep_received);
        assert!(out.replace_date);
        assert!(out.add_cc);
    }

    #[test]
    fn bare_switch_does_not_swallow_file_argument() {
        let cli = Cli::try_parse_from(["mail_inspector", "clean", "--add-cc", "msg.eml"]).unwrap();
        match cli.cmd {
            Command::Clean { file, opts, .. } => {
                assert_eq!(file, Some(PathBuf::from("msg.eml")));
                assert_eq!(opts.add_cc, Some(true));
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn fetch_bounds_override_range() {
        let cli = Cli::try_parse_from([
            "mail_inspector",
            "fetch",
            "--email",
            "me@example.com",
            "--start",
            "100",
        ])
        .unwrap();
        match cli.cmd {
            Command::Fetch {
                range, start, end, ..
            } => {
                assert_eq!(
                    fetch_range(&range, start.as_deref(), end.as_deref()),
                    FetchRange::Sequence("100:*".into())
                );
                assert_eq!(fetch_range(&range, None, None), FetchRange::Latest(20));
            }
            _ => panic!("expected fetch"),
        }
    }
}
