use anyhow::{Result, anyhow};
use log::{debug, info};
use native_tls::TlsConnector;

use crate::domain::email::{Credentials, FetchRange, FetchedMessage};
use crate::mail::MailSource;
use crate::mail::decoders::{extract_body_text, parse_header_map};

type ImapSession = imap::Session<native_tls::TlsStream<std::net::TcpStream>>;

pub const DEFAULT_SERVER: &str = "imap.gmail.com";
pub const DEFAULT_PORT: u16 = 993;

// PEEK keeps \Seen untouched.
const FETCH_QUERY: &str = "(UID BODY.PEEK[HEADER] BODY.PEEK[])";

pub struct ImapClient {
    pub server: String,
    pub port: u16,
}

impl ImapClient {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
        }
    }

    fn connect_and_login(&self, creds: &Credentials) -> Result<ImapSession> {
        if !creds.is_complete() {
            return Err(anyhow!("email and password are required"));
        }
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect(
            (self.server.as_str(), self.port),
            self.server.as_str(),
            &tls,
        )?;
        debug!("connected to {}:{}", self.server, self.port);

        client
            .login(creds.email.trim(), creds.password.trim())
            .map_err(|(e, _client)| anyhow!("IMAP login failed: {e}"))
    }

    fn fetch_set(session: &mut ImapSession, set: &str) -> Result<Vec<FetchedMessage>> {
        let fetches = session.fetch(set, FETCH_QUERY)?;
        let mut out = Vec::with_capacity(fetches.len());
        for f in fetches.iter() {
            let raw_bytes = f.body().unwrap_or_default();
            let headers = parse_header_map(f.header().unwrap_or_default());
            let body_text = if raw_bytes.is_empty() {
                String::new()
            } else {
                extract_body_text(raw_bytes)
            };
            out.push(FetchedMessage {
                id: f.uid.unwrap_or(f.message),
                seq: f.message,
                headers,
                raw: String::from_utf8_lossy(raw_bytes).into_owned(),
                body_text,
            });
        }
        Ok(out)
    }
}

impl MailSource for ImapClient {
    fn verify(&self, creds: &Credentials) -> Result<()> {
        let mut session = self.connect_and_login(creds)?;
        session.logout()?;
        info!("credentials verified for {}", creds.email);
        Ok(())
    }

    /// Full hierarchical names, sorted.
    fn list_folders(&self, creds: &Credentials) -> Result<Vec<String>> {
        let mut session = self.connect_and_login(creds)?;
        let names = session.list(Some(""), Some("*"))?;
        let mut folders: Vec<String> = names.iter().map(|n| n.name().to_string()).collect();
        session.logout()?;

        folders.sort();
        folders.dedup();
        debug!("available mailboxes: {folders:?}");
        Ok(folders)
    }

    fn fetch(
        &self,
        creds: &Credentials,
        mailbox: &str,
        range: &FetchRange,
    ) -> Result<Vec<FetchedMessage>> {
        let mut session = self.connect_and_login(creds)?;
        session.select(mailbox)?;

        let messages = match range {
            FetchRange::Sequence(set) => Self::fetch_set(&mut session, set)?,
            FetchRange::Latest(n) => {
                let mut seqs: Vec<u32> = session.search("ALL")?.into_iter().collect();
                seqs.sort_unstable();
                let start = seqs.len().saturating_sub(*n as usize);
                let wanted = &seqs[start..];
                if wanted.is_empty() {
                    Vec::new()
                } else {
                    let set = wanted
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(",");
                    let mut msgs = Self::fetch_set(&mut session, &set)?;
                    msgs.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
                    msgs
                }
            }
        };

        session.logout()?;
        info!("fetched {} messages from {mailbox}", messages.len());
        Ok(messages)
    }
}
