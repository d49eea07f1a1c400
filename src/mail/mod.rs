pub mod decoders;
pub mod imap_client;

use anyhow::Result;

use crate::domain::email::{Credentials, FetchRange, FetchedMessage};

/// One short-lived session per call; nothing is kept between calls.
pub trait MailSource: Send + Sync {
    fn verify(&self, creds: &Credentials) -> Result<()>;
    fn list_folders(&self, creds: &Credentials) -> Result<Vec<String>>;
    fn fetch(
        &self,
        creds: &Credentials,
        mailbox: &str,
        range: &FetchRange,
    ) -> Result<Vec<FetchedMessage>>;
}
