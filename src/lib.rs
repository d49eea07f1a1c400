pub mod clean;
pub mod config;
pub mod domain;
pub mod export;
pub mod mail;
pub mod server;
pub mod variants;
