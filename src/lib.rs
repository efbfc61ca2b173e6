pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod format;
pub mod generator;
pub mod prompts;
pub mod record;
pub mod relay;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;
