//! Runtime configuration loaded from environment variables

use std::net::SocketAddr;

use crate::mask::{DEFAULT_MASK_KEY, KEY_LENGTH};

const DEFAULT_BIND: &str = "0.0.0.0:6580";
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MASK_KEY must be exactly {KEY_LENGTH} bytes, got {0}")]
    InvalidMaskKey(usize),

    #[error("FICTIONARY_BIND is not a socket address: {0}")]
    InvalidBind(String),

    #[error("FICTIONARY_CHANNEL_CAPACITY must be a positive integer: {0}")]
    InvalidCapacity(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    /// Shared secret for identity masking (AES-128 key)
    pub mask_key: [u8; KEY_LENGTH],
    /// Buffered events per game channel before slow subscribers lag
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 6580)),
            mask_key: *DEFAULT_MASK_KEY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind = non_empty_var("FICTIONARY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind.clone()))?;

        let mask_key = match non_empty_var("MASK_KEY") {
            Some(raw) => parse_mask_key(&raw)?,
            None => {
                tracing::warn!(
                    "MASK_KEY not set, using the development key; masked votes are trivially reversible"
                );
                *DEFAULT_MASK_KEY
            }
        };

        let channel_capacity = match non_empty_var("FICTIONARY_CHANNEL_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidCapacity(raw)),
            },
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        Ok(Self {
            bind,
            mask_key,
            channel_capacity,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_mask_key(raw: &str) -> Result<[u8; KEY_LENGTH], ConfigError> {
    raw.as_bytes()
        .try_into()
        .map_err(|_| ConfigError::InvalidMaskKey(raw.len()))
}
