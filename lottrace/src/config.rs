use config::{Config, ConfigError};
use core_types::PrincipalId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Construction-time configuration. The admin principal is fixed here and
/// is the only caller allowed to mutate the participant registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyConfig {
    pub admin: PrincipalId,
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY
}

impl CustodyConfig {
    pub fn new(admin: impl Into<PrincipalId>) -> Self {
        Self {
            admin: admin.into(),
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::with_name("lottrace.toml").required(false))
            .add_source(config::Environment::with_prefix("LOTTRACE"))
            .build()?;
        settings.try_deserialize()
    }
}
