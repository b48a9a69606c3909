//! FerrumDB core - in-memory engines behind sorted sets and expiring keys
//!
//! Two independent leaf components:
//! - `zset`: ordered tree keyed by `(score, member)` with rank queries
//! - `dict`: key/value dictionary with lazy, per-key absolute expiry
//!
//! Neither engine synchronizes internally. The enclosing store owns them and
//! serializes every call (e.g. one lock or one shard thread per store).

pub mod config;
pub mod dict;
pub mod error;
pub mod zset;

/// Re-export commonly used types
pub use config::{Config, DictConfig, TreeConfig};
pub use dict::{Clock, Dictionary, ManualClock, SystemClock};
pub use error::ConfigError;
pub use zset::{AddOutcome, Entry, ScoreTree};

/// Install a log subscriber for tests, honoring `RUST_LOG`
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
