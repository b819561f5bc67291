use crate::state::Channel;
use thiserror::Error;

/// Error type shared by every upsmon crate.
#[derive(Debug, Error)]
pub enum UpsError {
    /// An aggregate was requested before the first sample was pushed.
    #[error("no samples recorded yet for {channel}")]
    EmptyWindow { channel: Channel },

    #[error("tail divisor must be at least 1")]
    InvalidDivisor,

    /// Runtime projection while the smoothed current does not describe a discharge.
    #[error("remaining runtime is undefined at a smoothed current of {current_ma} mA")]
    UndefinedRuntime { current_ma: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = UpsError> = std::result::Result<T, E>;
