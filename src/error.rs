use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Remote RTK caster or base refused or dropped the connection attempt.
    #[error("connection to {0} refused")]
    ConnectionRefused(String),

    /// Remote RTK caster or base could not be reached at all.
    #[error("{0} is unreachable")]
    Unreachable(String),

    /// Base mode: failed to open the local corrections server.
    #[error("failed to host corrections server at {0}")]
    HostCreation(String),

    /// [crate::prelude::RtkLinkConfig::retry_limit] must allow at least one attempt.
    #[error("invalid configuration: retry limit must be at least 1")]
    InvalidRetryLimit,

    /// Watchdog needs a strictly positive period and tolerance.
    #[error("invalid configuration: watchdog period and stall tolerance must be positive")]
    InvalidWatchdogSettings,

    #[error("unknown rtk mode \"{0}\"")]
    UnknownRtkMode(String),

    #[error("unknown correction protocol \"{0}\"")]
    UnknownCorrectionProtocol(String),
}
