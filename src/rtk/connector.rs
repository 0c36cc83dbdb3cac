use std::sync::{Arc, RwLock};

use crate::{
    cfg::{CorrectionProtocol, RtkLinkConfig},
    prelude::{Duration, Error},
};

/// NTRIP credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtripCredentials {
    pub mount: String,
    pub username: String,
    pub password: String,
}

/// Corrections link [Endpoint]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Rover side: we connect to a caster
    Client {
        protocol: CorrectionProtocol,
        address: String,
        port: u16,
        ntrip: Option<NtripCredentials>,
    },
    /// Base side: we serve corrections
    Host { address: String, port: u16 },
}

impl Endpoint {
    /// Client [Endpoint] described by this [RtkLinkConfig].
    /// Credentials are only attached when both mount point and username are set.
    pub fn client(cfg: &RtkLinkConfig) -> Self {
        let ntrip = if !cfg.mount.is_empty() && !cfg.username.is_empty() {
            Some(NtripCredentials {
                mount: cfg.mount.clone(),
                username: cfg.username.clone(),
                password: cfg.password.clone(),
            })
        } else {
            None
        };
        Self::Client {
            protocol: cfg.protocol,
            address: cfg.server_address.clone(),
            port: cfg.server_port,
            ntrip,
        }
    }

    /// Host [Endpoint] described by this [RtkLinkConfig].
    pub fn host(cfg: &RtkLinkConfig) -> Self {
        Self::Host {
            address: cfg.server_address.clone(),
            port: cfg.server_port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    /// Formats as `TCP:[protocol]:[address]:[port]:[mount]:[username]:[password]`
    /// (client) or `TCP:[address]:[port]` (host)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client {
                protocol,
                address,
                port,
                ntrip,
            } => {
                write!(f, "TCP:{}:{}:{}", protocol, address, port)?;
                if let Some(ntrip) = ntrip {
                    write!(f, ":{}:{}:{}", ntrip.mount, ntrip.username, ntrip.password)?;
                }
                Ok(())
            },
            Self::Host { address, port } => write!(f, "TCP:{}:{}", address, port),
        }
    }
}

/// The transport layer in charge of the corrections stream implements [Connector].
pub trait Connector {
    /// Open a connection to the remote caster. This may block
    /// for as long as the transport requires.
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), Error>;

    /// Create a corrections server, when operating as base station.
    fn host(&mut self, endpoint: &Endpoint) -> Result<(), Error>;

    /// Total number of bytes exchanged on the active link so far.
    /// Must be monotonic for the lifetime of the process: the watchdog
    /// only looks for increments.
    fn byte_count(&self) -> u64;
}

/// [Sleeper] applies the backoff between connection attempts.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// [Sleeper] blocking the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(to_std_duration(duration));
    }
}

/// Converts to [std::time::Duration], negative values saturate to zero.
pub(crate) fn to_std_duration(duration: Duration) -> std::time::Duration {
    let nanos = duration.total_nanoseconds().clamp(0, u64::MAX as i128);
    std::time::Duration::from_nanos(nanos as u64)
}

/// Provides the [RtkLinkConfig] each time a connection is (re)established.
pub trait ConfigProvider {
    fn rtk_config(&self) -> RtkLinkConfig;
}

impl ConfigProvider for RtkLinkConfig {
    fn rtk_config(&self) -> RtkLinkConfig {
        self.clone()
    }
}

/// Shared configuration, that operators may modify at runtime.
impl ConfigProvider for Arc<RwLock<RtkLinkConfig>> {
    fn rtk_config(&self) -> RtkLinkConfig {
        match self.read() {
            Ok(cfg) => cfg.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("", "", "", "TCP:RTCM3:127.0.0.1:7777")]
    #[case("MOUNT", "", "secret", "TCP:RTCM3:127.0.0.1:7777")]
    #[case("", "user", "secret", "TCP:RTCM3:127.0.0.1:7777")]
    #[case("MOUNT", "user", "secret", "TCP:RTCM3:127.0.0.1:7777:MOUNT:user:secret")]
    #[case("MOUNT", "user", "", "TCP:RTCM3:127.0.0.1:7777:MOUNT:user:")]
    fn client_endpoint(
        #[case] mount: &str,
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: &str,
    ) {
        let cfg = RtkLinkConfig::default().with_ntrip(mount, username, password);
        assert_eq!(Endpoint::client(&cfg).to_string(), expected);
    }

    #[test]
    fn ublox_client_endpoint() {
        let mut cfg = RtkLinkConfig::default().with_server("caster.example.net", 2101);
        cfg.protocol = CorrectionProtocol::Ublox;
        assert_eq!(
            Endpoint::client(&cfg).to_string(),
            "TCP:UBLOX:caster.example.net:2101"
        );
    }

    #[test]
    fn host_endpoint() {
        let cfg = RtkLinkConfig::default()
            .with_server("0.0.0.0", 2000)
            .with_ntrip("MOUNT", "user", "secret");
        assert_eq!(Endpoint::host(&cfg).to_string(), "TCP:0.0.0.0:2000");
    }

    #[test]
    fn shared_config_provider() {
        let shared = Arc::new(RwLock::new(RtkLinkConfig::default()));
        assert_eq!(shared.rtk_config().server_port, 7777);

        if let Ok(mut cfg) = shared.write() {
            cfg.server_port = 2101;
        }
        assert_eq!(shared.rtk_config().server_port, 2101);
    }

    #[test]
    fn std_duration() {
        assert_eq!(
            to_std_duration(Duration::from_seconds(2.5)),
            std::time::Duration::from_millis(2500)
        );
        assert_eq!(
            to_std_duration(Duration::from_seconds(-1.0)),
            std::time::Duration::ZERO
        );
    }
}
