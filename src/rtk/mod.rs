//! RTK corrections link supervision.
use log::{debug, error, info, warn};

use std::collections::VecDeque;

use crate::{
    cfg::RtkMode,
    constants::RTK_EVENT_JOURNAL_CAPACITY,
    prelude::{Duration, Error},
};

mod connector;
mod watchdog;

pub use connector::{
    ConfigProvider, Connector, Endpoint, NtripCredentials, Sleeper, ThreadSleeper,
};
pub use watchdog::{spawn_watchdog, WatchdogHandle};

use watchdog::{Verdict, Watchdog};

/// Role of an established link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtkRole {
    /// Receiving corrections
    Rover,
    /// Serving corrections
    Base,
    /// Dual antenna heading
    Compassing,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RtkLinkState {
    #[default]
    Idle,
    /// Connection attempt(s) in progress
    Connecting,
    Connected(RtkRole),
    /// Watchdog detected a traffic interruption
    Stalled,
    /// Gave up: requires a new [RtkLinkManager::connect] or
    /// [RtkLinkManager::configure] call
    Failed,
}

impl std::fmt::Display for RtkLinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected(RtkRole::Rover) => write!(f, "connected (rover)"),
            Self::Connected(RtkRole::Base) => write!(f, "connected (base)"),
            Self::Connected(RtkRole::Compassing) => write!(f, "connected (compassing)"),
            Self::Stalled => write!(f, "stalled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Diagnostics emitted by the [RtkLinkManager]
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    StateChanged {
        from: RtkLinkState,
        to: RtkLinkState,
    },
    AttemptFailed {
        endpoint: String,
        attempt: u32,
        error: Error,
    },
    RetryScheduled {
        attempt: u32,
        delay: Duration,
    },
    GaveUp {
        attempts: u32,
    },
    /// Link configuration did not validate, no attempt was made
    ConfigRejected {
        error: Error,
    },
    TrafficStalled {
        byte_count: u64,
        quiet_ticks: u32,
    },
}

/// [RtkLinkManager] establishes and supervises the corrections link.
///
/// It keeps a journal of the latest [LinkEvent]s (oldest dropped first),
/// see [RtkLinkManager::drain_events].
///
/// Connection attempts block (transport and backoff), so the manager
/// should be driven from outside the sensor data path, for example
/// with [spawn_watchdog].
pub struct RtkLinkManager<N: Connector, S: Sleeper, P: ConfigProvider> {
    connector: N,
    sleeper: S,
    config: P,
    mode: RtkMode,
    state: RtkLinkState,
    watchdog: Watchdog,
    events: VecDeque<LinkEvent>,
}

impl<N: Connector, S: Sleeper, P: ConfigProvider> RtkLinkManager<N, S, P> {
    pub fn new(connector: N, sleeper: S, config: P) -> Self {
        Self {
            connector,
            sleeper,
            config,
            mode: Default::default(),
            state: Default::default(),
            watchdog: Default::default(),
            events: Default::default(),
        }
    }

    pub fn state(&self) -> RtkLinkState {
        self.state
    }

    pub fn mode(&self) -> RtkMode {
        self.mode
    }

    pub fn connector(&self) -> &N {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut N {
        &mut self.connector
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Live byte counter of the active link
    pub fn byte_count(&self) -> u64 {
        self.connector.byte_count()
    }

    pub fn watchdog_running(&self) -> bool {
        self.watchdog.is_running()
    }

    /// Watchdog tick period, from the current configuration
    pub fn watchdog_period(&self) -> Duration {
        self.config.rtk_config().watchdog_period()
    }

    /// Takes all pending [LinkEvent]s, oldest first.
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        self.events.drain(..).collect()
    }

    /// Applies the [RtkMode]:
    /// - [RtkMode::Rover]: connects to the caster, then starts the
    ///   watchdog if enabled (even when the connection failed)
    /// - [RtkMode::RoverRadio]: corrections arrive by radio, no network link
    /// - [RtkMode::DualGnss]: compassing, no network link
    /// - [RtkMode::Base]: single attempt to create the corrections server
    /// - [RtkMode::Disabled]: nothing
    pub fn configure(&mut self, mode: RtkMode) -> Result<(), Error> {
        info!("rtk: configured as {}", mode);
        self.mode = mode;

        match mode {
            RtkMode::Disabled => {
                self.stop_watchdog();
                self.set_state(RtkLinkState::Idle);
                Ok(())
            },
            RtkMode::Rover => {
                let connection = self.connect();
                if self.config.rtk_config().watchdog_enabled {
                    self.start_watchdog();
                }
                connection
            },
            RtkMode::RoverRadio => {
                self.set_state(RtkLinkState::Connected(RtkRole::Rover));
                Ok(())
            },
            RtkMode::DualGnss => {
                self.set_state(RtkLinkState::Connected(RtkRole::Compassing));
                Ok(())
            },
            RtkMode::Base => self.host(),
        }
    }

    /// Connects to the caster, with up to `retry_limit` attempts and linear
    /// backoff in between. [RtkLinkConfig](crate::prelude::RtkLinkConfig)
    /// is read again on each call. Returns the last attempt's error on failure,
    /// leaving the link [RtkLinkState::Failed].
    pub fn connect(&mut self) -> Result<(), Error> {
        let cfg = self.config.rtk_config();
        if let Err(e) = cfg.validate() {
            error!("rtk: invalid link configuration: {}", e);
            self.record(LinkEvent::ConfigRejected { error: e.clone() });
            self.set_state(RtkLinkState::Failed);
            return Err(e);
        }

        let endpoint = Endpoint::client(&cfg);
        self.set_state(RtkLinkState::Connecting);

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.connector.connect(&endpoint) {
                Ok(()) => {
                    info!("rtk: connected to {}", endpoint);
                    self.set_state(RtkLinkState::Connected(RtkRole::Rover));
                    return Ok(());
                },
                Err(e) => {
                    error!("rtk: failed to connect to {}: {}", endpoint, e);
                    self.record(LinkEvent::AttemptFailed {
                        endpoint: endpoint.to_string(),
                        attempt,
                        error: e.clone(),
                    });

                    if attempt >= cfg.retry_limit {
                        error!("rtk: giving up after {} failed attempts", attempt);
                        self.record(LinkEvent::GaveUp { attempts: attempt });
                        self.set_state(RtkLinkState::Failed);
                        return Err(e);
                    }

                    let delay = cfg.backoff(attempt);
                    warn!("rtk: retrying connection in {}", delay);
                    self.record(LinkEvent::RetryScheduled { attempt, delay });
                    self.sleeper.sleep(delay);
                },
            }
        }
    }

    /// Creates the corrections server (base station). Single attempt.
    pub fn host(&mut self) -> Result<(), Error> {
        let cfg = self.config.rtk_config();
        let endpoint = Endpoint::host(&cfg);

        self.set_state(RtkLinkState::Connecting);

        match self.connector.host(&endpoint) {
            Ok(()) => {
                info!("rtk: serving corrections on {}", endpoint);
                self.set_state(RtkLinkState::Connected(RtkRole::Base));
                Ok(())
            },
            Err(e) => {
                error!("rtk: failed to create server {}: {}", endpoint, e);
                self.record(LinkEvent::AttemptFailed {
                    endpoint: endpoint.to_string(),
                    attempt: 1,
                    error: e.clone(),
                });
                self.set_state(RtkLinkState::Failed);
                Err(e)
            },
        }
    }

    /// Starts traffic supervision. No effect if already running.
    pub fn start_watchdog(&mut self) {
        if self.watchdog.start() {
            debug!("rtk: watchdog started");
        }
    }

    /// Stops traffic supervision and resets its state. No effect if not running.
    pub fn stop_watchdog(&mut self) {
        if self.watchdog.is_running() {
            debug!("rtk: watchdog stopped");
        }
        self.watchdog.stop();
    }

    /// Watchdog tick. Traffic is only evaluated on established links:
    /// a reconnection is attempted once the byte count did not move for
    /// `stall_tolerance_ticks` consecutive ticks.
    pub fn tick(&mut self) {
        if !self.watchdog.is_running() {
            return;
        }

        match self.state {
            RtkLinkState::Connected(_) => {},
            RtkLinkState::Connecting => {
                debug!("rtk: connection in progress, watchdog tick skipped");
                return;
            },
            _ => return,
        }

        let cfg = self.config.rtk_config();
        let byte_count = self.connector.byte_count();

        match self.watchdog.evaluate(byte_count, cfg.stall_tolerance_ticks) {
            Verdict::Stalled(quiet_ticks) => {
                warn!("rtk: transmission interruption, reconnecting..");
                self.record(LinkEvent::TrafficStalled {
                    byte_count,
                    quiet_ticks,
                });
                self.set_state(RtkLinkState::Stalled);

                if let Err(e) = self.connect() {
                    debug!("rtk: reconnection failed: {}", e);
                }

                self.watchdog.rearm(self.connector.byte_count());
            },
            Verdict::Quiet(quiet_ticks) => {
                debug!("rtk: no traffic for {} tick(s)", quiet_ticks);
            },
            Verdict::Traffic | Verdict::Disarmed => {},
        }
    }

    fn record(&mut self, event: LinkEvent) {
        if self.events.len() >= RTK_EVENT_JOURNAL_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn set_state(&mut self, state: RtkLinkState) {
        if self.state != state {
            debug!("rtk: {} -> {}", self.state, state);
            self.record(LinkEvent::StateChanged {
                from: self.state,
                to: state,
            });
            self.state = state;
        }
    }
}
