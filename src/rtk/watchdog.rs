use log::{debug, error};

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, TryLockError,
    },
    thread::JoinHandle,
    time::Instant,
};

use crate::{
    rtk::{
        connector::{to_std_duration, ConfigProvider, Connector, Sleeper},
        RtkLinkManager,
    },
};

/// Background thread granularity: period changes and stop requests
/// are taken into account within this delay.
const POLL_PERIOD: std::time::Duration = std::time::Duration::from_millis(5);

/// Outcome of one [Watchdog] evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Watchdog is not running
    Disarmed,
    /// Byte count increased
    Traffic,
    /// No traffic for this many consecutive ticks, still tolerated
    Quiet(u32),
    /// Tolerance reached
    Stalled(u32),
}

/// Traffic stall detector
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Watchdog {
    running: bool,
    baseline: u64,
    quiet_ticks: u32,
}

impl Watchdog {
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns true if this actually started the [Watchdog].
    pub fn start(&mut self) -> bool {
        let started = !self.running;
        self.running = true;
        started
    }

    /// Stops and resets the [Watchdog].
    pub fn stop(&mut self) {
        self.running = false;
        self.baseline = 0;
        self.quiet_ticks = 0;
    }

    /// Evaluates latest `byte_count`.
    pub fn evaluate(&mut self, byte_count: u64, tolerance: u32) -> Verdict {
        if !self.running {
            return Verdict::Disarmed;
        }

        if byte_count == self.baseline {
            self.quiet_ticks += 1;
            if self.quiet_ticks >= tolerance {
                Verdict::Stalled(self.quiet_ticks)
            } else {
                Verdict::Quiet(self.quiet_ticks)
            }
        } else {
            self.baseline = byte_count;
            self.quiet_ticks = 0;
            Verdict::Traffic
        }
    }

    /// Restarts stall detection from `byte_count`, after a reconnection.
    pub fn rearm(&mut self, byte_count: u64) {
        self.baseline = byte_count;
        self.quiet_ticks = 0;
    }
}

/// Handle on a background watchdog thread, see [spawn_watchdog].
/// The thread is stopped when this is dropped.
#[derive(Debug)]
pub struct WatchdogHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatchdogHandle {
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stops the thread and waits for it.
    /// Calling this more than once has no effect.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("rtk watchdog thread panicked");
            }
        }
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticks the shared [RtkLinkManager] from a dedicated thread, every
/// [RtkLinkConfig::watchdog_period_s](crate::prelude::RtkLinkConfig::watchdog_period_s).
/// The period is read again from the manager's [ConfigProvider] on every poll.
/// Ticks that find the manager busy (typically, in a connection attempt)
/// are skipped.
pub fn spawn_watchdog<N, S, P>(manager: Arc<Mutex<RtkLinkManager<N, S, P>>>) -> WatchdogHandle
where
    N: Connector + Send + 'static,
    S: Sleeper + Send + 'static,
    P: ConfigProvider + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let thread = std::thread::spawn(move || {
        let mut period = std::time::Duration::ZERO;
        let mut last_tick = Instant::now();

        while !stop_flag.load(Ordering::Relaxed) {
            std::thread::sleep(POLL_PERIOD);

            match manager.try_lock() {
                Ok(mut manager) => {
                    period = to_std_duration(manager.watchdog_period());
                    if last_tick.elapsed() >= period {
                        manager.tick();
                        last_tick = Instant::now();
                    }
                },
                Err(TryLockError::WouldBlock) => {
                    if last_tick.elapsed() >= period {
                        debug!("rtk link busy: watchdog tick skipped");
                        last_tick = Instant::now();
                    }
                },
                Err(TryLockError::Poisoned(_)) => {
                    error!("rtk link manager poisoned: stopping watchdog");
                    break;
                },
            }
        }
    });

    WatchdogHandle {
        stop,
        thread: Some(thread),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disarmed() {
        let mut watchdog = Watchdog::default();
        assert!(!watchdog.is_running());
        for _ in 0..10 {
            assert_eq!(watchdog.evaluate(0, 1), Verdict::Disarmed);
        }
    }

    #[test]
    fn stall_detection() {
        let mut watchdog = Watchdog::default();
        assert!(watchdog.start());

        assert_eq!(watchdog.evaluate(100, 3), Verdict::Traffic);
        assert_eq!(watchdog.evaluate(100, 3), Verdict::Quiet(1));
        assert_eq!(watchdog.evaluate(100, 3), Verdict::Quiet(2));
        assert_eq!(watchdog.evaluate(150, 3), Verdict::Traffic);
        assert_eq!(watchdog.evaluate(150, 3), Verdict::Quiet(1));
        assert_eq!(watchdog.evaluate(150, 3), Verdict::Quiet(2));
        assert_eq!(watchdog.evaluate(150, 3), Verdict::Stalled(3));

        watchdog.rearm(150);
        assert_eq!(watchdog.evaluate(150, 3), Verdict::Quiet(1));
    }

    #[test]
    fn idempotent_start_stop() {
        let mut watchdog = Watchdog::default();
        assert!(watchdog.start());
        assert_eq!(watchdog.evaluate(0, 5), Verdict::Quiet(1));

        // restarting a running watchdog does not reset it
        assert!(!watchdog.start());
        assert_eq!(watchdog.evaluate(0, 5), Verdict::Quiet(2));

        watchdog.stop();
        watchdog.stop();
        assert_eq!(watchdog, Watchdog::default());

        assert!(watchdog.start());
        assert_eq!(watchdog.evaluate(0, 5), Verdict::Quiet(1));
    }
}
