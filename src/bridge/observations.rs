use log::debug;

use crate::{
    bridge::messages::{GnssObservation, GnssTime},
    prelude::{Duration, Epoch},
};

/// Groups raw observations of one receiver epoch, which may be spread
/// over several sensor records.
#[derive(Debug, Clone)]
pub(crate) struct ObservationBundler {
    timeout: Duration,
    pending: Vec<GnssObservation>,
    last_received: Option<Epoch>,
}

impl ObservationBundler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: Vec::with_capacity(64),
            last_received: None,
        }
    }

    fn pending_time(&self) -> Option<GnssTime> {
        self.pending.first().map(|obs| obs.time)
    }

    /// Stores new observations, received at `now`. Returns the previous
    /// bundle when these observations belong to a new receiver epoch.
    pub fn push(
        &mut self,
        observations: &[GnssObservation],
        now: Epoch,
    ) -> Option<(GnssTime, Vec<GnssObservation>)> {
        let first = observations.first()?;

        let flushed = match self.pending_time() {
            Some(time) if time != first.time => self.take(),
            _ => None,
        };

        self.pending.extend_from_slice(observations);
        self.last_received = Some(now);
        flushed
    }

    /// Returns pending bundle if nothing was received for the timeout period.
    pub fn poll(&mut self, now: Epoch) -> Option<(GnssTime, Vec<GnssObservation>)> {
        let last_received = self.last_received?;
        if (now - last_received).abs() > self.timeout {
            self.take()
        } else {
            None
        }
    }

    fn take(&mut self) -> Option<(GnssTime, Vec<GnssObservation>)> {
        let time = self.pending_time()?;
        let bundle = std::mem::take(&mut self.pending);
        self.last_received = None;
        debug!(
            "{}.{:03} - {} observations",
            time.seconds,
            (time.subsec * 1.0E3) as u32,
            bundle.len()
        );
        Some((time, bundle))
    }
}
