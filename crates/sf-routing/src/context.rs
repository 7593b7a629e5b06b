//! Simulation context shared by the driver and the routing engine.

use chrono::NaiveDateTime;
use sf_core::{Real, SimClock, Ticks};
use sf_network::Network;

use crate::traits::{InterfaceSource, RdiiSource};

/// Date-keyed forcing providers that are not attached to network objects.
#[derive(Default)]
pub struct Forcing {
    pub rdii: Option<Box<dyn RdiiSource>>,
    /// Present only when an interface file is in use.
    pub interface: Option<Box<dyn InterfaceSource>>,
}

impl std::fmt::Debug for Forcing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forcing")
            .field("rdii", &self.rdii.is_some())
            .field("interface", &self.interface.is_some())
            .finish()
    }
}

/// Everything a routing step reads or writes besides the engine's own state.
///
/// The driver owns this for the whole run and advances the runoff and report
/// clocks; the engine borrows it one call at a time.
#[derive(Debug)]
pub struct SimContext {
    pub network: Network,
    pub clock: SimClock,
    /// Last two instants at which runoff-side forcing was computed.
    pub old_runoff_time: Ticks,
    pub new_runoff_time: Ticks,
    /// Next reporting instant.
    pub report_time: Ticks,
    pub forcing: Forcing,
}

impl SimContext {
    pub fn new(network: Network, start: NaiveDateTime) -> Self {
        Self {
            network,
            clock: SimClock::new(start),
            old_runoff_time: Ticks::ZERO,
            new_runoff_time: Ticks::ZERO,
            report_time: Ticks::NEVER,
            forcing: Forcing::default(),
        }
    }

    /// Position of `t` between the last two runoff instants, clamped to [0, 1].
    pub fn runoff_fraction(&self, t: Ticks) -> Real {
        let span = self.new_runoff_time.0 - self.old_runoff_time.0;
        if span <= 0 {
            return 1.0;
        }
        ((t.0 - self.old_runoff_time.0) as Real / span as Real).clamp(0.0, 1.0)
    }

    /// Record that runoff-side forcing has been recomputed at `t`.
    pub fn advance_runoff_time(&mut self, t: Ticks) {
        self.old_runoff_time = self.new_runoff_time;
        self.new_runoff_time = t;
    }
}
