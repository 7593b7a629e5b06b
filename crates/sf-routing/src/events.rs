//! Routing event windows and the gate that skips routing between them.

use sf_core::Ticks;
use tracing::{info, warn};

/// Half-open window `[start, end)` of routing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: Ticks,
    pub end: Ticks,
}

impl EventWindow {
    pub fn new(start: Ticks, end: Ticks) -> Self {
        Self { start, end }
    }
}

/// Sort windows by start and clip each end back to its successor's start.
///
/// Returns the number of windows that had to be shortened.
pub fn sort_events(events: &mut [EventWindow]) -> usize {
    events.sort_by_key(|e| e.start);
    let mut clipped = 0;
    for i in 1..events.len() {
        let next_start = events[i].start;
        let prev = &mut events[i - 1];
        if prev.end > next_start {
            warn!(
                start_ms = prev.start.0,
                end_ms = prev.end.0,
                clipped_to_ms = next_start.0,
                "routing event overlaps its successor; end clipped"
            );
            prev.end = next_start;
            clipped += 1;
        }
    }
    clipped
}

/// Whether routing is currently gated off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    BetweenEvents,
    InEvent,
}

/// Tracks the pending event and whether the clock is inside it.
///
/// With no events configured the gate is permanently `InEvent`. After the
/// last event ends it stays `BetweenEvents`.
#[derive(Debug, Clone)]
pub struct EventGate {
    events: Vec<EventWindow>,
    next: usize,
    state: GateState,
}

impl EventGate {
    pub fn new(mut events: Vec<EventWindow>) -> Self {
        sort_events(&mut events);
        let state = if events.is_empty() {
            GateState::InEvent
        } else {
            GateState::BetweenEvents
        };
        Self {
            events,
            next: 0,
            state,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[EventWindow] {
        &self.events
    }

    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn between_events(&self) -> bool {
        self.state == GateState::BetweenEvents
    }

    /// Start of the pending event, or `Ticks::NEVER` once all have passed.
    pub fn pending_start(&self) -> Ticks {
        self.events.get(self.next).map_or(Ticks::NEVER, |e| e.start)
    }

    /// Update the gate for a step running from `old` to `new`.
    ///
    /// A step is routed when any part of it lies inside an event: the gate
    /// leaves an event only once the step starts at or after its end, and
    /// enters one as soon as the step reaches its start.
    pub fn update(&mut self, old: Ticks, new: Ticks) -> GateState {
        if !self.is_configured() {
            return self.state;
        }
        while let Some(event) = self.events.get(self.next) {
            if old < event.end {
                break;
            }
            if self.state == GateState::InEvent {
                info!(event = self.next, "routing event ended");
            }
            self.state = GateState::BetweenEvents;
            self.next += 1;
        }
        if self.state == GateState::BetweenEvents {
            if let Some(event) = self.events.get(self.next) {
                if new >= event.start {
                    info!(event = self.next, "routing event started");
                    self.state = GateState::InEvent;
                }
            }
        }
        self.state
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn windows() -> impl Strategy<Value = Vec<EventWindow>> {
        prop::collection::vec((0_i64..10_000, 1_i64..5_000), 0..12).prop_map(|v| {
            v.into_iter()
                .map(|(s, len)| EventWindow::new(Ticks(s), Ticks(s + len)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn sorted_output_is_ascending_and_disjoint(mut events in windows()) {
            sort_events(&mut events);
            for pair in events.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        #[test]
        fn sorting_is_idempotent(mut events in windows()) {
            sort_events(&mut events);
            let once = events.clone();
            prop_assert_eq!(sort_events(&mut events), 0);
            prop_assert_eq!(events, once);
        }
    }
}
