//! Control-rule timing and a date-scheduled rule set.

use chrono::NaiveDateTime;
use sf_core::{LinkId, Real, Ticks};
use sf_network::Network;
use tracing::debug;

use crate::traits::ControlRules;

/// Tracks when control rules are next due.
///
/// With no interval, rules are evaluated every step. Otherwise they are
/// evaluated when the routing clock lands on the scheduled instant, which
/// then moves forward by one interval once the clock reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTimer {
    interval: Option<Ticks>,
    next: Ticks,
}

impl RuleTimer {
    /// `interval_s <= 0` means "every step".
    pub fn new(interval_s: Real) -> Self {
        let interval = (interval_s > 0.0)
            .then(|| Ticks::from_secs(interval_s))
            .filter(|t| t.0 > 0);
        Self {
            interval,
            next: Ticks::ZERO,
        }
    }

    pub fn interval(&self) -> Option<Ticks> {
        self.interval
    }

    /// Next scheduled evaluation instant.
    pub fn next(&self) -> Ticks {
        self.next
    }

    /// Whether rules should be evaluated at `now`.
    pub fn due(&self, now: Ticks) -> bool {
        self.interval.is_none() || now.within_one_tick(self.next)
    }

    /// Move the schedule forward once the clock has reached it.
    pub fn advance_if_reached(&mut self, now: Ticks) {
        if let Some(interval) = self.interval {
            if now.0.saturating_add(1) >= self.next.0 {
                self.next = self.next + interval;
            }
        }
    }

    /// Shorten `step` so the clock lands exactly on the next evaluation instant.
    pub fn clip_step(&self, now: Ticks, step: Real) -> Real {
        if self.interval.is_none() || self.next <= now {
            return step;
        }
        let until = now.secs_until(self.next);
        if until < step { until } else { step }
    }
}

/// Sets a link's target setting once the simulation date reaches `at`.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingRule {
    pub link: LinkId,
    pub at: NaiveDateTime,
    pub setting: Real,
    pub fired: bool,
}

impl SettingRule {
    pub fn new(link: LinkId, at: NaiveDateTime, setting: Real) -> Self {
        Self {
            link,
            at,
            setting,
            fired: false,
        }
    }
}

/// Time-scheduled control rules.
#[derive(Debug, Clone, Default)]
pub struct ScheduledSettings {
    rules: Vec<SettingRule>,
}

impl ScheduledSettings {
    pub fn new(mut rules: Vec<SettingRule>) -> Self {
        rules.sort_by_key(|r| r.at);
        Self { rules }
    }

    pub fn rules(&self) -> &[SettingRule] {
        &self.rules
    }
}

impl ControlRules for ScheduledSettings {
    fn evaluate(&mut self, network: &mut Network, date: NaiveDateTime, _: Real, _: Real) {
        for rule in self.rules.iter_mut().filter(|r| !r.fired && r.at <= date) {
            rule.fired = true;
            if let Some(link) = network.link_mut(rule.link) {
                debug!(link = %link.name, setting = rule.setting, %date, "rule fired");
                link.target_setting = rule.setting;
            }
        }
    }
}
