use chrono::{DateTime, Utc};
use std::fmt;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

// Time remaining until the event. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeLeft {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeLeft {
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = (target - now).num_seconds();
        if remaining <= 0 {
            return TimeLeft::default();
        }

        Self {
            days: (remaining / SECONDS_PER_DAY) as u64,
            hours: ((remaining % SECONDS_PER_DAY) / SECONDS_PER_HOUR) as u64,
            minutes: ((remaining % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u64,
            seconds: (remaining % SECONDS_PER_MINUTE) as u64,
        }
    }

    pub fn is_over(&self) -> bool {
        *self == TimeLeft::default()
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
