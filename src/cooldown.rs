use crate::aggregate::LastEventMap;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    Denied { remaining_seconds: u64 },
}

/// Decides whether `user` may log another event at `now`.
///
/// The check looks at the user's most recent event of any drink kind. It is
/// advisory: two requests racing past it can both insert.
pub fn may_record(user: &str, last_events: &LastEventMap, now: DateTime<Utc>, cooldown: Duration) -> Gate {
    let Some(last) = last_events.get(user) else {
        return Gate::Allowed;
    };

    // A last event stamped ahead of `now` counts as just happened.
    let elapsed = (now - *last).max(Duration::zero());
    if elapsed >= cooldown {
        return Gate::Allowed;
    }

    let remaining = cooldown - elapsed;
    let whole = remaining.num_seconds().max(0) as u64;
    Gate::Denied {
        remaining_seconds: if remaining.subsec_nanos() > 0 { whole + 1 } else { whole },
    }
}
