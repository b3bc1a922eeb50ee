//! Elapsed-time gate for the tick loop.

/// A repeating "have N milliseconds elapsed" gate driven by caller-supplied
/// timestamps.
///
/// The timer holds no clock of its own; [`IntervalTimer::ready`] is handed
/// the current time on every tick and burns down the remaining interval by
/// the observed elapsed time. The first interval starts on the first call.
/// A timestamp that jumps backwards (device clock resync) re-arms the
/// reference point instead of firing early.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval_ms: u64,
    remaining_ms: u64,
    last_ms: Option<u64>,
}

impl IntervalTimer {
    /// Create a timer that fires every `interval_ms` milliseconds.
    pub fn new(interval_ms: u64) -> Self {
        IntervalTimer {
            interval_ms,
            remaining_ms: interval_ms,
            last_ms: None,
        }
    }

    /// Burn down the interval to `now_ms`. Returns true when the interval
    /// has fully elapsed, re-arming for the next one.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        let last = *self.last_ms.get_or_insert(now_ms);
        if now_ms < last {
            // Clock went backwards; measure from the new reference.
            self.last_ms = Some(now_ms);
            return false;
        }

        self.last_ms = Some(now_ms);
        self.remaining_ms = self.remaining_ms.saturating_sub(now_ms - last);

        if self.remaining_ms == 0 {
            self.remaining_ms = self.interval_ms;
            true
        } else {
            false
        }
    }
}
