//! Search-input debounce.
//!
//! One outstanding deadline, rearmed on every keystroke, so request volume
//! is bounded to one per pause-in-typing rather than one per keystroke.

use crate::clock::WallClock;

/// Single-value debouncer. `input` rearms the deadline; `poll` fires the
/// settled value at most once per quiet period.
#[derive(Debug)]
pub struct Debouncer {
    delay_ms: u64,
    pending: Option<(String, WallClock)>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Buffer a new value, resetting the timer.
    pub fn input(&mut self, value: impl Into<String>, now: WallClock) {
        self.pending = Some((value.into(), now.plus(self.delay_ms)));
    }

    /// Take the settled value if the quiet period has elapsed.
    pub fn poll(&mut self, now: WallClock) -> Option<String> {
        match &self.pending {
            Some((_, fire_at)) if *fire_at <= now => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any buffered value without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_the_quiet_period() {
        let mut debouncer = Debouncer::new(300);

        // Keystrokes every 100ms for a second.
        let mut at = 0;
        for fragment in ["w", "wi", "wid", "widg", "widge", "widget"] {
            debouncer.input(fragment, WallClock(at));
            at += 100;
        }
        let last_keystroke = at - 100;

        // Nothing settles while typing continues or before 300ms of quiet.
        assert_eq!(debouncer.poll(WallClock(last_keystroke + 299)), None);

        let fired = debouncer.poll(WallClock(last_keystroke + 300));
        assert_eq!(fired.as_deref(), Some("widget"));

        // Exactly once.
        assert_eq!(debouncer.poll(WallClock(last_keystroke + 10_000)), None);
    }

    #[test]
    fn rearming_resets_the_deadline() {
        let mut debouncer = Debouncer::new(300);
        debouncer.input("a", WallClock(0));
        debouncer.input("ab", WallClock(250));

        assert_eq!(debouncer.poll(WallClock(300)), None);
        assert_eq!(debouncer.poll(WallClock(550)).as_deref(), Some("ab"));
    }

    #[test]
    fn cancel_disarms() {
        let mut debouncer = Debouncer::new(300);
        debouncer.input("a", WallClock(0));
        assert!(debouncer.is_armed());

        debouncer.cancel();
        assert_eq!(debouncer.poll(WallClock(1_000)), None);
    }
}
