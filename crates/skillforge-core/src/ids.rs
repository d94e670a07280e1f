//! Monotonic, time-based record ids.

use chrono::Utc;

/// Hands out millisecond-timestamp ids that never repeat within one generator:
/// if the clock has not moved past the previous id, the next id is previous + 1.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.last = if now > self.last { now } else { self.last + 1 };
        self.last
    }

    /// String form, used for goal and course ids.
    pub fn next_string(&mut self) -> String {
        self.next_id().to_string()
    }
}
