use std::time::Instant;

/// Monotonic node clock, zeroed at node start.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since start.
    pub fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since start.
    pub fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Wall-clock seconds since the Unix epoch, as carried in frame AAD.
    pub fn wall_secs() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}
