//! Inter-arrival timing monitor used by the observer node.

use ve_protocol::{Diagnostic, is_valid_id};

use crate::timing::TimingTable;

/// Allowed deviation from a reference period, in microseconds.
pub const DEFAULT_TOLERANCE_US: u64 = 6_000;
/// A diagnostic stays latched at least this long before clearing.
pub const DEFAULT_RESET_WINDOW_US: u64 = 1_000_000;

/// What `TimingMonitor::observe` concluded about one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Id outside the tracked range; nothing was recorded.
    Discarded,
    /// Timing within tolerance and the id is known.
    Nominal,
    /// The message raised this diagnostic.
    Anomaly(Diagnostic),
}

/// Tracks receive timestamps and latches the most recent anomaly.
#[derive(Debug, Clone)]
pub struct TimingMonitor {
    last_receive: TimingTable,
    reference_ms: TimingTable,
    tolerance_us: u64,
    reset_window_us: u64,
    diagnostic: Diagnostic,
    last_anomaly_us: Option<u64>,
}

impl TimingMonitor {
    pub fn new(reference_ms: TimingTable) -> Self {
        Self {
            last_receive: TimingTable::new(),
            reference_ms,
            tolerance_us: DEFAULT_TOLERANCE_US,
            reset_window_us: DEFAULT_RESET_WINDOW_US,
            diagnostic: Diagnostic::Ok,
            last_anomaly_us: None,
        }
    }

    /// Monitor loaded with the reference period of every known id.
    pub fn reference_defaults() -> Self {
        Self::new(TimingTable::reference_defaults())
    }

    pub fn with_limits(mut self, tolerance_us: u64, reset_window_us: u64) -> Self {
        self.tolerance_us = tolerance_us;
        self.reset_window_us = reset_window_us;
        self
    }

    pub fn diagnostic(&self) -> Diagnostic {
        self.diagnostic
    }

    pub fn last_receive(&self, id: u32) -> Option<u64> {
        self.last_receive.get(id)
    }

    /// Latch `diagnostic` as the current anomaly.
    ///
    /// A repeat of the current diagnostic only refreshes its timestamp.
    pub fn raise(&mut self, diagnostic: Diagnostic, now_us: u64) {
        if diagnostic != self.diagnostic {
            tracing::warn!(
                code = diagnostic.code(),
                target = %format_args!("0x{:X}", diagnostic.target()),
                "observer anomaly"
            );
        }
        self.diagnostic = diagnostic;
        self.last_anomaly_us = Some(now_us);
    }

    fn expire(&mut self, now_us: u64) {
        let expired = self
            .last_anomaly_us
            .is_none_or(|at| now_us.saturating_sub(at) > self.reset_window_us);
        if expired {
            self.diagnostic = Diagnostic::Ok;
        }
    }

    /// Record one received message.
    ///
    /// `handle` decodes the message into node state and returns whether the
    /// id was recognised. It runs after the timing check and before the
    /// receive time is stored.
    pub fn observe<F>(&mut self, id: u32, now_us: u64, handle: F) -> Observation
    where
        F: FnOnce() -> bool,
    {
        if !is_valid_id(id) {
            tracing::debug!(id = %format_args!("0x{id:X}"), "ignoring out-of-range id");
            return Observation::Discarded;
        }

        self.expire(now_us);
        let mut raised = None;

        let previous = self.last_receive.get(id);
        let reference = self.reference_ms.get(id).filter(|r| *r != 0);
        if let (Some(last), Some(reference)) = (previous, reference) {
            let deviation = now_us as i64 - last as i64 - (reference * 1000) as i64;
            if deviation.unsigned_abs() > self.tolerance_us {
                tracing::debug!(
                    id = %format_args!("0x{id:03X}"),
                    reference_ms = reference,
                    deviation_us = deviation,
                    "timing deviation"
                );
                raised = Some(Diagnostic::BadTiming(id));
            }
        }

        if !handle() {
            raised = Some(Diagnostic::BadCanId(id));
        }

        self.last_receive.set(id, now_us);

        match raised {
            Some(diagnostic) => {
                self.raise(diagnostic, now_us);
                Observation::Anomaly(diagnostic)
            }
            None => Observation::Nominal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ve_protocol::Field;

    const MS: u64 = 1_000;

    #[test]
    fn on_time_messages_are_nominal() {
        let mut m = TimingMonitor::reference_defaults();
        assert_eq!(m.observe(0x43, 0, || true), Observation::Nominal);
        assert_eq!(m.observe(0x43, 10 * MS, || true), Observation::Nominal);
        assert_eq!(m.observe(0x43, 20 * MS + 5_999, || true), Observation::Nominal);
        assert!(m.diagnostic().is_ok());
    }

    #[test]
    fn late_message_is_bad_timing() {
        let mut m = TimingMonitor::reference_defaults();
        m.observe(0x43, 0, || true);
        let seen = m.observe(0x43, 20 * MS, || true);
        assert_eq!(seen, Observation::Anomaly(Diagnostic::BadTiming(0x43)));
        assert_eq!(m.diagnostic(), Diagnostic::BadTiming(0x43));
    }

    #[test]
    fn early_message_is_bad_timing() {
        let mut m = TimingMonitor::reference_defaults();
        m.observe(0x290, 0, || true);
        let seen = m.observe(0x290, 50 * MS, || true);
        assert_eq!(seen, Observation::Anomaly(Diagnostic::BadTiming(0x290)));
    }

    #[test]
    fn unknown_id_is_bad_can_id() {
        let mut m = TimingMonitor::reference_defaults();
        let seen = m.observe(0x7DF, 0, || false);
        assert_eq!(seen, Observation::Anomaly(Diagnostic::BadCanId(0x7DF)));
        assert_eq!(m.last_receive(0x7DF), Some(0));
    }

    #[test]
    fn bad_id_overrides_bad_timing() {
        let mut m = TimingMonitor::new({
            let mut refs = TimingTable::new();
            refs.set(0x500, 10);
            refs
        });
        m.observe(0x500, 0, || false);
        let seen = m.observe(0x500, 100 * MS, || false);
        assert_eq!(seen, Observation::Anomaly(Diagnostic::BadCanId(0x500)));
    }

    #[test]
    fn out_of_range_ids_touch_nothing() {
        let mut m = TimingMonitor::reference_defaults();
        m.observe(0x7DF, 0, || false);
        let before = m.diagnostic();

        let mut handled = false;
        let seen = m.observe(0x1000, 5 * 1_000_000, || {
            handled = true;
            true
        });
        assert_eq!(seen, Observation::Discarded);
        assert!(!handled);
        assert_eq!(m.diagnostic(), before);
        assert_eq!(m.observe(0xFFFF_FFFF, 0, || true), Observation::Discarded);
    }

    #[test]
    fn diagnostic_clears_after_reset_window() {
        let mut m = TimingMonitor::reference_defaults();
        m.observe(0x7DF, 0, || false);

        m.observe(0x43, 500 * MS, || true);
        assert_eq!(m.diagnostic(), Diagnostic::BadCanId(0x7DF));

        m.observe(0x43, 1_000 * MS + 1, || true);
        // 0x43 is now far off its 10 ms period, so it latches a new anomaly
        // after the old one was cleared.
        assert_eq!(m.diagnostic(), Diagnostic::BadTiming(0x43));

        m.observe(0x24, 2_100 * MS, || true);
        assert!(m.diagnostic().is_ok());
    }

    #[test]
    fn raised_value_diagnostics_latch() {
        let mut m = TimingMonitor::reference_defaults().with_limits(6_000, 1_000_000);
        m.raise(Diagnostic::BadValue(Field::Gear), 0);
        m.observe(0x43, 10 * MS, || true);
        assert_eq!(m.diagnostic(), Diagnostic::BadValue(Field::Gear));
    }
}
