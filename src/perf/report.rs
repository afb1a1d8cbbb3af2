use std::fmt;
use std::time::Duration;

// Floor for the elapsed interval so a sub-microsecond run divides by
// something nonzero and the reported rate stays finite.
const MIN_ELAPSED: Duration = Duration::from_micros(1);

/// Which way the payload flowed, as seen by the reporting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sent,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Received => write!(f, "Received"),
            Direction::Sent => write!(f, "Sent"),
        }
    }
}

/// Outcome of one measurement session. `bytes` counts payload only; the
/// termination marker and the ack are excluded on both sides.
#[derive(Debug, Clone, Copy)]
pub struct TransferSummary {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    pub fn kilobytes(&self) -> u64 {
        self.bytes / 1000
    }

    pub fn rate_mbps(&self) -> f64 {
        let secs = self.elapsed.max(MIN_ELAPSED).as_secs_f64();
        (self.bytes as f64 / 1e6) * 8.0 / secs
    }

    /// Console summary line, e.g. `Sent=100 KB, Rate=0.800 Mbps`.
    pub fn render(&self, direction: Direction) -> String {
        format!(
            "{}={} KB, Rate={:.3} Mbps",
            direction,
            self.kilobytes(),
            self.rate_mbps()
        )
    }
}
