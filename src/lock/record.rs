// src/lock/record.rs

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Contents of a lock record file: `"{pid}\n{acquired_at_ms}\n"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRecord {
    pub pid: u32,
    /// Milliseconds since the Unix epoch.
    pub acquired_at_ms: u64,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl LockRecord {
    pub fn for_current_process() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: now_ms(),
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        let pid = lines.next()?.trim().parse().ok()?;
        let acquired_at_ms = lines.next()?.trim().parse().ok()?;
        Some(Self {
            pid,
            acquired_at_ms,
        })
    }

    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.pid, self.acquired_at_ms)
    }

    /// Age relative to `now_ms`; records from the future have zero age.
    pub fn age_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.acquired_at_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_rendered_records() {
        let rec = LockRecord {
            pid: 4242,
            acquired_at_ms: 1_700_000_000_123,
        };
        assert_eq!(LockRecord::parse(&rec.render()), Some(rec));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(LockRecord::parse(""), None);
        assert_eq!(LockRecord::parse("abc\n1\n"), None);
        assert_eq!(LockRecord::parse("12\n"), None);
    }

    #[test]
    fn future_records_have_zero_age() {
        let rec = LockRecord {
            pid: 1,
            acquired_at_ms: 5_000,
        };
        assert_eq!(rec.age_at(4_000), Duration::ZERO);
        assert_eq!(rec.age_at(6_500), Duration::from_millis(1_500));
    }
}
