use std::fmt;

use binread::BinRead;
use chrono::{DateTime, LocalResult, TimeZone, Utc};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Seconds between the FILETIME epoch (1601-01-01) and the UNIX epoch.
const UNIX_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// 100-nanosecond intervals per second.
const TICKS_PER_SEC: u64 = 10_000_000;

/// The FILETIME structure: a 64-bit count of 100-nanosecond intervals that
/// have elapsed since January 1, 1601, Coordinated Universal Time.
///
/// A value of zero means the timestamp was never set; values that do not fit
/// the calendar resolve to [`ResolvedTime::Unrepresentable`]. Neither case
/// is an error — both occur in real evidence.
#[derive(Clone, Copy, Default, PartialEq, Eq, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileTime(u64);

impl FileTime {
    /// The raw tick count as stored.
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Break the tick count down to civil UTC time.
    pub fn resolve(&self) -> ResolvedTime {
        if self.0 == 0 {
            return ResolvedTime::Unset;
        }
        let ticks = match i64::try_from(self.0) {
            Ok(ticks) => ticks,
            Err(_) => return ResolvedTime::Unrepresentable,
        };
        let secs = ticks / TICKS_PER_SEC as i64 - UNIX_EPOCH_OFFSET_SECS;
        let subsec_ticks = (self.0 % TICKS_PER_SEC) as u32;
        match Utc.timestamp_opt(secs, subsec_ticks * 100) {
            LocalResult::Single(utc) => ResolvedTime::Utc { utc, subsec_ticks },
            _ => ResolvedTime::Unrepresentable,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS (UTC)`, without sub-second detail.
    pub fn format_short(&self) -> String {
        self.resolve().format_short()
    }

    /// `YYYY-MM-DD HH:MM:SS.fffffff (UTC)`, keeping the 100ns fraction.
    pub fn format_long(&self) -> String {
        self.resolve().format_long()
    }
}

impl From<u64> for FileTime {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<FileTime> for u64 {
    fn from(val: FileTime) -> Self {
        val.0
    }
}

impl fmt::Debug for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_long())
    }
}

/// Outcome of converting a FILETIME to civil time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTime {
    /// The stored value was zero.
    Unset,

    /// The value falls outside the representable calendar range.
    Unrepresentable,

    /// Civil UTC time, plus the 100ns ticks within the second.
    Utc {
        utc: DateTime<Utc>,
        subsec_ticks: u32,
    },
}

impl ResolvedTime {
    pub fn format_short(&self) -> String {
        match self {
            Self::Unset => "[UNSET]".to_string(),
            Self::Unrepresentable => "[UNREPRESENTABLE]".to_string(),
            Self::Utc { utc, .. } => utc.format("%Y-%m-%d %H:%M:%S (UTC)").to_string(),
        }
    }

    pub fn format_long(&self) -> String {
        match self {
            Self::Utc { utc, subsec_ticks } => format!(
                "{}.{:07} (UTC)",
                utc.format("%Y-%m-%d %H:%M:%S"),
                subsec_ticks
            ),
            other => other.format_short(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unset_in_both_renderings() {
        let ft = FileTime::from(0);
        assert_eq!(ft.format_short(), "[UNSET]");
        assert_eq!(ft.format_long(), "[UNSET]");
    }

    #[test]
    fn known_date_round_trips() {
        // 2000-01-01 00:00:00 UTC.
        let secs: u64 = 11_644_473_600 + 946_684_800;
        let ft = FileTime::from(secs * TICKS_PER_SEC + 1_234_567);
        assert_eq!(ft.format_short(), "2000-01-01 00:00:00 (UTC)");
        assert_eq!(ft.format_long(), "2000-01-01 00:00:00.1234567 (UTC)");
    }

    #[test]
    fn out_of_range_is_unrepresentable() {
        let ft = FileTime::from(u64::MAX);
        assert_eq!(ft.resolve(), ResolvedTime::Unrepresentable);
        assert_eq!(ft.format_short(), "[UNREPRESENTABLE]");
    }

    #[test]
    fn epoch_is_1601() {
        let ft = FileTime::from(1);
        assert_eq!(ft.format_short(), "1601-01-01 00:00:00 (UTC)");
    }
}
