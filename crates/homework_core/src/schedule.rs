//! Reset boundaries for daily and weekly checklists.
//!
//! All arithmetic happens in one fixed reference offset. A reset is due when
//! the last reset happened strictly before the most recent boundary at or
//! before `now`; an unknown last reset is always due.

use crate::error::AppError;
use time::macros::{offset, time};
use time::{Duration, OffsetDateTime, Time, UtcOffset, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    daily_at: Time,
    weekly_weekday: Weekday,
    weekly_at: Time,
    offset: UtcOffset,
}

impl Default for ResetSchedule {
    fn default() -> Self {
        Self {
            daily_at: time!(6:00),
            weekly_weekday: Weekday::Monday,
            weekly_at: time!(6:00),
            offset: offset!(+9),
        }
    }
}

impl ResetSchedule {
    pub fn new(
        daily_hour: u8,
        weekly_weekday: Weekday,
        weekly_hour: u8,
        offset: UtcOffset,
    ) -> Result<Self, AppError> {
        Ok(Self {
            daily_at: cutover(daily_hour, "daily reset hour")?,
            weekly_weekday,
            weekly_at: cutover(weekly_hour, "weekly reset hour")?,
            offset,
        })
    }

    pub fn daily_hour(&self) -> u8 {
        self.daily_at.hour()
    }

    pub fn weekly_weekday(&self) -> Weekday {
        self.weekly_weekday
    }

    pub fn weekly_hour(&self) -> u8 {
        self.weekly_at.hour()
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Today's daily cutover, or yesterday's when `now` is still before it.
    pub fn most_recent_daily_boundary(&self, now: OffsetDateTime) -> OffsetDateTime {
        let local = now.to_offset(self.offset);
        let today = local
            .date()
            .with_time(self.daily_at)
            .assume_offset(self.offset);
        if today > now {
            today - Duration::days(1)
        } else {
            today
        }
    }

    /// The latest `weekly_weekday` cutover at or before `now`.
    pub fn most_recent_weekly_boundary(&self, now: OffsetDateTime) -> OffsetDateTime {
        let local = now.to_offset(self.offset);
        let days_back = (i64::from(local.weekday().number_days_from_monday()) + 7
            - i64::from(self.weekly_weekday.number_days_from_monday()))
            % 7;
        let boundary = (local.date() - Duration::days(days_back))
            .with_time(self.weekly_at)
            .assume_offset(self.offset);
        if boundary > now {
            boundary - Duration::days(7)
        } else {
            boundary
        }
    }

    pub fn is_daily_reset_due(&self, now: OffsetDateTime, last: Option<OffsetDateTime>) -> bool {
        is_due(self.most_recent_daily_boundary(now), last)
    }

    pub fn is_weekly_reset_due(&self, now: OffsetDateTime, last: Option<OffsetDateTime>) -> bool {
        is_due(self.most_recent_weekly_boundary(now), last)
    }
}

fn is_due(boundary: OffsetDateTime, last: Option<OffsetDateTime>) -> bool {
    match last {
        Some(last) => last < boundary,
        None => true,
    }
}

fn cutover(hour: u8, label: &str) -> Result<Time, AppError> {
    Time::from_hms(hour, 0, 0)
        .map_err(|_| AppError::invalid_input(format!("{label} must be between 0 and 23")))
}
