//! Booking availability math
//!
//! Times are carried as UTC instants; business hours are interpreted in the
//! configured fixed offset so day boundaries match the marina's wall clock.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Opening hours for bookable work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: Vec<u32>,
    /// Minutes east of UTC
    pub utc_offset_minutes: i32,
    /// Per-weekday hours; when non-empty they replace `start`, `end` and
    /// `days_of_week`
    #[serde(default)]
    pub per_day: Vec<DayHours>,
}

/// Opening window for one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u32,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            days_of_week: vec![1, 2, 3, 4, 5, 6],
            utc_offset_minutes: -8 * 60,
            per_day: Vec::new(),
        }
    }
}

impl BusinessHours {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.window(date).is_some()
    }

    /// Opening and closing time on `date`, `None` when closed
    pub fn window(&self, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        let weekday = date.weekday().num_days_from_sunday();
        if self.per_day.is_empty() {
            return self
                .days_of_week
                .contains(&weekday)
                .then_some((self.start, self.end));
        }
        self.per_day
            .iter()
            .find(|d| d.day_of_week == weekday && d.open < d.close)
            .map(|d| (d.open, d.close))
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.offset()
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Time range already taken on the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bookable slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Local calendar date, YYYY-MM-DD
    pub date: String,
    /// Local start time, e.g. "08:00 AM"
    pub time: String,
}

/// Longest bookable slot and largest buffer, in minutes
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

/// Widest availability query
pub const MAX_RANGE_DAYS: i64 = 90;

/// Whether `busy` collides with [start, end] widened by `buffer_minutes` on each side
///
/// A buffer too large to represent widens the window to the end of time.
pub fn overlaps(busy: &BusyPeriod, start: DateTime<Utc>, end: DateTime<Utc>, buffer_minutes: i64) -> bool {
    let buffer = Duration::try_minutes(buffer_minutes.max(0));
    let lower = buffer
        .and_then(|b| start.checked_sub_signed(b))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let upper = buffer
        .and_then(|b| end.checked_add_signed(b))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    busy.start < upper && busy.end > lower
}

pub fn is_slot_available(
    busy: &[BusyPeriod],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    buffer_minutes: i64,
) -> bool {
    !busy.iter().any(|b| overlaps(b, start, end, buffer_minutes))
}

/// Enumerate free slots of `duration_minutes` between `range_start` and `range_end`
///
/// Each business day is walked from opening time; consecutive candidate slots
/// are `duration + buffer` apart and a slot never runs past closing time.
pub fn available_slots(
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    hours: &BusinessHours,
    duration_minutes: i64,
    buffer_minutes: i64,
    busy: &[BusyPeriod],
) -> Vec<TimeSlot> {
    let mut slots = Vec::new();
    if duration_minutes <= 0 {
        return slots;
    }

    let offset = hours.offset();
    let (Some(duration), Some(step)) = (
        Duration::try_minutes(duration_minutes),
        duration_minutes
            .checked_add(buffer_minutes.max(0))
            .and_then(Duration::try_minutes),
    ) else {
        return slots;
    };

    let mut day = range_start.with_timezone(&offset).date_naive();
    loop {
        let Some(day_start) = hours.at(day, NaiveTime::MIN) else {
            break;
        };
        if day_start > range_end {
            break;
        }

        if let Some((open_at, close_at)) = hours.window(day) {
            if let (Some(open), Some(close)) = (hours.at(day, open_at), hours.at(day, close_at)) {
                let mut slot_start = open;
                while slot_start < close {
                    let Some(slot_end) = slot_start.checked_add_signed(duration) else {
                        break;
                    };
                    if slot_end > close {
                        break;
                    }
                    if is_slot_available(busy, slot_start, slot_end, buffer_minutes) {
                        let local = slot_start.with_timezone(&offset);
                        slots.push(TimeSlot {
                            start: slot_start,
                            end: slot_end,
                            date: day.format("%Y-%m-%d").to_string(),
                            time: local.format("%I:%M %p").to_string(),
                        });
                    }
                    let Some(next_start) = slot_start.checked_add_signed(step) else {
                        break;
                    };
                    slot_start = next_start;
                }
            }
        }

        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
    }

    slots
}

/// Whole-day busy periods for blackout ranges, both ends inclusive
pub fn blackout_periods(ranges: &[(NaiveDate, NaiveDate)], hours: &BusinessHours) -> Vec<BusyPeriod> {
    ranges
        .iter()
        .filter_map(|(first, last)| {
            let start = hours.at(*first, NaiveTime::MIN)?;
            let end = hours.at(last.succ_opt()?, NaiveTime::MIN)?;
            Some(BusyPeriod { start, end })
        })
        .collect()
}

/// Months between visits for a recurring service interval
///
/// Unknown intervals fall back to two months; one-time service has none.
pub fn interval_months(interval: &str) -> Option<i64> {
    match interval {
        "one-time" => None,
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        "6" => Some(6),
        _ => Some(2),
    }
}

/// Next visit date counted in 30-day months
pub fn next_service_date(from: DateTime<Utc>, interval: &str) -> Option<DateTime<Utc>> {
    interval_months(interval).map(|months| from + Duration::days(months * 30))
}
