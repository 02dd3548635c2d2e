use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, TimeZone, Utc, Weekday};

/// Quick snooze choices offered next to the free date/time picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozePreset {
    /// Four hours from now.
    LaterToday,
    /// 08:00 tomorrow.
    Tomorrow,
    /// 08:00 the day after tomorrow.
    DayAfterTomorrow,
    /// Friday 17:00, or the following Friday once that has passed.
    ThisWeekend,
    /// 08:00 next Monday.
    NextWeek,
}

const MORNING_HOUR: u32 = 8;
const WEEKEND_HOUR: u32 = 17;

impl SnoozePreset {
    pub const ALL: [SnoozePreset; 5] = [
        Self::LaterToday,
        Self::Tomorrow,
        Self::DayAfterTomorrow,
        Self::ThisWeekend,
        Self::NextWeek,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LaterToday => "Later Today (+4h)",
            Self::Tomorrow => "Tomorrow (8 AM)",
            Self::DayAfterTomorrow => "Day After Tomorrow (8 AM)",
            Self::ThisWeekend => "This Weekend (Fri 5 PM)",
            Self::NextWeek => "Next Week (Mon 8 AM)",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "later-today" | "later" => Some(Self::LaterToday),
            "tomorrow" => Some(Self::Tomorrow),
            "day-after-tomorrow" => Some(Self::DayAfterTomorrow),
            "this-weekend" | "weekend" => Some(Self::ThisWeekend),
            "next-week" => Some(Self::NextWeek),
            _ => None,
        }
    }

    /// Resolve against the caller's wall clock. Calendar presets are computed in
    /// `now`'s time zone; the result is always strictly after `now`.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let resolved = match self {
            Self::LaterToday => return Some(now.with_timezone(&Utc) + Duration::hours(4)),
            Self::Tomorrow => at_local(now, today.checked_add_days(Days::new(1))?, MORNING_HOUR)?,
            Self::DayAfterTomorrow => {
                at_local(now, today.checked_add_days(Days::new(2))?, MORNING_HOUR)?
            }
            Self::ThisWeekend => {
                let ahead = days_until(today.weekday(), Weekday::Fri);
                let friday = at_local(now, today.checked_add_days(Days::new(ahead))?, WEEKEND_HOUR)?;
                if friday > now.with_timezone(&Utc) {
                    friday
                } else {
                    at_local(now, today.checked_add_days(Days::new(ahead + 7))?, WEEKEND_HOUR)?
                }
            }
            Self::NextWeek => {
                let ahead = match days_until(today.weekday(), Weekday::Mon) {
                    0 => 7,
                    n => n,
                };
                at_local(now, today.checked_add_days(Days::new(ahead))?, MORNING_HOUR)?
            }
        };
        Some(resolved)
    }
}

fn days_until(from: Weekday, to: Weekday) -> u64 {
    let from = u64::from(from.num_days_from_monday());
    let to = u64::from(to.num_days_from_monday());
    (to + 7 - from) % 7
}

fn at_local<Tz: TimeZone>(
    now: &DateTime<Tz>,
    date: chrono::NaiveDate,
    hour: u32,
) -> Option<DateTime<Utc>> {
    let naive = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?);
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
