use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One weekday's opening hours for a studio. `weekday` is 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub studio_id: String,
    pub weekday: u8,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub closed: bool,
}

impl DayHours {
    pub fn open(open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            open,
            close,
            closed: false,
        }
    }

    pub fn closed() -> Self {
        Self {
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            closed: true,
        }
    }
}

/// A studio's full week, indexed from Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyHours {
    days: [DayHours; 7],
}

impl Default for WeeklyHours {
    /// Monday to Saturday 10:00-18:00, closed Sunday.
    fn default() -> Self {
        let open = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN);
        let close = NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN);
        let mut days = [DayHours::open(open, close); 7];
        days[0] = DayHours::closed();
        Self { days }
    }
}

impl WeeklyHours {
    /// Build from stored rows. Weekdays without a row fall back to the default week.
    pub fn from_rows(rows: &[BusinessHours]) -> Self {
        let mut week = Self::default();
        for row in rows {
            if let Some(day) = week.days.get_mut(row.weekday as usize) {
                *day = if row.is_closed {
                    DayHours::closed()
                } else {
                    DayHours::open(row.open_time, row.close_time)
                };
            }
        }
        week
    }

    pub fn for_date(&self, date: NaiveDate) -> DayHours {
        self.days[date.weekday().num_days_from_sunday() as usize]
    }

    pub fn days(&self) -> &[DayHours; 7] {
        &self.days
    }
}

#[derive(Debug, Deserialize)]
pub struct SetBusinessHours {
    pub weekday: u8,
    #[serde(default)]
    pub open_time: Option<NaiveTime>,
    #[serde(default)]
    pub close_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_closed: bool,
}
