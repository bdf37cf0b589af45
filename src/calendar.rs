use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Offset, TimeZone,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

/// Inclusive `[start, end]` span, both ends expressed in the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Window {
    pub fn offset(&self) -> FixedOffset {
        self.start.offset().fix()
    }

    pub fn contains<Tz: chrono::TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&self.offset());
        instant >= self.start && instant <= self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

/// Calendar span of `period` containing `now`, in `now`'s offset.
///
/// `None` only when the span runs past the dates chrono can represent.
pub fn window_for(period: Period, now: DateTime<FixedOffset>) -> Option<Window> {
    let offset = now.offset().fix();
    let today = now.date_naive();

    let first = match period {
        Period::Week => week_start(today),
        Period::Month => month_start(today),
        Period::Year => NaiveDate::from_yo_opt(today.year(), 1)?,
    };
    let after_last = match period {
        Period::Week => first.checked_add_days(Days::new(7))?,
        Period::Month => first.checked_add_months(Months::new(1))?,
        Period::Year => first.checked_add_months(Months::new(12))?,
    };

    let start = offset.from_local_datetime(&first.and_time(NaiveTime::MIN)).single()?;
    let end = offset
        .from_local_datetime(&after_last.and_time(NaiveTime::MIN))
        .single()?
        - Duration::seconds(1);
    Some(Window { start, end })
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}
