use time::{Date, Duration, OffsetDateTime};

/// First day of the calendar month containing `date`.
pub fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// First instant (UTC) of the month containing `now`.
pub fn month_start(now: OffsetDateTime) -> OffsetDateTime {
    first_of_month(now.to_offset(time::UtcOffset::UTC).date())
        .midnight()
        .assume_utc()
}

/// First day of the calendar month before the one containing `now`.
pub fn previous_month_start(now: OffsetDateTime) -> Date {
    let this_month = month_start(now).date();
    first_of_month(this_month - Duration::days(1))
}

/// Storage key for monthly totals, `YYYY-MM-01`.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}-01", date.year(), u8::from(date.month()))
}

/// `YYYY-MM`, used in the last month report.
pub fn month_label(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Short `MM-DD` fragment shown next to listed expenses.
pub fn day_fragment(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    format!("{:02}-{:02}", u8::from(at.month()), at.day())
}
