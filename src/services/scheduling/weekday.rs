use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::errors::SchedulingError;

/// Furthest week a weekday can be resolved into.
pub const MAX_WEEK_OFFSET: u32 = 52;

/// Date of `weekday` in the `week_offset`-th week counted from `today`
/// (1 = this week, 2 = next week, ...).
///
/// A weekday already past in the current week belongs to the previous offset,
/// so "Monday, this week" asked on a Wednesday lands before `today` and is
/// rejected rather than silently moved forward.
pub fn resolve_weekday_to_date(
    weekday: &str,
    week_offset: u32,
    today: NaiveDate,
) -> Result<NaiveDate, SchedulingError> {
    let target: Weekday = weekday
        .trim()
        .parse()
        .map_err(|_| SchedulingError::InvalidRequest(format!("unknown weekday: {weekday:?}")))?;
    if week_offset == 0 {
        return Err(SchedulingError::InvalidRequest(
            "week offset starts at 1 for the current week".to_string(),
        ));
    }
    if week_offset > MAX_WEEK_OFFSET {
        return Err(SchedulingError::InvalidRequest(format!(
            "week offset {week_offset} is beyond the {MAX_WEEK_OFFSET} week horizon"
        )));
    }

    let target_idx = i64::from(target.num_days_from_monday());
    let today_idx = i64::from(today.weekday().num_days_from_monday());

    let days_until = (target_idx - today_idx).rem_euclid(7);
    let mut weeks = i64::from(week_offset);
    if target_idx < today_idx {
        weeks -= 1;
    }

    let date = today
        .checked_add_signed(Duration::days(days_until + (weeks - 1) * 7))
        .ok_or_else(|| {
            SchedulingError::InvalidRequest(format!("no calendar date {week_offset} weeks ahead"))
        })?;
    if date < today {
        return Err(SchedulingError::InvalidRequest(format!(
            "{} has already passed",
            date.format("%Y-%m-%d")
        )));
    }

    tracing::debug!(weekday = %target, week_offset, date = %date, "resolved weekday");
    Ok(date)
}
