use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::models::plan::TravelPlan;

fn date_stamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}(?: |:)?").expect("valid date stamp pattern"))
}

/// Calendar date for a 1-based day index: `start_date + (day_index - 1)` days.
pub fn date_for_day(start_date: NaiveDate, day_index: u32) -> NaiveDate {
    start_date + Duration::days(day_index as i64 - 1)
}

/// `M/D` display stamp, no zero padding.
pub fn day_stamp(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!("{}/{}", date.month(), date.day())
}

/// Re-derives the date-stamp portion of a day title while keeping any
/// free-text suffix the user typed. Idempotent: the stamp this produces is
/// exactly what gets stripped on the next call.
pub fn title_for_day(start_date: NaiveDate, day_index: u32, existing_title: &str) -> String {
    let stamp = day_stamp(date_for_day(start_date, day_index));
    let detail = date_stamp_pattern()
        .replace(existing_title, "")
        .trim()
        .to_string();

    if detail.is_empty() {
        stamp
    } else {
        format!("{} {}", stamp, detail)
    }
}

/// Recomputes every day title from its current position in `day_order`.
/// Called whenever the start date or the day count changes.
pub fn sync_day_titles(plan: &mut TravelPlan) {
    let start_date = plan.start_date;
    for (index, key) in plan.day_order.clone().iter().enumerate() {
        if let Some(day) = plan.days.get_mut(key) {
            day.title = title_for_day(start_date, (index + 1) as u32, &day.title);
        }
    }
}

/// Default check-in/check-out window implied by the trip range, used to
/// pre-fill lodging search forms. A one-day trip has no implied check-out.
pub fn default_stay_window(start_date: NaiveDate, day_count: usize) -> (NaiveDate, Option<NaiveDate>) {
    if day_count <= 1 {
        (start_date, None)
    } else {
        (
            start_date,
            Some(start_date + Duration::days(day_count as i64 - 1)),
        )
    }
}
