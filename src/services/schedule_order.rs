use std::sync::OnceLock;

use regex::Regex;

use crate::models::plan::{ScheduleDetail, ScheduleItem, CHECK_IN_LABEL, CHECK_OUT_LABEL};

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("valid clock pattern"))
}

/// Sort value of a time label as HHMM. The check-in/check-out sentinels have
/// implied clock values of 14:00 and 11:00.
pub fn time_sort_value(time: &str) -> u32 {
    match time {
        CHECK_IN_LABEL => return 1400,
        CHECK_OUT_LABEL => return 1100,
        _ => {}
    }

    if let Some(caps) = clock_pattern().captures(time) {
        let hours: u32 = caps[1].parse().unwrap_or(0);
        let minutes: u32 = caps[2].parse().unwrap_or(0);
        return hours * 100 + minutes;
    }

    // Bare numbers like "1400" are accepted as-is when in clock range.
    if let Ok(num) = time.trim().parse::<u32>() {
        if num <= 2359 {
            return num;
        }
    }

    0
}

/// Stable time ordering for one day's schedule. Ties between a lodging entry
/// and anything else put the lodging entry last.
pub fn sort_schedules_by_time(schedules: &mut [ScheduleItem]) {
    schedules.sort_by(|a, b| {
        let ta = time_sort_value(&a.time);
        let tb = time_sort_value(&b.time);
        if ta != tb {
            return ta.cmp(&tb);
        }
        let lodging_a = matches!(a.detail, ScheduleDetail::Accommodation { .. });
        let lodging_b = matches!(b.detail, ScheduleDetail::Accommodation { .. });
        lodging_a.cmp(&lodging_b)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, time: &str, detail: ScheduleDetail) -> ScheduleItem {
        ScheduleItem {
            id: id.to_string(),
            name: id.to_string(),
            time: time.to_string(),
            address: String::new(),
            category: String::new(),
            duration: String::new(),
            notes: String::new(),
            lat: None,
            lng: None,
            cost: None,
            detail,
        }
    }

    #[test]
    fn test_sentinel_labels_have_implied_clock_values() {
        assert_eq!(time_sort_value(CHECK_IN_LABEL), 1400);
        assert_eq!(time_sort_value(CHECK_OUT_LABEL), 1100);
        assert_eq!(time_sort_value("09:30"), 930);
        assert_eq!(time_sort_value("1400"), 1400);
        assert_eq!(time_sort_value("noonish"), 0);
    }

    #[test]
    fn test_lodging_sorts_after_place_on_equal_times() {
        let lodging = ScheduleDetail::Accommodation {
            hotel_details: crate::models::plan::HotelDetails {
                lodging_id: "h1".to_string(),
                check_in: chrono::NaiveDate::from_ymd_opt(2025, 7, 21).unwrap(),
                check_out: chrono::NaiveDate::from_ymd_opt(2025, 7, 22).unwrap(),
                hotel: serde_json::Value::Null,
            },
        };
        let mut schedules = vec![
            item("hotel", "14:00", lodging),
            item("museum", "14:00", ScheduleDetail::Place),
            item("breakfast", "08:00", ScheduleDetail::Place),
        ];
        sort_schedules_by_time(&mut schedules);

        let ids: Vec<&str> = schedules.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["breakfast", "museum", "hotel"]);
    }
}
