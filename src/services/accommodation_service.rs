use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lodging::{ExistingStay, LodgingSelection};
use crate::models::plan::{
    ScheduleDetail, ScheduleItem, StayKey, TravelPlan, CHECK_IN_LABEL, CHECK_OUT_LABEL,
};
use crate::models::plan::HotelDetails;

/// Verdict for a candidate stay. Only `InvalidDateRange` is non-overridable;
/// the advisory verdicts carry enough detail for a confirmation prompt.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "result")]
pub enum StayValidation {
    #[serde(rename = "valid")]
    Valid { consecutive: bool, message: String },
    #[serde(rename = "invalid_date_range")]
    InvalidDateRange { message: String },
    #[serde(rename = "outside_travel_period")]
    OutsideTravelPeriod { message: String },
    #[serde(rename = "date_conflict")]
    DateConflict { with: ExistingStay, message: String },
}

impl StayValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, StayValidation::Valid { .. })
    }

    /// Advisory verdicts may be force-committed after user confirmation.
    pub fn overridable(&self) -> bool {
        matches!(
            self,
            StayValidation::OutsideTravelPeriod { .. } | StayValidation::DateConflict { .. }
        )
    }
}

/// Runs the validation rules in order, short-circuiting on the first failure:
/// range sanity, travel-period containment, then pairwise conflict against
/// every existing stay. Sharing a boundary date with an existing stay is a
/// consecutive stay, never a conflict.
pub fn validate_stay(
    candidate: &LodgingSelection,
    existing: &[ExistingStay],
    start_date: NaiveDate,
    day_order: &[String],
) -> StayValidation {
    if candidate.check_in >= candidate.check_out {
        return StayValidation::InvalidDateRange {
            message: "Check-out date must be after the check-in date.".to_string(),
        };
    }

    let travel_end = start_date + Duration::days(day_order.len() as i64 - 1);
    if candidate.check_in < start_date {
        return StayValidation::OutsideTravelPeriod {
            message: format!(
                "Check-in date is before the trip start date ({}).",
                start_date
            ),
        };
    }
    if candidate.check_out > travel_end {
        return StayValidation::OutsideTravelPeriod {
            message: format!("Check-out date is after the last trip day ({}).", travel_end),
        };
    }

    let mut consecutive = false;
    for stay in existing {
        // Shared endpoints are back-to-back bookings, allowed by design.
        if candidate.check_in == stay.check_out || candidate.check_out == stay.check_in {
            consecutive = true;
            continue;
        }

        if candidate.check_in < stay.check_out && candidate.check_out > stay.check_in {
            return StayValidation::DateConflict {
                message: format!(
                    "Selected dates overlap an existing stay: {} ({} ~ {})",
                    stay.name, stay.check_in, stay.check_out
                ),
                with: stay.clone(),
            };
        }
    }

    let message = if consecutive {
        "Added as a consecutive stay.".to_string()
    } else {
        "No date conflicts.".to_string()
    };
    StayValidation::Valid { consecutive, message }
}

/// Collects the stays already scheduled in a plan, one entry per stay-key
/// (each stay spans several per-day items that all share the key).
pub fn extract_existing_stays(plan: &TravelPlan) -> Vec<ExistingStay> {
    let mut seen: HashSet<StayKey> = HashSet::new();
    let mut stays = Vec::new();

    for day_key in &plan.day_order {
        let Some(day) = plan.days.get(day_key) else {
            continue;
        };
        for item in &day.schedules {
            if let ScheduleDetail::Accommodation { hotel_details } = &item.detail {
                let key = hotel_details.stay_key();
                if seen.insert(key.clone()) {
                    stays.push(ExistingStay {
                        name: item.name.clone(),
                        check_in: hotel_details.check_in,
                        check_out: hotel_details.check_out,
                        stay_key: key,
                    });
                }
            }
        }
    }

    stays
}

/// Expands a stay into per-day schedule items: one `check-in` entry for every
/// covered night and a `check-out` entry on the check-out day. Dates that
/// fall outside the currently defined day range are skipped rather than
/// growing the trip.
pub fn commit_stay(plan: &mut TravelPlan, candidate: &LodgingSelection) -> usize {
    let mut added = 0;
    let mut date = candidate.check_in;

    while date <= candidate.check_out {
        let label = if date == candidate.check_out {
            CHECK_OUT_LABEL
        } else {
            CHECK_IN_LABEL
        };
        if push_stay_item(plan, candidate, date, label) {
            added += 1;
        }
        date += Duration::days(1);
    }

    added
}

/// Deletes every schedule item belonging to one stay.
pub fn remove_stay(plan: &mut TravelPlan, stay_key: &StayKey) -> usize {
    let mut removed = 0;
    for day in plan.days.values_mut() {
        let before = day.schedules.len();
        day.schedules.retain(|item| match &item.detail {
            ScheduleDetail::Accommodation { hotel_details } => {
                &hotel_details.stay_key() != stay_key
            }
            _ => true,
        });
        removed += before - day.schedules.len();
    }
    removed
}

fn push_stay_item(
    plan: &mut TravelPlan,
    candidate: &LodgingSelection,
    date: NaiveDate,
    time_label: &str,
) -> bool {
    let day_index = (date - plan.start_date).num_days() + 1;
    if day_index < 1 {
        return false;
    }
    let day_key = day_index.to_string();
    if !plan.day_order.contains(&day_key) {
        return false;
    }

    let notes = candidate
        .price
        .as_ref()
        .map(|p| format!("Price: {}", p))
        .unwrap_or_default();

    let item = ScheduleItem {
        id: format!("hotel-{}-{}", candidate.lodging_id, Uuid::new_v4()),
        name: candidate.name.clone(),
        time: time_label.to_string(),
        address: candidate.address.clone(),
        category: "Accommodation".to_string(),
        duration: String::new(),
        notes,
        lat: candidate.latitude,
        lng: candidate.longitude,
        cost: None,
        detail: ScheduleDetail::Accommodation {
            hotel_details: HotelDetails {
                lodging_id: candidate.lodging_id.clone(),
                check_in: candidate.check_in,
                check_out: candidate.check_out,
                hotel: candidate.hotel.clone(),
            },
        },
    };

    if let Some(day) = plan.days.get_mut(&day_key) {
        day.schedules.push(item);
        super::schedule_order::sort_schedules_by_time(&mut day.schedules);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plan_service;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn selection(id: &str, check_in: NaiveDate, check_out: NaiveDate) -> LodgingSelection {
        LodgingSelection {
            lodging_id: id.to_string(),
            name: format!("Hotel {}", id),
            check_in,
            check_out,
            address: "1 Seaside Ave".to_string(),
            latitude: Some(35.68),
            longitude: Some(139.76),
            price: Some("120 USD".to_string()),
            hotel: json!({ "roomType": "double" }),
        }
    }

    fn stay(id: &str, check_in: NaiveDate, check_out: NaiveDate) -> ExistingStay {
        ExistingStay {
            name: format!("Hotel {}", id),
            check_in,
            check_out,
            stay_key: StayKey {
                lodging_id: id.to_string(),
                check_in,
                check_out,
            },
        }
    }

    fn day_order(n: usize) -> Vec<String> {
        (1..=n).map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_consecutive_stay_is_valid_with_flag() {
        let start = date(2025, 7, 21);
        let existing = vec![stay("a", date(2025, 7, 21), date(2025, 7, 24))];
        let candidate = selection("b", date(2025, 7, 24), date(2025, 7, 26));

        match validate_stay(&candidate, &existing, start, &day_order(6)) {
            StayValidation::Valid { consecutive, .. } => assert!(consecutive),
            other => panic!("expected valid, got {:?}", other),
        }
    }

    #[test]
    fn test_overlap_is_a_conflict() {
        let start = date(2025, 7, 21);
        let existing = vec![stay("a", date(2025, 7, 21), date(2025, 7, 24))];
        let candidate = selection("b", date(2025, 7, 22), date(2025, 7, 26));

        match validate_stay(&candidate, &existing, start, &day_order(6)) {
            StayValidation::DateConflict { with, .. } => assert_eq!(with.name, "Hotel a"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_inverted_range_is_fatal_regardless_of_existing_stays() {
        let start = date(2025, 7, 21);
        let candidate = selection("b", date(2025, 7, 25), date(2025, 7, 24));
        let verdict = validate_stay(&candidate, &[], start, &day_order(6));
        assert!(matches!(verdict, StayValidation::InvalidDateRange { .. }));
        assert!(!verdict.overridable());
    }

    #[test]
    fn test_outside_travel_period_is_advisory() {
        let start = date(2025, 7, 21);
        let candidate = selection("b", date(2025, 7, 21), date(2025, 7, 30));
        let verdict = validate_stay(&candidate, &[], start, &day_order(3));
        assert!(matches!(verdict, StayValidation::OutsideTravelPeriod { .. }));
        assert!(verdict.overridable());
    }

    #[test]
    fn test_commit_expands_one_item_per_covered_day() {
        let mut plan = plan_service::new_plan(date(2025, 7, 21), None);
        for _ in 0..3 {
            crate::services::reorder_service::add_day(&mut plan);
        }
        let candidate = selection("a", date(2025, 7, 21), date(2025, 7, 23));

        let added = commit_stay(&mut plan, &candidate);
        assert_eq!(added, 3);

        let first = &plan.days["1"].schedules[0];
        assert_eq!(first.time, CHECK_IN_LABEL);
        let last = &plan.days["3"].schedules[0];
        assert_eq!(last.time, CHECK_OUT_LABEL);
        // The check-out day past the trip end would have been skipped.
        assert!(plan.days["4"].schedules.is_empty());
    }

    #[test]
    fn test_extracted_stays_do_not_conflict_with_themselves() {
        let mut plan = plan_service::new_plan(date(2025, 7, 21), None);
        for _ in 0..5 {
            crate::services::reorder_service::add_day(&mut plan);
        }
        let a = selection("a", date(2025, 7, 21), date(2025, 7, 24));
        let b = selection("b", date(2025, 7, 24), date(2025, 7, 26));
        commit_stay(&mut plan, &a);
        commit_stay(&mut plan, &b);

        let extracted = extract_existing_stays(&plan);
        assert_eq!(extracted.len(), 2);

        // Round-tripped stays must not report conflicts against the set they
        // came from, minus themselves.
        for stay in &extracted {
            let others: Vec<ExistingStay> = extracted
                .iter()
                .filter(|s| s.stay_key != stay.stay_key)
                .cloned()
                .collect();
            let candidate = selection(&stay.stay_key.lodging_id, stay.check_in, stay.check_out);
            let verdict = validate_stay(&candidate, &others, plan.start_date, &plan.day_order);
            assert!(verdict.is_valid(), "unexpected verdict: {:?}", verdict);
        }
    }

    #[test]
    fn test_remove_stay_deletes_every_item_of_the_stay() {
        let mut plan = plan_service::new_plan(date(2025, 7, 21), None);
        for _ in 0..3 {
            crate::services::reorder_service::add_day(&mut plan);
        }
        let a = selection("a", date(2025, 7, 21), date(2025, 7, 23));
        commit_stay(&mut plan, &a);

        let removed = remove_stay(&mut plan, &a.stay_key());
        assert_eq!(removed, 3);
        assert!(extract_existing_stays(&plan).is_empty());
    }
}
