use std::collections::HashMap;
use std::error::Error;

use chrono::NaiveDate;

use crate::models::plan::{Day, TravelPlan};
use crate::services::date_service;

/// Appends a new empty day. Keys are `1..N` between operations, so the new
/// key is always `N + 1`.
pub fn add_day(plan: &mut TravelPlan) -> String {
    let new_index = plan.day_order.len() + 1;
    let key = new_index.to_string();

    plan.days.insert(
        key.clone(),
        Day {
            title: date_service::title_for_day(plan.start_date, new_index as u32, ""),
            schedules: Vec::new(),
        },
    );
    plan.day_order.push(key.clone());
    key
}

/// Removes a day and renumbers the remainder. A plan always keeps at least
/// one day.
pub fn remove_day(plan: &mut TravelPlan, key: &str) -> Result<(), Box<dyn Error>> {
    if plan.day_order.len() <= 1 {
        return Err("At least one day must remain in the plan".into());
    }
    if !plan.day_order.iter().any(|k| k == key) {
        return Err(format!("Unknown day key: {}", key).into());
    }

    let removed_position = plan
        .day_order
        .iter()
        .position(|k| k == key)
        .map(|p| (p + 1) as u32)
        .unwrap_or(1);

    plan.day_order.retain(|k| k != key);
    plan.days.remove(key);
    renumber_days(plan);

    let last = plan.day_order.len() as u32;
    if plan.selected_day == removed_position {
        // Select whatever day moved into the removed slot, clamped to the end.
        plan.selected_day = removed_position.min(last);
    } else if plan.selected_day > removed_position {
        plan.selected_day -= 1;
    }

    Ok(())
}

/// Moves the day at `from` to `to` within the display order, then renumbers
/// keys and re-derives titles so they reflect position again.
pub fn reorder_days(plan: &mut TravelPlan, from: usize, to: usize) -> Result<(), Box<dyn Error>> {
    let len = plan.day_order.len();
    if from >= len || to >= len {
        return Err(format!("Day position out of range: {} -> {} (len {})", from, to, len).into());
    }

    let key = plan.day_order.remove(from);
    plan.day_order.insert(to, key);
    renumber_days(plan);
    plan.selected_day = (to + 1) as u32;

    Ok(())
}

/// Splices one item within a day's schedule list. Identity-preserving: ids
/// and items are untouched, only their order changes.
pub fn reorder_items(
    plan: &mut TravelPlan,
    day_key: &str,
    from: usize,
    to: usize,
) -> Result<(), Box<dyn Error>> {
    let day = plan
        .days
        .get_mut(day_key)
        .ok_or_else(|| format!("Unknown day key: {}", day_key))?;

    let len = day.schedules.len();
    if from >= len || to >= len {
        return Err(format!(
            "Schedule position out of range: {} -> {} (len {})",
            from, to, len
        )
        .into());
    }

    let item = day.schedules.remove(from);
    day.schedules.insert(to, item);
    Ok(())
}

/// Changes day zero of the trip and brings every title back in sync.
pub fn set_start_date(plan: &mut TravelPlan, new_date: NaiveDate) {
    plan.start_date = new_date;
    date_service::sync_day_titles(plan);
}

/// Restores the `dayOrder[i] == i+1` invariant after a structural edit,
/// rebuilding the key map in display order and re-deriving titles.
pub fn renumber_days(plan: &mut TravelPlan) {
    let mut new_days = HashMap::new();
    let mut new_order = Vec::with_capacity(plan.day_order.len());

    for (index, old_key) in plan.day_order.clone().into_iter().enumerate() {
        let Some(mut day) = plan.days.remove(&old_key) else {
            continue;
        };
        day.title = date_service::title_for_day(plan.start_date, (index + 1) as u32, &day.title);
        let new_key = (index + 1).to_string();
        new_days.insert(new_key.clone(), day);
        new_order.push(new_key);
    }

    plan.days = new_days;
    plan.day_order = new_order;
}
