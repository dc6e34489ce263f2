use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::plan::{Day, ScheduleDetail, ScheduleItem, TravelPlan};
use crate::services::date_service;
use crate::services::recovery_service::{RecoveredDay, RecoveredItem};

const DEFAULT_PLAN_TITLE: &str = "New travel plan";
const DEFAULT_PLACE_TIME: &str = "09:00";

/// The canonical in-memory plan store. There is exactly one writer per plan
/// (the request handler applying a mutation), and every mutation re-reads
/// the current value under the lock rather than a captured snapshot, so a
/// stale search response can never clobber a newer edit.
pub struct PlanStore {
    plans: RwLock<HashMap<Uuid, TravelPlan>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, plan: TravelPlan) -> Uuid {
        let id = Uuid::new_v4();
        self.plans
            .write()
            .expect("plan store lock poisoned")
            .insert(id, plan);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<TravelPlan> {
        self.plans
            .read()
            .expect("plan store lock poisoned")
            .get(id)
            .cloned()
    }

    /// Applies a mutation atomically against the current stored value.
    pub fn with_plan_mut<T>(
        &self,
        id: &Uuid,
        mutate: impl FnOnce(&mut TravelPlan) -> T,
    ) -> Option<T> {
        let mut plans = self.plans.write().expect("plan store lock poisoned");
        plans.get_mut(id).map(mutate)
    }
}

impl Default for PlanStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh plan is a single empty day 1.
pub fn new_plan(start_date: NaiveDate, title: Option<String>) -> TravelPlan {
    let mut days = HashMap::new();
    days.insert(
        "1".to_string(),
        Day {
            title: date_service::title_for_day(start_date, 1, ""),
            schedules: Vec::new(),
        },
    );

    TravelPlan {
        title: title.unwrap_or_else(|| DEFAULT_PLAN_TITLE.to_string()),
        start_date,
        day_order: vec!["1".to_string()],
        days,
        selected_day: 1,
    }
}

fn place_from_recovered(item: &RecoveredItem) -> ScheduleItem {
    let id = if item.id.is_empty() {
        format!("place-{}", Uuid::new_v4())
    } else {
        item.id.clone()
    };
    let time = if item.time.is_empty() {
        DEFAULT_PLACE_TIME.to_string()
    } else {
        item.time.clone()
    };

    ScheduleItem {
        id,
        name: item.name.clone(),
        time,
        address: item.address.clone(),
        category: item.category.clone(),
        duration: item.duration.clone(),
        notes: item.notes.clone(),
        lat: item.lat,
        lng: item.lng,
        cost: item.cost.clone(),
        detail: ScheduleDetail::Place,
    }
}

/// Replaces a plan's day structure with recovered days, in document order,
/// with keys renumbered to `1..N` and titles re-derived from the start date.
/// Zero recovered days leaves the plan untouched ("nothing usable").
pub fn apply_recovered_days(plan: &mut TravelPlan, recovered: &[RecoveredDay]) -> usize {
    if recovered.is_empty() {
        return 0;
    }

    let start_date = plan.start_date;
    let mut days = HashMap::new();
    let mut day_order = Vec::with_capacity(recovered.len());

    for (index, rec) in recovered.iter().enumerate() {
        let key = (index + 1).to_string();
        let title = date_service::title_for_day(
            start_date,
            (index + 1) as u32,
            rec.title.as_deref().unwrap_or(""),
        );
        let schedules = rec.schedules.iter().map(place_from_recovered).collect();

        days.insert(key.clone(), Day { title, schedules });
        day_order.push(key);
    }

    plan.days = days;
    plan.day_order = day_order;
    plan.selected_day = 1;
    recovered.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_plan_is_a_single_empty_day() {
        let plan = new_plan(date(2025, 7, 21), None);
        assert_eq!(plan.day_order, vec!["1"]);
        assert_eq!(plan.days["1"].title, "7/21");
        assert!(plan.days["1"].schedules.is_empty());
        assert_eq!(plan.selected_day, 1);
    }

    #[test]
    fn test_apply_recovered_days_renumbers_and_titles() {
        let mut plan = new_plan(date(2025, 7, 21), None);
        let recovered = vec![
            RecoveredDay {
                day: 4,
                title: Some("1/1 Arrival".to_string()),
                date: None,
                schedules: vec![RecoveredItem {
                    id: "a".to_string(),
                    name: "Harbor".to_string(),
                    ..Default::default()
                }],
            },
            RecoveredDay {
                day: 7,
                title: None,
                date: None,
                schedules: Vec::new(),
            },
        ];

        let applied = apply_recovered_days(&mut plan, &recovered);
        assert_eq!(applied, 2);
        assert_eq!(plan.day_order, vec!["1", "2"]);
        // Stale date stamp replaced, detail text kept.
        assert_eq!(plan.days["1"].title, "7/21 Arrival");
        assert_eq!(plan.days["2"].title, "7/22");
        assert_eq!(plan.days["1"].schedules[0].time, "09:00");
    }

    #[test]
    fn test_zero_recovered_days_leave_plan_untouched() {
        let mut plan = new_plan(date(2025, 7, 21), None);
        plan.days.get_mut("1").unwrap().title = "7/21 Keep me".to_string();

        assert_eq!(apply_recovered_days(&mut plan, &[]), 0);
        assert_eq!(plan.days["1"].title, "7/21 Keep me");
    }

    #[test]
    fn test_store_mutations_replace_the_stored_value() {
        let store = PlanStore::new();
        let id = store.insert(new_plan(date(2025, 7, 21), None));

        let added = store.with_plan_mut(&id, |plan| {
            crate::services::reorder_service::add_day(plan)
        });
        assert_eq!(added.as_deref(), Some("2"));
        assert_eq!(store.get(&id).unwrap().day_order.len(), 2);

        let missing = Uuid::new_v4();
        assert!(store.get(&missing).is_none());
        assert!(store.with_plan_mut(&missing, |_| ()).is_none());
    }
}
