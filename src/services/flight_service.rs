use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use uuid::Uuid;

use crate::models::flight::{FlightItinerary, FlightOffer};
use crate::models::plan::{
    FlightDetails, LegEndpointDisplay, LegRole, ScheduleDetail, ScheduleItem, TravelPlan,
};

fn iso_duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?").expect("valid duration pattern"))
}

/// Parses a provider leg timestamp. Providers are inconsistent about the
/// separator and the offset suffix, so try the common shapes in order.
pub fn parse_leg_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
        .ok()
}

/// Renders an ISO-8601 `PT#H#M` duration as e.g. `"8h 25m"`. Anything that
/// does not match is passed through untouched.
pub fn format_duration(duration: &str) -> String {
    let Some(caps) = iso_duration_pattern().captures(duration) else {
        return duration.to_string();
    };
    let hours: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let minutes: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{}m", minutes));
    }
    if out.is_empty() {
        duration.to_string()
    } else {
        out
    }
}

fn price_note(offer: &FlightOffer) -> String {
    let amount = offer
        .price
        .grand_total
        .as_deref()
        .or(offer.price.total.as_deref());
    match amount {
        Some(amount) => match offer.price.currency.as_deref() {
            Some(currency) => format!("Price: {} {}", amount, currency),
            None => format!("Price: {}", amount),
        },
        None => String::new(),
    }
}

/// The timestamp that decides a leg's day bucket: outbound legs land in the
/// day they arrive, return legs in the day they depart.
fn leg_anchor(itinerary: &FlightItinerary, role: LegRole) -> Option<NaiveDateTime> {
    let raw = match role {
        LegRole::Return => &itinerary.first_segment().departure.at,
        LegRole::Outbound | LegRole::OneWay => &itinerary.last_segment().arrival.at,
    };
    parse_leg_timestamp(raw)
}

fn day_key_for_date(date: NaiveDate, start_date: NaiveDate, day_order: &[String]) -> Option<String> {
    let day_index = (date - start_date).num_days() + 1;
    if day_index < 1 {
        return None;
    }
    let key = day_index.to_string();
    day_order.contains(&key).then_some(key)
}

/// Computes the day-key for each leg of an offer from its raw timestamps.
/// A leg outside the defined day range falls back to the first day (outbound)
/// or the last day (return) so it is never dropped.
pub fn map_to_day(
    offer: &FlightOffer,
    start_date: NaiveDate,
    day_order: &[String],
) -> HashMap<LegRole, String> {
    let mut assignment = HashMap::new();
    if offer.itineraries.is_empty() || day_order.is_empty() {
        return assignment;
    }

    let round_trip = offer.itineraries.len() > 1;
    let first_key = day_order[0].clone();
    let last_key = day_order[day_order.len() - 1].clone();

    let outbound_role = if round_trip { LegRole::Outbound } else { LegRole::OneWay };
    let outbound_key = leg_anchor(&offer.itineraries[0], outbound_role)
        .and_then(|ts| day_key_for_date(ts.date(), start_date, day_order))
        .unwrap_or(first_key);
    assignment.insert(outbound_role, outbound_key);

    if round_trip {
        let return_key = leg_anchor(&offer.itineraries[1], LegRole::Return)
            .and_then(|ts| day_key_for_date(ts.date(), start_date, day_order))
            .unwrap_or(last_key);
        assignment.insert(LegRole::Return, return_key);
    }

    assignment
}

fn build_leg_item(
    offer: &FlightOffer,
    itinerary: &FlightItinerary,
    role: LegRole,
    id: String,
) -> ScheduleItem {
    let first = itinerary.first_segment();
    let last = itinerary.last_segment();

    // The display anchor airport: arrival side for outbound, departure side
    // for the return leg.
    let anchor = match role {
        LegRole::Return => &first.departure,
        LegRole::Outbound | LegRole::OneWay => &last.arrival,
    };
    let time = leg_anchor(itinerary, role)
        .map(|ts| ts.format("%H:%M").to_string())
        .unwrap_or_default();

    ScheduleItem {
        id,
        name: format!("{} → {} flight", first.departure.iata_code, last.arrival.iata_code),
        time,
        address: anchor.iata_code.clone(),
        category: "Flight".to_string(),
        duration: format_duration(&itinerary.duration),
        notes: price_note(offer),
        lat: None,
        lng: None,
        cost: None,
        detail: ScheduleDetail::Flight {
            leg_role: role,
            flight_details: FlightDetails {
                offer_id: offer.id.clone(),
                departure: LegEndpointDisplay {
                    iata_code: first.departure.iata_code.clone(),
                    at: first.departure.at.clone(),
                },
                arrival: LegEndpointDisplay {
                    iata_code: last.arrival.iata_code.clone(),
                    at: last.arrival.at.clone(),
                },
                flight_offer_data: serde_json::to_value(offer).unwrap_or_default(),
            },
        },
    }
}

struct ExistingLeg {
    day_key: String,
    index: usize,
    id: String,
    offer_id: String,
}

fn find_existing_leg(plan: &TravelPlan, roles: &[LegRole]) -> Option<ExistingLeg> {
    let mut found: Option<(String, String)> = None;
    'scan: for day_key in &plan.day_order {
        let Some(day) = plan.days.get(day_key) else {
            continue;
        };
        for item in &day.schedules {
            if let ScheduleDetail::Flight { leg_role, flight_details } = &item.detail {
                if roles.contains(leg_role) {
                    found = Some((item.id.clone(), flight_details.offer_id.clone()));
                    break 'scan;
                }
            }
        }
    }

    // The slot's current location comes from an id lookup, so a leg the user
    // dragged elsewhere is updated where it sits now.
    let (id, offer_id) = found?;
    let (day_key, index) = plan.find_item(&id)?;
    Some(ExistingLeg { day_key, index, id, offer_id })
}

fn place_leg(plan: &mut TravelPlan, item: ScheduleItem, day_key: &str, front: bool) {
    if let Some(day) = plan.days.get_mut(day_key) {
        if front {
            day.schedules.insert(0, item);
        } else {
            day.schedules.push(item);
        }
    }
}

fn upsert_leg(
    plan: &mut TravelPlan,
    offer: &FlightOffer,
    itinerary_index: usize,
    role: LegRole,
    matching_roles: &[LegRole],
    mapped_key: &str,
    front: bool,
) -> String {
    let existing = find_existing_leg(plan, matching_roles);

    match existing {
        // Same offer again: refresh the item where the user left it.
        Some(leg) if leg.offer_id == offer.id => {
            let item = build_leg_item(offer, &offer.itineraries[itinerary_index], role, leg.id);
            if let Some(day) = plan.days.get_mut(&leg.day_key) {
                day.schedules[leg.index] = item;
            }
            leg.day_key
        }
        // A different offer replaces the slot: keep the stable id but move
        // the item to its freshly computed day.
        Some(leg) => {
            if let Some(day) = plan.days.get_mut(&leg.day_key) {
                day.schedules.remove(leg.index);
            }
            let item = build_leg_item(offer, &offer.itineraries[itinerary_index], role, leg.id);
            place_leg(plan, item, mapped_key, front);
            mapped_key.to_string()
        }
        None => {
            let id = format!("flight-{}-{}", role.as_str(), Uuid::new_v4());
            let item = build_leg_item(offer, &offer.itineraries[itinerary_index], role, id);
            place_leg(plan, item, mapped_key, front);
            mapped_key.to_string()
        }
    }
}

/// Adds an offer's legs to the plan, replacing any legs of the matching role
/// instead of duplicating them. Returns the day-key each leg ended up on.
pub fn add_or_replace_flight(plan: &mut TravelPlan, offer: &FlightOffer) -> HashMap<LegRole, String> {
    let mut placed = HashMap::new();
    if offer.itineraries.is_empty() {
        return placed;
    }

    let mapping = map_to_day(offer, plan.start_date, &plan.day_order);
    let round_trip = offer.itineraries.len() > 1;
    let outbound_role = if round_trip { LegRole::Outbound } else { LegRole::OneWay };

    // Outbound and one-way occupy the same slot in a plan.
    let outbound_slot = [LegRole::Outbound, LegRole::OneWay];
    if let Some(mapped_key) = mapping.get(&outbound_role) {
        let day = upsert_leg(plan, offer, 0, outbound_role, &outbound_slot, mapped_key, true);
        placed.insert(outbound_role, day);
    }

    if round_trip {
        if let Some(mapped_key) = mapping.get(&LegRole::Return) {
            let day = upsert_leg(plan, offer, 1, LegRole::Return, &[LegRole::Return], mapped_key, false);
            placed.insert(LegRole::Return, day);
        }
    }

    placed
}
