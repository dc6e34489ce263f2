use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Time label given to accommodation items on covered nights.
pub const CHECK_IN_LABEL: &str = "check-in";
/// Time label given to the entry on the check-out day itself.
pub const CHECK_OUT_LABEL: &str = "check-out";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TravelPlan {
    pub title: String,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "dayOrder")]
    pub day_order: Vec<String>,
    pub days: HashMap<String, Day>,
    #[serde(rename = "selectedDay")]
    pub selected_day: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Day {
    pub title: String,
    #[serde(default)]
    pub schedules: Vec<ScheduleItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleItem {
    pub id: String,
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(flatten)]
    pub detail: ScheduleDetail,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ScheduleDetail {
    #[serde(rename = "place")]
    Place,

    #[serde(rename = "flight")]
    Flight {
        #[serde(rename = "legRole")]
        leg_role: LegRole,
        #[serde(rename = "flightDetails")]
        flight_details: FlightDetails,
    },

    #[serde(rename = "accommodation")]
    Accommodation {
        #[serde(rename = "hotelDetails")]
        hotel_details: HotelDetails,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LegRole {
    Outbound,
    Return,
    OneWay,
}

impl LegRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegRole::Outbound => "outbound",
            LegRole::Return => "return",
            LegRole::OneWay => "one_way",
        }
    }
}

/// Resolved display fields plus the opaque offer payload carried by a flight item.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightDetails {
    #[serde(rename = "offerId")]
    pub offer_id: String,
    pub departure: LegEndpointDisplay,
    pub arrival: LegEndpointDisplay,
    #[serde(rename = "flightOfferData")]
    pub flight_offer_data: Value,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LegEndpointDisplay {
    #[serde(rename = "iataCode")]
    pub iata_code: String,
    pub at: String,
}

/// Lodging payload carried by every accommodation item of one stay.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HotelDetails {
    #[serde(rename = "lodgingId")]
    pub lodging_id: String,
    #[serde(rename = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(rename = "checkOut")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub hotel: Value,
}

impl HotelDetails {
    pub fn stay_key(&self) -> StayKey {
        StayKey {
            lodging_id: self.lodging_id.clone(),
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

/// Identifies one logical booking across the per-day items it produces.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct StayKey {
    #[serde(rename = "lodgingId")]
    pub lodging_id: String,
    #[serde(rename = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(rename = "checkOut")]
    pub check_out: NaiveDate,
}

/// The persisted plan document: `{ title, startDate, days: [ {day, title, schedules} ] }`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlanDocument {
    pub title: String,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    pub days: Vec<DayRecord>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DayRecord {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub schedules: Vec<ScheduleItem>,
}

impl TravelPlan {
    pub fn day_count(&self) -> usize {
        self.day_order.len()
    }

    /// Locate a schedule item by id across all days.
    pub fn find_item(&self, item_id: &str) -> Option<(String, usize)> {
        for day_key in &self.day_order {
            if let Some(day) = self.days.get(day_key) {
                if let Some(idx) = day.schedules.iter().position(|s| s.id == item_id) {
                    return Some((day_key.clone(), idx));
                }
            }
        }
        None
    }

    pub fn to_document(&self) -> PlanDocument {
        let days = self
            .day_order
            .iter()
            .enumerate()
            .filter_map(|(index, key)| {
                self.days.get(key).map(|day| DayRecord {
                    day: (index + 1) as u32,
                    title: day.title.clone(),
                    schedules: day.schedules.clone(),
                })
            })
            .collect();

        PlanDocument {
            title: self.title.clone(),
            start_date: self.start_date,
            days,
        }
    }

    /// Rebuilds the in-memory shape from a persisted document. Day keys are
    /// assigned from document order so `dayOrder[i] == i+1` holds.
    pub fn from_document(doc: PlanDocument) -> Self {
        let mut day_order = Vec::new();
        let mut days = HashMap::new();

        for (index, record) in doc.days.into_iter().enumerate() {
            let key = (index + 1).to_string();
            days.insert(
                key.clone(),
                Day {
                    title: record.title,
                    schedules: record.schedules,
                },
            );
            day_order.push(key);
        }

        if day_order.is_empty() {
            day_order.push("1".to_string());
            days.insert("1".to_string(), Day::default());
        }

        TravelPlan {
            title: doc.title,
            start_date: doc.start_date,
            day_order,
            days,
            selected_day: 1,
        }
    }
}
