use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::plan::StayKey;

/// A hotel/room selection coming out of a lodging search. `checkIn` and
/// `checkOut` are local calendar dates; the room/price payload is opaque.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LodgingSelection {
    #[serde(default, rename = "lodgingId")]
    pub lodging_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(rename = "checkOut")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub hotel: Value,
}

impl LodgingSelection {
    pub fn stay_key(&self) -> StayKey {
        StayKey {
            lodging_id: self.lodging_id.clone(),
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

/// A stay already scheduled in a plan, as seen by the conflict validator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExistingStay {
    pub name: String,
    #[serde(rename = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(rename = "checkOut")]
    pub check_out: NaiveDate,
    #[serde(rename = "stayKey")]
    pub stay_key: StayKey,
}
