use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized flight-offer input. Upstream providers send more fields than
/// these; everything the engine does not consume stays in the raw payload
/// captured at the route boundary.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightOffer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub itineraries: Vec<FlightItinerary>,
    #[serde(default)]
    pub price: PriceBlock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightItinerary {
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub segments: Vec<FlightSegment>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightSegment {
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    #[serde(default, rename = "carrierCode")]
    pub carrier_code: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightEndpoint {
    #[serde(default, rename = "iataCode")]
    pub iata_code: String,
    #[serde(default)]
    pub at: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PriceBlock {
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default, rename = "grandTotal")]
    pub grand_total: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl FlightOffer {
    /// Lenient normalization from a raw provider payload. Missing fields fall
    /// back to defaults; only a payload with no itinerary legs is unusable.
    pub fn from_value(raw: &Value) -> Option<FlightOffer> {
        let offer: FlightOffer = serde_json::from_value(raw.clone()).ok()?;
        if offer.itineraries.is_empty() || offer.itineraries.iter().any(|it| it.segments.is_empty())
        {
            return None;
        }
        Some(offer)
    }
}

impl FlightItinerary {
    pub fn first_segment(&self) -> &FlightSegment {
        &self.segments[0]
    }

    pub fn last_segment(&self) -> &FlightSegment {
        &self.segments[self.segments.len() - 1]
    }
}
