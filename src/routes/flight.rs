use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::flight::FlightOffer;
use crate::services::{flight_service, plan_service::PlanStore};

/*
    POST /api/plans/{id}/flights

    Accepts a raw provider offer payload; one schedule item is written (or
    replaced) per leg role, on the day each leg lands on.
*/
pub async fn add_flight(
    path: web::Path<String>,
    body: web::Json<Value>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid plan ID"),
    };

    let raw = body.into_inner();
    let offer = match FlightOffer::from_value(&raw) {
        Some(offer) => offer,
        None => {
            eprintln!("Rejected flight payload with no usable itineraries");
            return HttpResponse::BadRequest().body("Flight offer has no usable itineraries");
        }
    };

    match data.with_plan_mut(&id, |plan| {
        let placed = flight_service::add_or_replace_flight(plan, &offer);
        (placed, plan.clone())
    }) {
        Some((placed, plan)) => HttpResponse::Ok().json(serde_json::json!({
            "placed": placed,
            "plan": plan,
        })),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}
