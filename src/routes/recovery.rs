use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::{plan_service, plan_service::PlanStore, recovery_service};

#[derive(Deserialize)]
pub struct RecoveryRequest {
    pub text: String,
}

/*
    POST /api/plans/{id}/recovery

    Feeds possibly-truncated generated itinerary text through the staged
    parser and replaces the plan's days with whatever could be recovered.
    When nothing usable is found the stored plan is left untouched.
*/
pub async fn recover_itinerary(
    path: web::Path<String>,
    body: web::Json<RecoveryRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid plan ID"),
    };

    let recovered = recovery_service::parse_generated_itinerary(&body.into_inner().text);
    println!("Recovered {} day(s) from generated itinerary text", recovered.len());

    match data.with_plan_mut(&id, |plan| {
        let applied = plan_service::apply_recovered_days(plan, &recovered);
        (applied, plan.clone())
    }) {
        Some((applied, plan)) => HttpResponse::Ok().json(serde_json::json!({
            "recoveredDays": applied,
            "plan": plan,
        })),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}
