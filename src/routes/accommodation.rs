use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::lodging::LodgingSelection;
use crate::models::plan::StayKey;
use crate::services::{accommodation_service, date_service, plan_service::PlanStore};

#[derive(Deserialize)]
pub struct AddStayRequest {
    #[serde(flatten)]
    pub selection: LodgingSelection,
    /// Commit despite an advisory verdict (after user confirmation).
    #[serde(default)]
    pub force: bool,
}

fn parse_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| HttpResponse::BadRequest().body("Invalid plan ID"))
}

/*
    GET /api/plans/{id}/accommodations/window

    The check-in/check-out window implied by the trip range, used to pre-fill
    the lodging search form. A one-day trip has no implied check-out.
*/
pub async fn stay_window(
    path: web::Path<String>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let plan = match data.get(&id) {
        Some(plan) => plan,
        None => return HttpResponse::NotFound().body("Plan not found"),
    };

    let (check_in, check_out) =
        date_service::default_stay_window(plan.start_date, plan.day_count());
    HttpResponse::Ok().json(serde_json::json!({
        "checkIn": check_in,
        "checkOut": check_out,
    }))
}

/*
    POST /api/plans/{id}/accommodations/validate
*/
pub async fn validate_stay(
    path: web::Path<String>,
    body: web::Json<LodgingSelection>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let candidate = body.into_inner();

    let plan = match data.get(&id) {
        Some(plan) => plan,
        None => return HttpResponse::NotFound().body("Plan not found"),
    };

    let existing = accommodation_service::extract_existing_stays(&plan);
    let verdict = accommodation_service::validate_stay(
        &candidate,
        &existing,
        plan.start_date,
        &plan.day_order,
    );
    HttpResponse::Ok().json(verdict)
}

/*
    POST /api/plans/{id}/accommodations
*/
pub async fn add_stay(
    path: web::Path<String>,
    body: web::Json<AddStayRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request = body.into_inner();

    let result = data.with_plan_mut(&id, |plan| {
        let existing = accommodation_service::extract_existing_stays(plan);
        let verdict = accommodation_service::validate_stay(
            &request.selection,
            &existing,
            plan.start_date,
            &plan.day_order,
        );

        if !verdict.is_valid() && !(request.force && verdict.overridable()) {
            return (verdict, None, plan.clone());
        }

        let added = accommodation_service::commit_stay(plan, &request.selection);
        (verdict, Some(added), plan.clone())
    });

    match result {
        Some((verdict, None, _)) => HttpResponse::Conflict().json(verdict),
        Some((verdict, Some(added), plan)) => HttpResponse::Ok().json(serde_json::json!({
            "validation": verdict,
            "itemsAdded": added,
            "plan": plan,
        })),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    DELETE /api/plans/{id}/accommodations
*/
pub async fn remove_stay(
    path: web::Path<String>,
    body: web::Json<StayKey>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let stay_key = body.into_inner();

    match data.with_plan_mut(&id, |plan| {
        let removed = accommodation_service::remove_stay(plan, &stay_key);
        (removed, plan.clone())
    }) {
        Some((removed, plan)) => HttpResponse::Ok().json(serde_json::json!({
            "itemsRemoved": removed,
            "plan": plan,
        })),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}
