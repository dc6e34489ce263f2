use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::plan::{PlanDocument, TravelPlan};
use crate::services::{plan_service, plan_service::PlanStore, reorder_service};

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub title: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
}

#[derive(Serialize)]
struct PlanCreated {
    id: Uuid,
    plan: TravelPlan,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Deserialize)]
pub struct StartDateRequest {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
}

fn parse_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| HttpResponse::BadRequest().body("Invalid plan ID"))
}

/*
    POST /api/plans
*/
pub async fn create(
    body: web::Json<CreatePlanRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let request = body.into_inner();
    let plan = plan_service::new_plan(request.start_date, request.title);
    let id = data.insert(plan.clone());

    println!("Created plan {} starting {}", id, plan.start_date);
    HttpResponse::Created().json(PlanCreated { id, plan })
}

/*
    GET /api/plans/{id}
*/
pub async fn get_by_id(path: web::Path<String>, data: web::Data<Arc<PlanStore>>) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.get(&id) {
        Some(plan) => HttpResponse::Ok().json(plan),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    GET /api/plans/{id}/document
*/
pub async fn get_document(
    path: web::Path<String>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.get(&id) {
        Some(plan) => HttpResponse::Ok().json(plan.to_document()),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    POST /api/plans/document (import a previously exported document)
*/
pub async fn import_document(
    body: web::Json<PlanDocument>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let plan = TravelPlan::from_document(body.into_inner());
    let id = data.insert(plan.clone());

    println!("Imported plan {} with {} days", id, plan.day_count());
    HttpResponse::Created().json(PlanCreated { id, plan })
}

/*
    POST /api/plans/{id}/days
*/
pub async fn add_day(path: web::Path<String>, data: web::Data<Arc<PlanStore>>) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.with_plan_mut(&id, |plan| {
        let key = reorder_service::add_day(plan);
        (key, plan.clone())
    }) {
        Some((key, plan)) => HttpResponse::Ok().json(serde_json::json!({
            "day": key,
            "plan": plan,
        })),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    DELETE /api/plans/{id}/days/{key}
*/
pub async fn remove_day(
    path: web::Path<(String, String)>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let (raw_id, day_key) = path.into_inner();
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.with_plan_mut(&id, |plan| {
        reorder_service::remove_day(plan, &day_key).map(|_| plan.clone())
    }) {
        Some(Ok(plan)) => HttpResponse::Ok().json(plan),
        Some(Err(err)) => HttpResponse::BadRequest().body(err.to_string()),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    PUT /api/plans/{id}/days/reorder
*/
pub async fn reorder_days(
    path: web::Path<String>,
    body: web::Json<MoveRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request = body.into_inner();

    match data.with_plan_mut(&id, |plan| {
        reorder_service::reorder_days(plan, request.from, request.to).map(|_| plan.clone())
    }) {
        Some(Ok(plan)) => HttpResponse::Ok().json(plan),
        Some(Err(err)) => HttpResponse::BadRequest().body(err.to_string()),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    PUT /api/plans/{id}/days/{key}/schedules/reorder
*/
pub async fn reorder_schedules(
    path: web::Path<(String, String)>,
    body: web::Json<MoveRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let (raw_id, day_key) = path.into_inner();
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request = body.into_inner();

    match data.with_plan_mut(&id, |plan| {
        reorder_service::reorder_items(plan, &day_key, request.from, request.to)
            .map(|_| plan.clone())
    }) {
        Some(Ok(plan)) => HttpResponse::Ok().json(plan),
        Some(Err(err)) => HttpResponse::BadRequest().body(err.to_string()),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}

/*
    PUT /api/plans/{id}/start-date
*/
pub async fn set_start_date(
    path: web::Path<String>,
    body: web::Json<StartDateRequest>,
    data: web::Data<Arc<PlanStore>>,
) -> impl Responder {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let new_date = body.into_inner().start_date;

    match data.with_plan_mut(&id, |plan| {
        reorder_service::set_start_date(plan, new_date);
        plan.clone()
    }) {
        Some(plan) => HttpResponse::Ok().json(plan),
        None => HttpResponse::NotFound().body("Plan not found"),
    }
}
