use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use travel_planner_api::routes;
use travel_planner_api::services::plan_service::PlanStore;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let store = Arc::new(PlanStore::new());

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .app_data(web::Data::new(store.clone()))
            .service(
                web::scope("/api").service(
                    web::scope("/plans")
                        .route("", web::post().to(routes::plan::create))
                        .route("/document", web::post().to(routes::plan::import_document))
                        .route("/{id}", web::get().to(routes::plan::get_by_id))
                        .route("/{id}/document", web::get().to(routes::plan::get_document))
                        .route("/{id}/start-date", web::put().to(routes::plan::set_start_date))
                        .route("/{id}/days", web::post().to(routes::plan::add_day))
                        .route("/{id}/days/reorder", web::put().to(routes::plan::reorder_days))
                        .route("/{id}/days/{key}", web::delete().to(routes::plan::remove_day))
                        .route(
                            "/{id}/days/{key}/schedules/reorder",
                            web::put().to(routes::plan::reorder_schedules),
                        )
                        .route("/{id}/flights", web::post().to(routes::flight::add_flight))
                        .route(
                            "/{id}/accommodations/window",
                            web::get().to(routes::accommodation::stay_window),
                        )
                        .route(
                            "/{id}/accommodations/validate",
                            web::post().to(routes::accommodation::validate_stay),
                        )
                        .route(
                            "/{id}/accommodations",
                            web::post().to(routes::accommodation::add_stay),
                        )
                        .route(
                            "/{id}/accommodations",
                            web::delete().to(routes::accommodation::remove_stay),
                        )
                        .route(
                            "/{id}/recovery",
                            web::post().to(routes::recovery::recover_itinerary),
                        ),
                ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
