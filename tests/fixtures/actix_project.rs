// Actix-Web test fixture - a messaging API with scoped services
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Topic {
    pub namespace: String,
    pub topic: String,
    pub private: bool,
    pub view_count: i64,
}

#[actix_web::get("/topics")]
async fn list_topics() -> impl Responder {
    HttpResponse::Ok().json(Vec::<Topic>::new())
}

#[actix_web::get("/topic/{id:[0-9]+}")]
async fn get_topic(path: web::Path<u32>) -> impl Responder {
    HttpResponse::Ok().finish()
}

#[actix_web::post("/topics")]
async fn create_topic(payload: web::Json<Topic>) -> impl Responder {
    HttpResponse::Ok().finish()
}

#[actix_web::delete("/topic/{id}")]
async fn delete_topic(path: web::Path<u32>) -> impl Responder {
    HttpResponse::NoContent()
}

#[actix_web::get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

async fn metrics() -> impl Responder {
    HttpResponse::Ok().finish()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(list_topics)
            .service(get_topic)
            .service(create_topic)
            .service(delete_topic),
    );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    HttpServer::new(|| {
        App::new()
            .configure(configure_routes)
            .service(health_check)
            .route("/metrics", web::get().to(metrics))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
