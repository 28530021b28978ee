// Axum test fixture - a messaging API spread over nested routers
use axum::{
    extract::Path,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Topic {
    pub namespace: String,
    pub topic: String,
    pub private: bool,
    pub view_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TopicsPostResponse {
    pub id: String,
}

async fn list_topics() -> Json<Vec<Topic>> {
    Json(vec![])
}

async fn get_topic(Path(id): Path<String>) -> Json<Topic> {
    Json(Topic {
        namespace: "example".to_string(),
        topic: id,
        private: false,
        view_count: 412,
    })
}

async fn create_topic(Json(topic): Json<Topic>) -> Json<TopicsPostResponse> {
    Json(TopicsPostResponse { id: topic.topic })
}

async fn delete_topic(Path(id): Path<String>) {}

async fn download(Path(path): Path<String>) -> String {
    path
}

async fn health_check() -> &'static str {
    "OK"
}

fn topic_routes() -> Router {
    Router::new()
        .route("/", get(list_topics).post(create_topic))
        .route("/:id", get(get_topic).delete(delete_topic))
}

pub fn create_router() -> Router {
    let files = Router::new().route("/files/*path", get(download));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/topics", topic_routes())
        .merge(files)
}
