use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl MessageResponse {
    fn ok(message: &str, data: Value) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        })
    }
}

/// A message accepted by one of the send endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: Uuid,
    pub to_number: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

#[derive(Deserialize)]
pub struct SendText {
    pub phone: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct SendImage {
    pub phone: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Deserialize)]
pub struct SendDocument {
    pub phone: String,
    #[serde(rename = "documentUrl")]
    pub document_url: String,
    pub caption: Option<String>,
}

#[derive(Deserialize)]
pub struct SendAudio {
    pub phone: String,
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    pub caption: Option<String>,
}

#[derive(Deserialize)]
pub struct SendLocation {
    pub phone: String,
    pub latitude: String,
    pub longitude: String,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct Page {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

pub type Db = Arc<RwLock<Vec<SentMessage>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    let backend = Router::new()
        .route("/send", post(send_text))
        .route("/send-image", post(send_image))
        .route("/send-document", post(send_document))
        .route("/send-audio", post(send_audio))
        .route("/send-location", post(send_location))
        .route("/messages", get(get_messages))
        .route("/status", get(get_status));
    Router::new()
        .nest("/api/whatsapp", backend)
        .route("/v1_1/{cloud}/{resource}/upload", post(upload_asset))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn record(db: &Db, message: SentMessage) -> Value {
    let data = json!(message);
    db.write().await.push(message);
    data
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn send_text(State(db): State<Db>, Query(q): Query<SendText>) -> Json<MessageResponse> {
    info!(phone = %q.phone, "send text");
    let data = record(
        &db,
        SentMessage {
            id: Uuid::new_v4(),
            to_number: q.phone,
            kind: "text".to_string(),
            text: Some(q.message),
            media_url: None,
            latitude: None,
            longitude: None,
        },
    )
    .await;
    MessageResponse::ok("Message sent successfully", data)
}

async fn send_media(
    db: &Db,
    kind: &str,
    phone: String,
    url: String,
    caption: Option<String>,
) -> Json<MessageResponse> {
    info!(phone = %phone, kind, url = %url, "send media");
    let data = record(
        db,
        SentMessage {
            id: Uuid::new_v4(),
            to_number: phone,
            kind: kind.to_string(),
            text: blank_to_none(caption),
            media_url: Some(url),
            latitude: None,
            longitude: None,
        },
    )
    .await;
    MessageResponse::ok("Media sent successfully", data)
}

async fn send_image(State(db): State<Db>, Query(q): Query<SendImage>) -> Json<MessageResponse> {
    send_media(&db, "image", q.phone, q.image_url, q.caption).await
}

async fn send_document(State(db): State<Db>, Query(q): Query<SendDocument>) -> Json<MessageResponse> {
    send_media(&db, "document", q.phone, q.document_url, q.caption).await
}

async fn send_audio(State(db): State<Db>, Query(q): Query<SendAudio>) -> Json<MessageResponse> {
    send_media(&db, "audio", q.phone, q.audio_url, q.caption).await
}

async fn send_location(State(db): State<Db>, Query(q): Query<SendLocation>) -> Json<MessageResponse> {
    info!(phone = %q.phone, lat = %q.latitude, lng = %q.longitude, "send location");
    let data = record(
        &db,
        SentMessage {
            id: Uuid::new_v4(),
            to_number: q.phone,
            kind: "location".to_string(),
            text: blank_to_none(q.address),
            media_url: None,
            latitude: Some(q.latitude),
            longitude: Some(q.longitude),
        },
    )
    .await;
    MessageResponse::ok("Location sent successfully", data)
}

async fn get_messages(State(db): State<Db>, Query(p): Query<Page>) -> Json<MessageResponse> {
    let messages = db.read().await;
    let page: Vec<&SentMessage> = messages
        .iter()
        .skip(p.page.saturating_sub(1).saturating_mul(p.limit))
        .take(p.limit)
        .collect();
    MessageResponse::ok(
        "Messages retrieved",
        json!({
            "page": p.page,
            "limit": p.limit,
            "total": messages.len(),
            "messages": page,
        }),
    )
}

async fn get_status(State(db): State<Db>) -> Json<MessageResponse> {
    let sent = db.read().await.len();
    MessageResponse::ok("Status retrieved", json!({ "status": "active", "sent": sent }))
}

fn host_error(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": { "message": message } })))
}

async fn upload_asset(
    Path((cloud, resource)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut file: Option<(String, usize)> = None;
    let mut preset: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| host_error(&e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| host_error(&e.body_text()))?;
                file = Some((filename, bytes.len()));
            }
            "upload_preset" => {
                preset = Some(field.text().await.map_err(|e| host_error(&e.body_text()))?);
            }
            _ => {}
        }
    }

    if preset.as_deref().map_or(true, str::is_empty) {
        warn!(%cloud, "upload without preset");
        return Err(host_error("Upload preset must be specified when using unsigned upload"));
    }
    let Some((filename, size)) = file else {
        warn!(%cloud, "upload without file");
        return Err(host_error("Missing required parameter - file"));
    };

    let public_id = Uuid::new_v4().simple().to_string();
    let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("bin");
    info!(%cloud, %resource, %filename, size, "asset uploaded");
    Ok(Json(json!({
        "public_id": public_id,
        "resource_type": resource,
        "bytes": size,
        "secure_url": format!("https://res.mock.local/{cloud}/{resource}/upload/v1/{public_id}.{ext}"),
    })))
}
