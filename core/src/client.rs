//! Stateless request builder and response parser for the WhatsApp backend.
//!
//! # Design
//! `WhatsappClient` holds only a `base_url`. Each send operation is a
//! `build_*` method producing an `HttpRequest`; every response goes through
//! `parse_response`, which hands the body back unchanged. The host executes
//! the round-trip in between, once, with no retry.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::MessageRequest;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/whatsapp";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Clone)]
pub struct WhatsappClient {
    base_url: String,
}

impl Default for WhatsappClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl WhatsappClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str, phone: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, format!("{}{path}", self.base_url)).with_param("phone", phone)
    }

    pub fn build_send_text(&self, phone: &str, message: &str) -> HttpRequest {
        self.post("/send", phone).with_param("message", message)
    }

    pub fn build_send_image(&self, phone: &str, image_url: &str, caption: Option<&str>) -> HttpRequest {
        self.post("/send-image", phone)
            .with_param("imageUrl", image_url)
            .with_optional_param("caption", caption)
    }

    pub fn build_send_document(&self, phone: &str, document_url: &str, caption: Option<&str>) -> HttpRequest {
        self.post("/send-document", phone)
            .with_param("documentUrl", document_url)
            .with_optional_param("caption", caption)
    }

    pub fn build_send_audio(&self, phone: &str, audio_url: &str, caption: Option<&str>) -> HttpRequest {
        self.post("/send-audio", phone)
            .with_param("audioUrl", audio_url)
            .with_optional_param("caption", caption)
    }

    pub fn build_send_location(
        &self,
        phone: &str,
        latitude: &str,
        longitude: &str,
        address: Option<&str>,
    ) -> HttpRequest {
        self.post("/send-location", phone)
            .with_param("latitude", latitude)
            .with_param("longitude", longitude)
            .with_optional_param("address", address)
    }

    /// Dispatch to the `build_send_*` method matching the request shape.
    pub fn build_send(&self, request: &MessageRequest) -> HttpRequest {
        match request {
            MessageRequest::Text { phone, message } => self.build_send_text(phone, message),
            MessageRequest::Image {
                phone,
                image_url,
                caption,
            } => self.build_send_image(phone, image_url, caption.as_deref()),
            MessageRequest::Document {
                phone,
                document_url,
                caption,
            } => self.build_send_document(phone, document_url, caption.as_deref()),
            MessageRequest::Audio {
                phone,
                audio_url,
                caption,
            } => self.build_send_audio(phone, audio_url, caption.as_deref()),
            MessageRequest::Location {
                phone,
                latitude,
                longitude,
                address,
            } => self.build_send_location(phone, latitude, longitude, address.as_deref()),
        }
    }

    pub fn build_get_messages(&self, page: u32, limit: u32) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/messages", self.base_url))
            .with_param("page", page.to_string())
            .with_param("limit", limit.to_string())
    }

    pub fn build_get_status(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/status", self.base_url))
    }

    /// Return the backend's body unchanged on 2xx, otherwise an
    /// `ApiError::Http` carrying the status and raw body.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(body_to_value(&response.body))
    }
}

/// JSON when the body parses, the raw text otherwise, `null` when empty.
pub(crate) fn body_to_value(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
