//! Media upload to the third-party asset host.
//!
//! # Design
//! Same host-does-IO split as the backend client: `build_upload` produces an
//! `HttpRequest` whose body lists the multipart fields, and the host encodes
//! them on the wire. `parse_upload` turns the host's answer into an
//! `UploadResult`. Images come back with a resize/quality transformation
//! spliced into their URL; audio URLs are used as returned.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{FormField, HttpBody, HttpMethod, HttpRequest, HttpResponse};
use crate::mime::detect_mime_type;
use crate::types::{MessageKind, UploadResult};

pub const DEFAULT_UPLOAD_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_CLOUD_NAME: &str = "dejkcs9v6";
pub const DEFAULT_UPLOAD_PRESET: &str = "whatsapp_unsigned";

/// Limits delivered images to 1920x1920 at 80% quality.
pub const IMAGE_TRANSFORM_SEGMENT: &str = "/upload/w_1920,h_1920,c_limit,q_80/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Audio,
}

impl UploadKind {
    /// Documents have no upload path; they are always sent by URL.
    pub fn for_kind(kind: MessageKind) -> Option<Self> {
        match kind {
            MessageKind::Image => Some(UploadKind::Image),
            MessageKind::Audio => Some(UploadKind::Audio),
            _ => None,
        }
    }

    /// Resource type segment on the asset host. Audio goes under `video`.
    fn resource(self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Audio => "video",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            UploadKind::Image => "Image upload failed.",
            UploadKind::Audio => "Audio upload failed.",
        }
    }
}

/// Insert the image transformation after the first `/upload/` segment.
pub fn transform_image_url(secure_url: &str) -> String {
    secure_url.replacen("/upload/", IMAGE_TRANSFORM_SEGMENT, 1)
}

#[derive(Debug, Clone)]
pub struct AssetUploader {
    upload_base: String,
    cloud_name: String,
    upload_preset: String,
}

impl Default for AssetUploader {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_BASE, DEFAULT_CLOUD_NAME, DEFAULT_UPLOAD_PRESET)
    }
}

impl AssetUploader {
    pub fn new(upload_base: &str, cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            upload_base: upload_base.trim_end_matches('/').to_string(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    pub fn upload_url(&self, kind: UploadKind) -> String {
        format!("{}/{}/{}/upload", self.upload_base, self.cloud_name, kind.resource())
    }

    /// Multipart fields are `file` (with a content type guessed from the
    /// file name) and `upload_preset`.
    pub fn build_upload(&self, kind: UploadKind, filename: &str, bytes: &[u8]) -> HttpRequest {
        let fields = vec![
            FormField::File {
                name: "file".to_string(),
                filename: filename.to_string(),
                content_type: detect_mime_type(filename, kind).to_string(),
                bytes: bytes.to_vec(),
            },
            FormField::Text {
                name: "upload_preset".to_string(),
                value: self.upload_preset.clone(),
            },
        ];

        let mut req = HttpRequest::new(HttpMethod::Post, self.upload_url(kind));
        req.body = Some(HttpBody::Multipart(fields));
        req
    }

    /// Any failure, including a 2xx answer without `secure_url`, collapses
    /// into the kind's user-facing failure message.
    pub fn parse_upload(&self, kind: UploadKind, response: HttpResponse) -> Result<UploadResult, ApiError> {
        let failed = || ApiError::UploadFailed(kind.failure_message().to_string());
        if !response.is_success() {
            return Err(failed());
        }

        #[derive(Deserialize)]
        struct HostReply {
            secure_url: Option<String>,
        }

        let reply: HostReply = serde_json::from_str(&response.body).map_err(|_| failed())?;
        let secure_url = reply.secure_url.filter(|u| !u.is_empty()).ok_or_else(failed)?;
        let secure_url = match kind {
            UploadKind::Image => transform_image_url(&secure_url),
            UploadKind::Audio => secure_url,
        };
        Ok(UploadResult { secure_url })
    }
}
