//! Turns raw form fields into a `MessageRequest`.
//!
//! The only normalization is the group suffix on the recipient. Everything
//! else is passed through untouched; the backend decides what is valid.

use serde::{Deserialize, Serialize};

use crate::types::{MessageKind, MessageRequest, RecipientType, GROUP_SUFFIX};

/// Append the group suffix when `recipient_type` is group and `raw` does not
/// already carry it. Individual ids are returned unchanged.
pub fn normalize_recipient(recipient_type: RecipientType, raw: &str) -> String {
    match recipient_type {
        RecipientType::Group if !raw.ends_with(GROUP_SUFFIX) => format!("{raw}{GROUP_SUFFIX}"),
        _ => raw.to_string(),
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Form state exactly as entered. All fields are strings, including the
/// coordinates, because they are forwarded verbatim as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageForm {
    pub recipient_type: RecipientType,
    pub phone_or_group_id: String,
    pub kind: MessageKind,
    pub message_content: String,
    pub media_url: String,
    pub caption: String,
    pub latitude: String,
    pub longitude: String,
    pub address: String,
}

impl MessageForm {
    pub fn recipient(&self) -> String {
        normalize_recipient(self.recipient_type, &self.phone_or_group_id)
    }

    /// Select the request shape for `kind` and copy over only the fields it
    /// uses.
    pub fn build(&self) -> MessageRequest {
        let phone = self.recipient();
        match self.kind {
            MessageKind::Text => MessageRequest::Text {
                phone,
                message: self.message_content.clone(),
            },
            MessageKind::Image => MessageRequest::Image {
                phone,
                image_url: self.media_url.clone(),
                caption: non_blank(&self.caption),
            },
            MessageKind::Document => MessageRequest::Document {
                phone,
                document_url: self.media_url.clone(),
                caption: non_blank(&self.caption),
            },
            MessageKind::Audio => MessageRequest::Audio {
                phone,
                audio_url: self.media_url.clone(),
                caption: non_blank(&self.caption),
            },
            MessageKind::Location => MessageRequest::Location {
                phone,
                latitude: self.latitude.clone(),
                longitude: self.longitude.clone(),
                address: non_blank(&self.address),
            },
        }
    }
}
