//! Domain types for the tester: recipients, message kinds and the five
//! request shapes the backend accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Suffix that marks a WhatsApp group identifier.
pub const GROUP_SUFFIX: &str = "@g.us";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    #[default]
    Individual,
    Group,
}

impl FromStr for RecipientType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(RecipientType::Individual),
            "group" => Ok(RecipientType::Group),
            other => Err(ApiError::UnknownRecipientType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Document,
    Audio,
    Location,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Document => "document",
            MessageKind::Audio => "audio",
            MessageKind::Location => "location",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "document" => Ok(MessageKind::Document),
            "audio" => Ok(MessageKind::Audio),
            "location" => Ok(MessageKind::Location),
            other => Err(ApiError::UnknownKind(other.to_string())),
        }
    }
}

/// A single submission, already normalized. Optional fields are `None`
/// when the user left them blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageRequest {
    Text {
        phone: String,
        message: String,
    },
    Image {
        phone: String,
        image_url: String,
        caption: Option<String>,
    },
    Document {
        phone: String,
        document_url: String,
        caption: Option<String>,
    },
    Audio {
        phone: String,
        audio_url: String,
        caption: Option<String>,
    },
    Location {
        phone: String,
        latitude: String,
        longitude: String,
        address: Option<String>,
    },
}

impl MessageRequest {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageRequest::Text { .. } => MessageKind::Text,
            MessageRequest::Image { .. } => MessageKind::Image,
            MessageRequest::Document { .. } => MessageKind::Document,
            MessageRequest::Audio { .. } => MessageKind::Audio,
            MessageRequest::Location { .. } => MessageKind::Location,
        }
    }

    pub fn phone(&self) -> &str {
        match self {
            MessageRequest::Text { phone, .. }
            | MessageRequest::Image { phone, .. }
            | MessageRequest::Document { phone, .. }
            | MessageRequest::Audio { phone, .. }
            | MessageRequest::Location { phone, .. } => phone,
        }
    }
}

/// What the asset host hands back after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub secure_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_lowercase_names() {
        assert_eq!("audio".parse::<MessageKind>().unwrap(), MessageKind::Audio);
        assert!(matches!(
            "vcard".parse::<MessageKind>(),
            Err(ApiError::UnknownKind(k)) if k == "vcard"
        ));
    }

    #[test]
    fn recipient_type_defaults_to_individual() {
        assert_eq!(RecipientType::default(), RecipientType::Individual);
        assert_eq!("group".parse::<RecipientType>().unwrap(), RecipientType::Group);
    }

    #[test]
    fn request_reports_its_kind_and_phone() {
        let req = MessageRequest::Location {
            phone: "123".to_string(),
            latitude: "1".to_string(),
            longitude: "2".to_string(),
            address: None,
        };
        assert_eq!(req.kind(), MessageKind::Location);
        assert_eq!(req.phone(), "123");
    }
}
