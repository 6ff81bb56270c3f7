//! The single in-memory form/response pair and its event transitions.
//!
//! # Design
//! The host drives the session from user events. Each `begin_*` method sets
//! its busy flag and returns the request to execute; the matching `finish_*`
//! method records the outcome and clears the flag. Only one send may be in
//! flight; uploads and location lookups have their own flags.

use serde_json::Value;
use tracing::debug;

use crate::builder::MessageForm;
use crate::client::WhatsappClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::UploadResult;
use crate::upload::{AssetUploader, UploadKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Stand-in for the browser geolocation API.
pub trait LocationProvider {
    fn current_position(&self) -> Result<Coordinates, ApiError>;
}

/// A provider that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<Coordinates, ApiError> {
        Ok(self.0)
    }
}

/// What is displayed after a submission: the backend's body, or the error
/// object in its place.
#[derive(Debug)]
pub enum Outcome {
    Success(Value),
    Failure(ApiError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Outcome::Success(v) => v.clone(),
            Outcome::Failure(e) => e.to_value(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FormSession {
    pub form: MessageForm,
    pub sending: bool,
    pub response: Option<Outcome>,
    pub uploading: bool,
    pub upload_error: String,
    pub getting_location: bool,
    pub location_error: String,
}

impl FormSession {
    pub fn new(form: MessageForm) -> Self {
        Self {
            form,
            ..Default::default()
        }
    }

    /// Normalize the form and build the send request. Refused while another
    /// send is in flight.
    pub fn begin_submit(&mut self, client: &WhatsappClient) -> Result<HttpRequest, ApiError> {
        if self.sending {
            return Err(ApiError::AlreadySending);
        }
        self.sending = true;
        self.response = None;
        let request = self.form.build();
        debug!(kind = %request.kind(), phone = request.phone(), "submitting message");
        Ok(client.build_send(&request))
    }

    pub fn finish_submit(&mut self, result: Result<Value, ApiError>) {
        self.response = Some(match result {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        });
        self.sending = false;
    }

    pub fn begin_upload(
        &mut self,
        uploader: &AssetUploader,
        kind: UploadKind,
        filename: &str,
        bytes: &[u8],
    ) -> HttpRequest {
        self.upload_error.clear();
        self.uploading = true;
        debug!(?kind, filename, size = bytes.len(), "uploading media");
        uploader.build_upload(kind, filename, bytes)
    }

    /// On success the media URL field is replaced; on any failure only the
    /// kind's failure message is kept.
    pub fn finish_upload(&mut self, kind: UploadKind, result: Result<UploadResult, ApiError>) {
        match result {
            Ok(upload) => self.form.media_url = upload.secure_url,
            Err(_) => self.upload_error = kind.failure_message().to_string(),
        }
        self.uploading = false;
    }

    pub fn request_location(&mut self, provider: Option<&dyn LocationProvider>) {
        let Some(provider) = provider else {
            self.location_error = "Geolocation is not supported".to_string();
            return;
        };

        self.getting_location = true;
        self.location_error.clear();
        match provider.current_position() {
            Ok(pos) => {
                self.form.latitude = pos.latitude.to_string();
                self.form.longitude = pos.longitude.to_string();
            }
            Err(e) => self.location_error = format!("Unable to get location: {e}"),
        }
        self.getting_location = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageKind, RecipientType};

    struct Denied;

    impl LocationProvider for Denied {
        fn current_position(&self) -> Result<Coordinates, ApiError> {
            Err(ApiError::Location("User denied Geolocation".to_string()))
        }
    }

    fn session() -> FormSession {
        FormSession::new(MessageForm {
            recipient_type: RecipientType::Group,
            phone_or_group_id: "123".to_string(),
            message_content: "hi".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn submit_normalizes_recipient_and_sets_sending() {
        let mut s = session();
        let req = s.begin_submit(&WhatsappClient::default()).unwrap();
        assert!(s.sending);
        assert_eq!(req.query_param("phone"), Some("123@g.us"));
    }

    #[test]
    fn second_submit_while_sending_is_refused() {
        let mut s = session();
        let client = WhatsappClient::default();
        s.begin_submit(&client).unwrap();
        assert!(matches!(s.begin_submit(&client), Err(ApiError::AlreadySending)));
    }

    #[test]
    fn failure_is_stored_and_form_stays_usable() {
        let mut s = session();
        let client = WhatsappClient::default();
        s.begin_submit(&client).unwrap();
        s.finish_submit(Err(ApiError::Transport("connection refused".to_string())));
        assert!(!s.sending);
        let shown = s.response.as_ref().unwrap().to_value();
        assert_eq!(shown["error"], "transport");

        s.begin_submit(&client).unwrap();
        assert!(s.response.is_none());
    }

    #[test]
    fn successful_upload_replaces_media_url() {
        let mut s = session();
        s.form.kind = MessageKind::Image;
        s.begin_upload(&AssetUploader::default(), UploadKind::Image, "a.jpg", b"x");
        assert!(s.uploading);
        s.finish_upload(
            UploadKind::Image,
            Ok(UploadResult {
                secure_url: "https://r/upload/w_1920,h_1920,c_limit,q_80/a.jpg".to_string(),
            }),
        );
        assert!(!s.uploading);
        assert_eq!(s.form.media_url, "https://r/upload/w_1920,h_1920,c_limit,q_80/a.jpg");
    }

    #[test]
    fn failed_upload_sets_message_and_keeps_url() {
        let mut s = session();
        s.form.media_url = "https://old".to_string();
        s.begin_upload(&AssetUploader::default(), UploadKind::Audio, "a.mp3", b"x");
        s.finish_upload(UploadKind::Audio, Err(ApiError::Transport("timeout".to_string())));
        assert_eq!(s.upload_error, "Audio upload failed.");
        assert_eq!(s.form.media_url, "https://old");
    }

    #[test]
    fn location_from_provider() {
        let mut s = session();
        let provider = FixedLocation(Coordinates {
            latitude: 12.5,
            longitude: -3.25,
        });
        s.request_location(Some(&provider));
        assert_eq!(s.form.latitude, "12.5");
        assert_eq!(s.form.longitude, "-3.25");
        assert!(s.location_error.is_empty());
        assert!(!s.getting_location);
    }

    #[test]
    fn location_errors() {
        let mut s = session();
        s.request_location(None);
        assert_eq!(s.location_error, "Geolocation is not supported");

        s.request_location(Some(&Denied));
        assert_eq!(s.location_error, "Unable to get location: User denied Geolocation");
        assert!(s.form.latitude.is_empty());
    }
}
