//! Maps command-line input onto `FormSession` events.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use wa_tester_core::{
    ApiError, AssetUploader, FixedLocation, FormSession, LocationProvider, MessageForm, MessageKind, Outcome,
    RecipientType, UploadKind, WhatsappClient,
};

use crate::config::Config;
use crate::transport::Transport;
use crate::{Recipient, SendKind};

impl Recipient {
    fn apply(self, form: &mut MessageForm) {
        form.recipient_type = if self.group {
            RecipientType::Group
        } else {
            RecipientType::Individual
        };
        form.phone_or_group_id = self.to;
    }
}

/// Fill the form from `kind`. Returns the file to upload first, if any, and
/// whether the position should come from the location provider.
fn fill_form(kind: SendKind, form: &mut MessageForm) -> (Option<PathBuf>, bool) {
    match kind {
        SendKind::Text { recipient, message } => {
            recipient.apply(form);
            form.kind = MessageKind::Text;
            form.message_content = message;
            (None, false)
        }
        SendKind::Image(media) => {
            media.recipient.apply(form);
            form.kind = MessageKind::Image;
            form.media_url = media.url.unwrap_or_default();
            form.caption = media.caption.unwrap_or_default();
            (media.file, false)
        }
        SendKind::Audio(media) => {
            media.recipient.apply(form);
            form.kind = MessageKind::Audio;
            form.media_url = media.url.unwrap_or_default();
            form.caption = media.caption.unwrap_or_default();
            (media.file, false)
        }
        SendKind::Document(doc) => {
            doc.recipient.apply(form);
            form.kind = MessageKind::Document;
            form.media_url = doc.url;
            form.caption = doc.caption.unwrap_or_default();
            (None, false)
        }
        SendKind::Location(loc) => {
            loc.recipient.apply(form);
            form.kind = MessageKind::Location;
            form.latitude = loc.lat.unwrap_or_default();
            form.longitude = loc.lng.unwrap_or_default();
            form.address = loc.address.unwrap_or_default();
            (None, loc.here)
        }
    }
}

fn upload(
    config: &Config,
    transport: &dyn Transport,
    session: &mut FormSession,
    kind: UploadKind,
    path: &Path,
) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("upload");
    let uploader = AssetUploader::new(&config.upload_base, &config.cloud_name, &config.upload_preset);

    let req = session.begin_upload(&uploader, kind, filename, &bytes);
    let result = transport
        .execute(req)
        .and_then(|resp| uploader.parse_upload(kind, resp));
    if let Err(e) = &result {
        warn!(error = %e, "upload failed");
    }
    session.finish_upload(kind, result);
    Ok(())
}

/// One submission: optional upload, optional location lookup, then a single
/// send. Failures of any step become the displayed outcome.
pub fn send(config: &Config, transport: &dyn Transport, kind: SendKind) -> Result<Outcome> {
    let mut form = MessageForm::default();
    let (file, here) = fill_form(kind, &mut form);
    let mut session = FormSession::new(form);

    if let (Some(path), Some(kind)) = (file, UploadKind::for_kind(session.form.kind)) {
        upload(config, transport, &mut session, kind, &path)?;
        if !session.upload_error.is_empty() {
            return Ok(Outcome::Failure(ApiError::UploadFailed(session.upload_error.clone())));
        }
    }

    if here {
        let provider = config.location.map(FixedLocation);
        session.request_location(provider.as_ref().map(|p| p as &dyn LocationProvider));
        if !session.location_error.is_empty() {
            return Ok(Outcome::Failure(ApiError::Location(session.location_error.clone())));
        }
    }

    let client = WhatsappClient::new(&config.base_url);
    let req = session.begin_submit(&client)?;
    let result = transport
        .execute(req)
        .and_then(|resp| client.parse_response(resp));
    session.finish_submit(result);
    session.response.take().context("submission finished without a response")
}

fn fetch(transport: &dyn Transport, client: &WhatsappClient, req: wa_tester_core::HttpRequest) -> Outcome {
    match transport.execute(req).and_then(|resp| client.parse_response(resp)) {
        Ok(v) => Outcome::Success(v),
        Err(e) => Outcome::Failure(e),
    }
}

pub fn messages(config: &Config, transport: &dyn Transport, page: u32, limit: u32) -> Outcome {
    let client = WhatsappClient::new(&config.base_url);
    fetch(transport, &client, client.build_get_messages(page, limit))
}

pub fn status(config: &Config, transport: &dyn Transport) -> Outcome {
    let client = WhatsappClient::new(&config.base_url);
    fetch(transport, &client, client.build_get_status())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Write;

    use wa_tester_core::{Coordinates, HttpRequest, HttpResponse};

    use super::*;
    use crate::transport::HttpTransport;
    use crate::{LocationArgs, MediaArgs};

    /// Records every request and answers from a queue of canned responses.
    struct FakeTransport {
        requests: RefCell<Vec<HttpRequest>>,
        replies: RefCell<Vec<Result<HttpResponse, ApiError>>>,
    }

    impl FakeTransport {
        fn new(mut replies: Vec<Result<HttpResponse, ApiError>>) -> Self {
            replies.reverse();
            Self {
                requests: RefCell::new(Vec::new()),
                replies: RefCell::new(replies),
            }
        }
    }

    impl Transport for FakeTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(req);
            self.replies.borrow_mut().pop().expect("no canned reply left")
        }
    }

    fn reply(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn recipient(to: &str, group: bool) -> Recipient {
        Recipient {
            to: to.to_string(),
            group,
        }
    }

    fn config() -> Config {
        Config {
            base_url: "http://backend/api/whatsapp".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn text_to_group() {
        let transport = FakeTransport::new(vec![reply(200, r#"{"success":true}"#)]);
        let outcome = send(
            &config(),
            &transport,
            SendKind::Text {
                recipient: recipient("123", true),
                message: "hi".to_string(),
            },
        )
        .unwrap();

        assert!(outcome.is_success());
        let requests = transport.requests.borrow();
        assert_eq!(
            requests[0].full_url(),
            "http://backend/api/whatsapp/send?phone=123%40g.us&message=hi"
        );
    }

    #[test]
    fn transport_failure_is_outcome_not_error() {
        let transport = FakeTransport::new(vec![Err(ApiError::Transport("connection refused".to_string()))]);
        let outcome = send(
            &config(),
            &transport,
            SendKind::Text {
                recipient: recipient("1", false),
                message: "x".to_string(),
            },
        )
        .unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_value()["error"], "transport");
    }

    #[test]
    fn image_file_is_uploaded_then_sent() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"JPEG").unwrap();

        let transport = FakeTransport::new(vec![
            reply(200, r#"{"secure_url":"https://res/image/upload/v1/a.jpg"}"#),
            reply(200, r#"{"success":true}"#),
        ]);
        let outcome = send(
            &config(),
            &transport,
            SendKind::Image(MediaArgs {
                recipient: recipient("1", false),
                url: None,
                file: Some(file.path().to_path_buf()),
                caption: Some("hey".to_string()),
            }),
        )
        .unwrap();

        assert!(outcome.is_success());
        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://api.cloudinary.com/v1_1/dejkcs9v6/image/upload");
        assert_eq!(
            requests[1].query_param("imageUrl"),
            Some("https://res/image/upload/w_1920,h_1920,c_limit,q_80/v1/a.jpg")
        );
        assert_eq!(requests[1].query_param("caption"), Some("hey"));
    }

    #[test]
    fn failed_upload_skips_send() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(b"MP3").unwrap();

        let transport = FakeTransport::new(vec![reply(400, r#"{"error":{"message":"bad"}}"#)]);
        let outcome = send(
            &config(),
            &transport,
            SendKind::Audio(MediaArgs {
                recipient: recipient("1", false),
                url: None,
                file: Some(file.path().to_path_buf()),
                caption: None,
            }),
        )
        .unwrap();

        assert_eq!(outcome.to_value()["message"], "Audio upload failed.");
        assert_eq!(transport.requests.borrow().len(), 1);
    }

    #[test]
    fn missing_file_is_a_setup_error() {
        let transport = FakeTransport::new(Vec::new());
        let result = send(
            &config(),
            &transport,
            SendKind::Image(MediaArgs {
                recipient: recipient("1", false),
                url: None,
                file: Some("/nonexistent/cat.png".into()),
                caption: None,
            }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn here_uses_configured_location() {
        let transport = FakeTransport::new(vec![reply(200, "{}")]);
        let config = Config {
            location: Some(Coordinates {
                latitude: 1.5,
                longitude: 2.5,
            }),
            ..config()
        };
        send(
            &config,
            &transport,
            SendKind::Location(LocationArgs {
                recipient: recipient("1", false),
                lat: None,
                lng: None,
                here: true,
                address: None,
            }),
        )
        .unwrap();

        let requests = transport.requests.borrow();
        assert_eq!(requests[0].query_param("latitude"), Some("1.5"));
        assert_eq!(requests[0].query_param("longitude"), Some("2.5"));
        assert!(requests[0].query_param("address").is_none());
    }

    #[test]
    fn here_without_location_is_reported() {
        let transport = FakeTransport::new(Vec::new());
        let outcome = send(
            &config(),
            &transport,
            SendKind::Location(LocationArgs {
                recipient: recipient("1", false),
                lat: None,
                lng: None,
                here: true,
                address: None,
            }),
        )
        .unwrap();
        assert_eq!(outcome.to_value()["message"], "Geolocation is not supported");
        assert!(transport.requests.borrow().is_empty());
    }

    fn start_mock() -> std::net::SocketAddr {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    }

    #[test]
    fn status_against_mock_backend() {
        let addr = start_mock();
        let config = Config {
            base_url: format!("http://{addr}/api/whatsapp"),
            ..Config::default()
        };
        let transport = HttpTransport::new().unwrap();
        let outcome = status(&config, &transport);
        assert_eq!(outcome.to_value()["data"]["status"], "active");

        let outcome = messages(&config, &transport, 1, 20);
        assert_eq!(outcome.to_value()["data"]["total"], 0);
    }

    #[test]
    fn quoted_file_name_uploads_and_sends_against_mock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my \"cat\" pic.png");
        std::fs::write(&path, b"PNGDATA").unwrap();

        let addr = start_mock();
        let config = Config {
            base_url: format!("http://{addr}/api/whatsapp"),
            upload_base: format!("http://{addr}/v1_1"),
            ..Config::default()
        };
        let transport = HttpTransport::new().unwrap();
        let outcome = send(
            &config,
            &transport,
            SendKind::Image(MediaArgs {
                recipient: recipient("1", false),
                url: None,
                file: Some(path),
                caption: None,
            }),
        )
        .unwrap();

        assert!(outcome.is_success(), "{}", outcome.to_value());
        let shown = outcome.to_value();
        let media_url = shown["data"]["media_url"].as_str().unwrap();
        assert!(media_url.starts_with(&format!(
            "https://res.mock.local/{}/image/upload/w_1920,h_1920,c_limit,q_80/v1/",
            config.cloud_name
        )));
    }
}
