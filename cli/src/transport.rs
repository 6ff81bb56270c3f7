//! Executes core `HttpRequest`s over the network.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::Method;
use tracing::{debug, info, warn};
use wa_tester_core::{ApiError, FormField, HttpBody, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    /// One attempt, no retry. Non-2xx statuses are returned as data.
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// The blocking client's default 30s timeout is switched off.
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

/// Encode the core's field list as a `multipart/form-data` body.
pub(crate) fn multipart_form(fields: Vec<FormField>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

impl Transport for HttpTransport {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        info!(method = req.method.as_str(), url = %req.url, "sending request");
        debug!(query = ?req.query, "request parameters");

        let method = match req.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = self.client.request(method, &req.url).query(&req.query);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(HttpBody::Multipart(fields)) = req.body {
            debug!(fields = fields.len(), "multipart body");
            builder = builder.multipart(multipart_form(fields)?);
        }

        let response = builder.send().map_err(|e| {
            warn!(error = %e, url = %req.url, "request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        info!(status, "response received");

        Ok(HttpResponse { status, headers, body })
    }
}
