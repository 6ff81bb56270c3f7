//! Core of the WhatsApp backend tester.
//!
//! # Overview
//! Normalizes form input into one of five message shapes, builds the
//! matching backend request, builds media uploads for the asset host, and
//! parses whatever comes back. No network I/O happens here
//! (host-does-IO pattern); the caller executes every `HttpRequest` once and
//! feeds the `HttpResponse` back.
//!
//! # Design
//! - `WhatsappClient` and `AssetUploader` are stateless apart from their
//!   base URLs and upload settings.
//! - `FormSession` holds the single form/response pair and the busy flags.
//! - Backend responses are opaque `serde_json::Value`s, returned verbatim.

pub mod builder;
pub mod client;
pub mod error;
pub mod http;
pub mod mime;
pub mod session;
pub mod types;
pub mod upload;

pub use builder::{normalize_recipient, MessageForm};
pub use client::WhatsappClient;
pub use error::ApiError;
pub use http::{FormField, HttpBody, HttpMethod, HttpRequest, HttpResponse};
pub use session::{Coordinates, FixedLocation, FormSession, LocationProvider, Outcome};
pub use types::{MessageKind, MessageRequest, RecipientType, UploadResult, GROUP_SUFFIX};
pub use upload::{AssetUploader, UploadKind};
