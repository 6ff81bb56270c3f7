//! Content-type guessing from a file name or URL.

use crate::upload::UploadKind;

const TABLE: &[(&str, &str)] = &[
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".webp", "image/webp"),
    (".mp3", "audio/mp3"),
    (".ogg", "audio/ogg"),
    (".oga", "audio/ogg"),
    (".wav", "audio/wav"),
    (".m4a", "audio/mp4"),
    (".aac", "audio/aac"),
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (".xls", "application/vnd.ms-excel"),
];

/// First table entry whose extension appears anywhere in `name`
/// (case-insensitive), else a default for `kind`.
///
/// Matching is by substring so URLs with query strings or transformation
/// segments still resolve.
pub fn detect_mime_type(name: &str, kind: UploadKind) -> &'static str {
    let lower = name.to_lowercase();
    TABLE
        .iter()
        .find(|(ext, _)| lower.contains(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(match kind {
            UploadKind::Audio => "audio/mp3",
            UploadKind::Image => "image/jpeg",
        })
}
