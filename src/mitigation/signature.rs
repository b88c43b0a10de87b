//! Content sniffing by magic number.
//!
//! Used by the upload module (detected MIME type, signature check) and by
//! the file inclusion MIME check. Detection only looks at content, never at
//! the client-supplied name or content type.

/// Known binary signatures, keyed by MIME type.
pub const SIGNATURES: &[(&str, &[&[u8]])] = &[
    ("image/jpeg", &[b"\xff\xd8\xff"]),
    ("image/png", &[b"\x89PNG\r\n\x1a\n"]),
    ("application/pdf", &[b"%PDF"]),
    ("image/gif", &[b"GIF87a", b"GIF89a"]),
];

/// Fallback for content that is neither a known binary format nor text.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect a MIME type from the leading bytes of `data`.
pub fn detect_mime(data: &[u8]) -> &'static str {
    for (mime, signatures) in SIGNATURES {
        if signatures.iter().any(|sig| data.starts_with(sig)) {
            return mime;
        }
    }

    if looks_like_text(data) {
        let trimmed = data.trim_ascii_start();
        if (trimmed.starts_with(b"{") || trimmed.starts_with(b"["))
            && serde_json::from_slice::<serde_json::Value>(data).is_ok()
        {
            return "application/json";
        }
        return "text/plain";
    }

    OCTET_STREAM
}

/// Does `data` start with the signature registered for `mime`?
///
/// Types without a registered signature (plain text) never match.
pub fn matches_signature(data: &[u8], mime: &str) -> bool {
    SIGNATURES
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, signatures)| signatures.iter().any(|sig| data.starts_with(sig)))
        .unwrap_or(false)
}

fn looks_like_text(data: &[u8]) -> bool {
    !data.is_empty() && !data.contains(&0) && std::str::from_utf8(data).is_ok()
}
