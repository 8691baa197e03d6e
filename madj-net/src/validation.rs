// madj-net/src/validation.rs
use madj_common::error::{MadjError, Result};
use sha2::{Digest, Sha256};
use url::{Host, Url};

/// Verifies the SHA256 of an in-memory payload. `label` only feeds the error message.
pub fn verify_sha256(bytes: &[u8], expected: &str, label: &str) -> Result<()> {
    let actual = hex::encode(Sha256::digest(bytes));
    tracing::debug!("Calculated SHA256 for {}: {} ({} bytes)", label, actual, bytes.len());
    tracing::debug!("Expected SHA256:   {}", expected);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(MadjError::ChecksumMismatch(format!(
            "Checksum mismatch for {label}: expected {expected}, got {actual}"
        )))
    }
}

/// Validates a URL: https anywhere, plain http only against a loopback host.
pub fn validate_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| MadjError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(&url) => Ok(()),
        other => Err(MadjError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be https (or http on loopback), but got '{other}'"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
