// madj-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::{build_http_client, HttpFetcher};
pub use validation::{validate_url, verify_sha256};
