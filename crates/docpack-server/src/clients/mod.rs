//! HTTP clients for the two downstream publication systems.

pub mod confluence;
pub mod jira;

use base64::Engine;

/// Basic-auth header value for the Atlassian-style `email:token` scheme.
pub fn basic_auth(email: &str, token: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{email}:{token}"));
    format!("Basic {encoded}")
}
