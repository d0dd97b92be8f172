//! Clients for the remote collaborators: the AI drafting service and the
//! binary document text extractor.

pub mod ai;
pub mod ingest;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{ReportError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client(action: &'static str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(concat!("reportsmith/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| ReportError::External {
            action,
            cause: err.to_string(),
        })
}

/// Join a base URL and a path with exactly one slash between them.
fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::endpoint;

    #[test]
    fn endpoint_joins_with_single_slash() {
        assert_eq!(endpoint("https://api.test/", "/generate"), "https://api.test/generate");
        assert_eq!(endpoint("https://api.test", "generate"), "https://api.test/generate");
    }
}
