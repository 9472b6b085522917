use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::error::{LoadError, LoadResult};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();
static TIMEOUT_SECS: OnceCell<u64> = OnceCell::new();

/// Sets the request timeout for the shared client. The first call wins and
/// must happen before the client is built to take effect.
pub fn set_http_timeout(secs: u64) -> u64 {
    *TIMEOUT_SECS.get_or_init(|| secs)
}

pub fn http_timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS.get().copied().unwrap_or(DEFAULT_TIMEOUT_SECS))
}

pub fn http_client() -> LoadResult<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(http_timeout())
            .build()
            .map_err(|err| LoadError::Http(format!("failed to build http client: {err}")))
    })
}

pub fn fetch_text(url: &str) -> LoadResult<String> {
    let resp = http_client()?
        .get(url)
        .send()
        .map_err(|err| LoadError::Http(err.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().map_err(|err| LoadError::Http(err.to_string()))
}
