use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use tokio::time::Duration;
use url::Url;

const LOG_PATH: &str = "api/log";
const SETPOINT_PATH: &str = "api/setpoint";

/// HTTP implementation of [`GrowApi`](super::GrowApi)
#[derive(Debug, Clone)]
pub struct HttpApi {
    pub(crate) client: Client,
    pub(crate) log_url: Url,
    pub(crate) setpoint_url: Url,
}

impl HttpApi {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;

        let log_url = endpoint(base_url, LOG_PATH)?;
        let setpoint_url = endpoint(base_url, SETPOINT_PATH)?;
        debug!("Using endpoints {} and {}", log_url, setpoint_url);

        Ok(HttpApi {
            client,
            log_url,
            setpoint_url,
        })
    }
}

/// Join an API path onto the base URL
///
/// The base may or may not end with a slash and may carry a path prefix
/// such as `https://host/grow`; the prefix is kept in both cases.
pub fn endpoint(base_url: &Url, path: &str) -> Result<Url, String> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.set_query(None);
    base.join(path)
        .map_err(|e| format!("Cannot build URL for '{}': {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let base = Url::parse("https://example.com/grow").unwrap();
        assert_eq!(
            endpoint(&base, LOG_PATH).unwrap().as_str(),
            "https://example.com/grow/api/log"
        );

        let base = Url::parse("https://example.com/grow/").unwrap();
        assert_eq!(
            endpoint(&base, SETPOINT_PATH).unwrap().as_str(),
            "https://example.com/grow/api/setpoint"
        );
    }

    #[test]
    fn endpoints_on_bare_host() {
        let base = Url::parse("https://autogrow-api-mbmc.onrender.com").unwrap();
        assert_eq!(
            endpoint(&base, LOG_PATH).unwrap().as_str(),
            "https://autogrow-api-mbmc.onrender.com/api/log"
        );
    }

    #[test]
    fn client_builds_with_timeout() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let api = HttpApi::new(&base, Duration::from_secs(5)).unwrap();
        assert_eq!(api.setpoint_url.as_str(), "http://localhost:8080/api/setpoint");
    }
}
