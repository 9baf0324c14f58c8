//! Client configuration.
//!
//! Everything a client reads at call time lives here and is fixed at
//! construction; there is no process-wide header or timeout state.

use std::time::Duration;

/// Default read (query) endpoint.
pub const READ_API_URL: &str = "http://api.brightcove.com/services/library";

/// Default write (mutation) endpoint.
pub const WRITE_API_URL: &str = "http://api.brightcove.com/services/post";

/// `User-Agent` sent with every request unless overridden.
pub const USER_AGENT: &str = concat!("brightcove-api/", env!("CARGO_PKG_VERSION"));

/// Configuration for a Brightcove client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API token appended to every request.
    pub token: String,
    pub read_api_url: String,
    pub write_api_url: String,
    /// Time allowed for the response to arrive once the request is sent.
    pub read_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Extra request headers, applied over the default `User-Agent`.
    pub headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Configuration with the public endpoints and no timeouts.
    pub fn new(token: impl Into<String>) -> Self {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            token: token.into(),
            ..ClientConfigBuilder::default()
        }
    }

    /// The default `User-Agent` followed by the custom headers. A custom
    /// `User-Agent` replaces the default one.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        if !self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("user-agent")) {
            headers.push(("user-agent".to_string(), USER_AGENT.to_string()));
        }
        headers.extend(self.headers.iter().cloned());
        headers
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    token: String,
    read_api_url: Option<String>,
    write_api_url: Option<String>,
    read_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    headers: Vec<(String, String)>,
}

impl ClientConfigBuilder {
    pub fn read_api_url(mut self, url: impl Into<String>) -> Self {
        self.read_api_url = Some(url.into());
        self
    }

    pub fn write_api_url(mut self, url: impl Into<String>) -> Self {
        self.write_api_url = Some(url.into());
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set both timeouts at once.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.read_timeout(timeout).connect_timeout(timeout)
    }

    /// Add a request header. Setting the same name twice keeps the last value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers.into_iter().fold(self, |builder, (k, v)| builder.header(k, v))
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            token: self.token,
            read_api_url: trim_url(self.read_api_url.as_deref().unwrap_or(READ_API_URL)),
            write_api_url: trim_url(self.write_api_url.as_deref().unwrap_or(WRITE_API_URL)),
            read_timeout: self.read_timeout,
            connect_timeout: self.connect_timeout,
            headers: self.headers,
        }
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_endpoints() {
        let config = ClientConfig::new("tok");
        assert_eq!(config.token, "tok");
        assert_eq!(config.read_api_url, READ_API_URL);
        assert_eq!(config.write_api_url, WRITE_API_URL);
        assert!(config.read_timeout.is_none());
        assert!(config.connect_timeout.is_none());
        assert_eq!(
            config.request_headers(),
            vec![("user-agent".to_string(), USER_AGENT.to_string())]
        );
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder("tok")
            .read_api_url("http://localhost:3000/services/library/")
            .write_api_url("http://localhost:3000/services/post")
            .timeout(Duration::from_secs(5))
            .read_timeout(Duration::from_secs(60))
            .build();

        assert_eq!(config.read_api_url, "http://localhost:3000/services/library");
        assert_eq!(config.write_api_url, "http://localhost:3000/services/post");
        assert_eq!(config.read_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn custom_headers_are_merged_with_user_agent() {
        let config = ClientConfig::builder("tok")
            .header("Accept", "application/json")
            .header("accept", "text/plain")
            .build();
        assert_eq!(
            config.request_headers(),
            vec![
                ("user-agent".to_string(), USER_AGENT.to_string()),
                ("accept".to_string(), "text/plain".to_string()),
            ]
        );
    }

    #[test]
    fn custom_user_agent_replaces_default() {
        let config = ClientConfig::builder("tok")
            .headers([("User-Agent", "my-app/2.0")])
            .build();
        assert_eq!(
            config.request_headers(),
            vec![("User-Agent".to_string(), "my-app/2.0".to_string())]
        );
    }
}
