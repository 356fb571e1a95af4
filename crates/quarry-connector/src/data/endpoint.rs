/// Username/password pair handed to the HTTP client at request time.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Outbound proxy for all requests against the endpoint.
#[derive(Debug, Clone)]
pub struct ProxySpec {
    pub url: String,
    pub credentials: Option<Credentials>,
}

impl ProxySpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// An immutable description of the remote repository endpoint.
///
/// The URL scheme may be any of `http`, `https`, `dav`, `dav:http` or
/// `dav:https`; the dav variants are normalized to plain http(s) when
/// requests are built. The content type must be `"default"` for this
/// connector to accept the endpoint.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    url: String,
    content_type: String,
    credentials: Option<Credentials>,
    proxy: Option<ProxySpec>,
}

impl RemoteEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: "default".to_string(),
            credentials: None,
            proxy: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySpec) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn proxy(&self) -> Option<&ProxySpec> {
        self.proxy.as_ref()
    }

    /// Whether the URL scheme is one this connector can serve.
    pub fn scheme_supported(&self) -> bool {
        let scheme = match self.url.split_once("://") {
            Some((scheme, _)) => scheme,
            None => return false,
        };
        matches!(
            scheme.to_ascii_lowercase().as_str(),
            "http" | "https" | "dav" | "dav:http" | "dav:https"
        )
    }
}
