use reqwest::{Client, RequestBuilder};

use crate::data::{RemoteEndpoint, SessionConfig};

/// Build a client for the endpoint.
///
/// Redirect following stays on (reqwest's default). Compression is
/// enabled for ordinary requests and must be disabled for resumed ones: a
/// `Range` offset is meaningless against a compressed response body, so
/// ranged requests go through a second client built with
/// `compression = false`.
pub(crate) fn build_client(
    endpoint: &RemoteEndpoint,
    config: &SessionConfig,
    compression: bool,
) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .gzip(compression);

    if let Some(proxy) = endpoint.proxy() {
        let mut proxy_config = reqwest::Proxy::all(&proxy.url)?;
        if let Some(credentials) = &proxy.credentials {
            proxy_config = proxy_config.basic_auth(&credentials.username, &credentials.password);
        }
        builder = builder.proxy(proxy_config);
    }

    builder.build()
}

/// Attach the endpoint's credentials to one request.
pub(crate) fn authenticated(
    request: RequestBuilder,
    endpoint: &RemoteEndpoint,
) -> RequestBuilder {
    match endpoint.credentials() {
        Some(credentials) => {
            request.basic_auth(&credentials.username, Some(&credentials.password))
        }
        None => request,
    }
}
