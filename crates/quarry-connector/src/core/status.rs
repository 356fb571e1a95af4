use reqwest::StatusCode;

use crate::data::ResourceKind;
use crate::error::TransferError;

/// The authoritative response-code classifier shared by the GET worker,
/// the PUT worker and the HEAD existence check.
///
/// 200/206 and every other 2xx are success; 404 maps to NotFound;
/// 401/403/407 map to AuthDenied; any other code at or above 300 is a
/// transfer failure (redirects are followed by the client, so a terminal
/// 3xx means redirection went nowhere).
pub(crate) fn classify_status(
    status: StatusCode,
    kind: ResourceKind,
    url: &str,
) -> Result<(), TransferError> {
    match status.as_u16() {
        404 => Err(TransferError::NotFound {
            kind,
            url: url.to_string(),
        }),
        401 | 403 | 407 => Err(TransferError::AuthDenied {
            url: url.to_string(),
            status: status.as_u16(),
        }),
        code if code >= 300 => Err(TransferError::Failed {
            kind,
            url: url.to_string(),
            message: format!(
                "status {code} {}",
                status.canonical_reason().unwrap_or("unknown")
            ),
        }),
        _ => Ok(()),
    }
}
