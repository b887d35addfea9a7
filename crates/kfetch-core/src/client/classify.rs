//! Map HTTP status codes and curl failures onto `FetchError`.

use crate::error::FetchError;

/// Turn a final HTTP status into `Ok(())` for 2xx or the matching error.
pub fn check_status(url: &str, code: u32) -> Result<(), FetchError> {
    match code {
        200..=299 => Ok(()),
        401 | 403 => Err(FetchError::Authentication {
            url: url.to_string(),
            status: code,
        }),
        404 => Err(FetchError::NotFound {
            url: url.to_string(),
        }),
        _ => Err(FetchError::Http {
            url: url.to_string(),
            status: code,
        }),
    }
}

/// Every curl-level failure is a transport problem from our point of view.
pub fn network_error(url: &str, e: curl::Error) -> FetchError {
    if e.is_operation_timedout() {
        tracing::debug!("timeout talking to {}", url);
    } else if e.is_couldnt_resolve_host() || e.is_couldnt_connect() {
        tracing::debug!("could not reach {}", url);
    }
    FetchError::Network {
        url: url.to_string(),
        source: e,
    }
}
