//! One blocking GET over a curl easy handle.

use super::classify::{check_status, network_error};
use super::TransferOptions;
use crate::credentials::Credentials;
use crate::error::FetchError;
use std::str;

/// Headers we care about from the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub content_disposition: Option<String>,
}

/// Performs a GET, feeding body chunks to `sink`.
///
/// Redirects are followed. Credentials go out as basic auth to the first host
/// only; libcurl drops them when a redirect leaves that host.
/// If `sink` fails, the transfer is aborted and the sink's error is returned.
/// A non-2xx final status is reported after the body has been consumed, so
/// callers should treat whatever `sink` received as garbage in that case.
pub fn get<F>(
    url: &str,
    credentials: Option<&Credentials>,
    opts: &TransferOptions,
    mut sink: F,
) -> Result<ResponseMeta, FetchError>
where
    F: FnMut(&[u8]) -> Result<(), FetchError>,
{
    let net = |e: curl::Error| network_error(url, e);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(net)?;
    easy.follow_location(true).map_err(net)?;
    easy.max_redirections(10).map_err(net)?;
    easy.useragent(&opts.user_agent).map_err(net)?;
    easy.connect_timeout(opts.connect_timeout).map_err(net)?;
    easy.low_speed_limit(opts.low_speed_limit).map_err(net)?;
    easy.low_speed_time(opts.low_speed_time).map_err(net)?;
    if let Some(creds) = credentials {
        easy.username(&creds.username).map_err(net)?;
        easy.password(&creds.key).map_err(net)?;
    }

    let mut header_lines: Vec<String> = Vec::new();
    let mut sink_error: Option<FetchError> = None;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    // Each redirect hop starts a new status line; keep only the last response.
                    if line.starts_with("HTTP/") {
                        header_lines.clear();
                    }
                    header_lines.push(line.to_string());
                }
                true
            })
            .map_err(net)?;
        transfer
            .write_function(|data| match sink(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(net)?;
        transfer.perform()
    };

    if let Some(e) = sink_error {
        return Err(e);
    }
    performed.map_err(net)?;

    let status = easy.response_code().map_err(net)?;
    let meta = parse_headers(&header_lines);
    tracing::debug!(status, url, "GET finished");
    check_status(url, status)?;
    Ok(meta)
}

/// Parse collected header lines of one response.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseMeta {
    let mut meta = ResponseMeta::default();
    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            meta.content_disposition = Some(value.to_string());
        }
    }
    meta
}
