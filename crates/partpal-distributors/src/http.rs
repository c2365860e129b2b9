use std::time::Duration;

use partpal_core::{InitializationError, LookupError};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Build the blocking client shared by every query of one adapter
pub fn build_client(base_url: &str, timeout: Duration) -> Result<Client, InitializationError> {
    let mut builder = Client::builder().timeout(timeout);

    // Loopback endpoints (local mocks, tunnels) must not be sent through a system proxy
    if is_loopback(base_url) {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| InitializationError::Http(e.to_string()))
}

fn is_loopback(base_url: &str) -> bool {
    url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .is_some_and(|h| matches!(h.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
}

pub fn transport_error(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(e.to_string())
    }
}

/// Read the body of a successful response, mapping everything else to a lookup error
pub fn success_body(response: Response, part_number: &str) -> Result<String, LookupError> {
    let status = response.status();
    let body = response.text().map_err(transport_error)?;

    if status == StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound(part_number.to_string()));
    }
    if !status.is_success() {
        return Err(LookupError::Status {
            status: status.as_u16(),
            body: truncate(&body),
        });
    }
    Ok(body)
}

pub fn truncate(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{} ...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Parse a vendor's textual number, tolerating currency symbols and thousands separators
///
/// A leading `-` is kept. Commas are only accepted as thousands separators
/// in the integer part; a comma used as the decimal mark is rejected.
pub fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    text: &str,
) -> Result<T, LookupError> {
    let invalid = || LookupError::InvalidNumber {
        field,
        value: text.to_string(),
    };

    let body = text
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != '-');
    let (sign, body) = match body.strip_prefix('-') {
        Some(rest) => (
            "-",
            rest.trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.'),
        ),
        None => ("", body),
    };
    let body = body.trim_end_matches(|c: char| !c.is_ascii_digit());

    let digits = strip_grouping(body).ok_or_else(invalid)?;
    format!("{sign}{digits}").parse().map_err(|_| invalid())
}

/// Remove thousands separators, or `None` when the commas are not grouping digits in threes
fn strip_grouping(number: &str) -> Option<String> {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }
    if !integer.contains(',') {
        return Some(number.to_string());
    }

    let is_digits = |group: &str| group.chars().all(|c| c.is_ascii_digit());
    let mut groups = integer.split(',');
    let first = groups.next().unwrap_or_default();
    let grouped = (1..=3).contains(&first.len())
        && is_digits(first)
        && groups.all(|g| g.len() == 3 && is_digits(g));

    grouped.then(|| number.replace(',', ""))
}
