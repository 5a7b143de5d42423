//! Remote document API clients
//!
//! - [`auth`]: client-credentials token exchange
//! - [`site`]: cached site-id lookup
//! - [`documents`]: file content, folder listings, drives and search

pub mod auth;
pub mod documents;
pub mod site;

pub use auth::ClientCredentialsProvider;
pub use documents::GraphDocumentClient;
pub use site::SiteResolver;

use docbridge_domain::{DocStoreError, Result};
use reqwest::{Response, StatusCode};

/// Pass 2xx responses through; turn anything else into a typed error carrying
/// the response body.
///
/// 401/403 become a transient authentication failure since a fresh token may
/// be accepted on the next attempt.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => DocStoreError::NotFound(if body.is_empty() {
            "resource not found".to_string()
        } else {
            body
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DocStoreError::auth_unavailable(format!("remote API returned {status}: {body}"))
        }
        _ => DocStoreError::Http { status: status.as_u16(), body },
    })
}

/// Percent-encode each `/`-separated segment of every part and join them,
/// dropping empty segments.
pub(crate) fn encode_segments<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(|part| part.split('/'))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_encoded_individually() {
        assert_eq!(
            encode_segments(["Shared Documents", "Reports/Q1 2024/Exp1004.csv"]),
            "Shared%20Documents/Reports/Q1%202024/Exp1004.csv"
        );
    }

    #[test]
    fn empty_parts_collapse() {
        assert_eq!(encode_segments(["", "/"]), "");
        assert_eq!(encode_segments(["", "/Exp1004.csv"]), "Exp1004.csv");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(encode_segments(["a#b?c"]), "a%23b%3Fc");
    }
}
