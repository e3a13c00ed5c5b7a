//! HTTP helper shared by the Socrata fetchers.
//!
//! Every fetch is a single attempt: a failed request is reported to the
//! caller, which decides what to leave on screen. Non-success statuses and
//! undecodable bodies are errors; the body preview is logged so a broken
//! query can be diagnosed from the log alone.

use crate::SourceError;
use crate::soql::SoqlQuery;

/// Header Socrata reads an application token from.
pub const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends `GET url?{query}` and parses the response body as JSON.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the server returns a
/// non-success status, or the body is not valid JSON.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &SoqlQuery,
    app_token: Option<&str>,
) -> Result<serde_json::Value, SourceError> {
    let mut request = client.get(url).query(&query.params());
    if let Some(token) = app_token {
        request = request.header(APP_TOKEN_HEADER, token);
    }

    log::debug!("GET {url} {:?}", query.params());
    let response = request.send().await?;

    let status = response.status();
    let final_url = response.url().to_string();
    if !status.is_success() {
        log::warn!("HTTP {status} from {final_url}");
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: final_url,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        log::error!(
            "JSON parse failed.\n  \
             url: {final_url}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        SourceError::Json(e)
    })
}

/// Decodes a JSON array of rows into `T`.
///
/// Socrata reports query errors as a JSON object rather than an array, so
/// anything other than an array is a [`SourceError::MalformedResult`].
///
/// # Errors
///
/// Returns [`SourceError`] if `body` is not an array or a row does not
/// decode as `T`.
pub fn decode_rows<T>(body: serde_json::Value) -> Result<Vec<T>, SourceError>
where
    T: serde::de::DeserializeOwned,
{
    match body {
        serde_json::Value::Array(rows) => rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SourceError::from))
            .collect(),
        other => Err(SourceError::MalformedResult {
            message: format!(
                "expected an array of rows, got: {}",
                preview(&other.to_string())
            ),
        }),
    }
}

fn preview(text: &str) -> String {
    if text.len() > BODY_PREVIEW_LEN {
        let mut end = BODY_PREVIEW_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}
