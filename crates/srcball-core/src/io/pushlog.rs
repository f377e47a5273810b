//! Pushlog lookup: when was a changeset pushed to the remote repository.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use reqwest::Client;

use crate::error::BuildError;

static UPDATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<updated>\s*(.*?)\s*</updated>").expect("static regex is valid")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// URL of the pushlog feed entry for `node` in `repo`.
pub fn pushlog_url(repo: &str, node: &str) -> String {
    format!("{}/pushlog?changeset={node}", repo.trim_end_matches('/'))
}

/// Extract the first `<updated>` timestamp from a pushlog Atom feed.
///
/// # Errors
///
/// Returns [`BuildError::Pushlog`] if the element is missing or its value
/// is not a `%Y-%m-%dT%H:%M:%SZ` timestamp.
pub fn parse_updated(feed: &str) -> Result<NaiveDateTime, BuildError> {
    let raw = UPDATED
        .captures(feed)
        .and_then(|c| c.get(1))
        .ok_or_else(|| BuildError::Pushlog("no <updated> element".to_string()))?
        .as_str();

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| BuildError::Pushlog(format!("bad timestamp {raw:?}: {e}")))
}

/// Fetch the push date of `node` from the pushlog of `repo`.
///
/// # Errors
///
/// Returns an error if the request fails, the server answers with an error
/// status, or the feed carries no usable timestamp.
pub async fn fetch_push_date(
    client: &Client,
    repo: &str,
    node: &str,
) -> Result<NaiveDate, BuildError> {
    let url = pushlog_url(repo, node);
    tracing::debug!(%url, "fetching pushlog");

    let feed = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(parse_updated(&feed)?.date())
}
