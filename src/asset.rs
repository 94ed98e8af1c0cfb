//! Asset Resolution
//!
//! Files referenced from content nodes are often not fetchable as-is. They are
//! rewritten to go through the image proxy, which authorizes the request
//! against the owning node, and downloads fall back to the original reference
//! and then to a signed URL.

use crate::client::Client;
use crate::error::ApiError;
use crate::record::{Block, TABLE_BLOCK};
use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::HeaderMap;
use std::future::Future;
use tracing::{debug, warn};

/// Proxy prefix for node-authorized asset fetches.
pub const IMAGE_PROXY_PREFIX: &str = "https://www.notion.so/image/";
/// Storage prefix of uploaded files.
pub const STATIC_FILE_PREFIX: &str = "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/";

const SITE_ORIGIN: &str = "https://www.notion.so";
const PAGE_COVER_PREFIX: &str = "/images/page-cover/";
const ATTACHMENT_SCHEME: &str = "attachment:";

/// Hosts served directly, never proxied.
const DIRECT_PREFIXES: &[&str] = &[
    "https://cdn.dutchcowboys.nl/uploads",
    "https://images.unsplash.com",
    "https://www.notion.so/images/",
];

/// Unreserved characters stay, everything else is escaped.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Path-segment escaping: '/' and '?' are escaped, sub-delimiters are kept.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

fn permission_params(node: &Block) -> String {
    format!(
        "?id={}&table={}&spaceId={}",
        node.id, node.parent_table, node.space_id
    )
}

/// Rewrite an asset reference into the form most likely to be fetchable.
///
/// Rules apply in order and the first match wins; anything unmatched is
/// returned unchanged.
pub fn proxy_asset_url(uri: &str, node: Option<&Block>) -> String {
    if DIRECT_PREFIXES.iter().any(|p| uri.starts_with(p)) {
        return uri.to_string();
    }

    // built-in covers are stored as site-relative paths
    if uri.starts_with(PAGE_COVER_PREFIX) {
        return format!("{}{}", SITE_ORIGIN, uri);
    }

    let Some(node) = node else {
        return uri.to_string();
    };

    if uri.starts_with(IMAGE_PROXY_PREFIX) {
        return format!("{}{}", uri, permission_params(node));
    }

    if uri.starts_with(ATTACHMENT_SCHEME) {
        return format!(
            "{}{}{}",
            IMAGE_PROXY_PREFIX,
            utf8_percent_encode(uri, QUERY_ESCAPE),
            permission_params(node)
        );
    }

    if uri.contains(STATIC_FILE_PREFIX) {
        return format!(
            "{}{}{}",
            IMAGE_PROXY_PREFIX,
            utf8_percent_encode(uri, PATH_ESCAPE),
            permission_params(node)
        );
    }

    uri.to_string()
}

/// Proxied URL of an attachment. Attachments are always filed under the
/// block table, whatever their logical owner.
pub fn attachment_url(uid: &str, node: Option<&Block>) -> Option<String> {
    let node = node?;
    if uid.is_empty() {
        return None;
    }
    let mut owner = node.clone();
    owner.parent_table = TABLE_BLOCK.to_string();
    Some(proxy_asset_url(uid, Some(&owner)))
}

/// Bytes of a downloaded asset.
#[derive(Debug, Clone)]
pub struct DownloadFileResponse {
    pub url: String,
    pub data: Bytes,
    pub headers: HeaderMap,
}

/// Issues time-limited URLs for protected assets.
#[async_trait]
pub trait SignedUrlSource: Send + Sync {
    /// Returns one signed URL per input reference, in order.
    async fn get_signed_urls(&self, urls: &[String], node: &Block) -> Result<Vec<String>, ApiError>;
}

/// Try the proxied URL, then optionally the original reference, then a
/// signed URL. The first success wins; when every attempt fails the error of
/// the first attempt is returned.
pub async fn fetch_with_fallback<T, F, Fut, S>(
    uri: &str,
    node: Option<&Block>,
    try_original: bool,
    signer: &S,
    fetch: F,
) -> Result<T, ApiError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: SignedUrlSource + ?Sized,
{
    let proxied = proxy_asset_url(uri, node);
    let first_err = match fetch(proxied.clone()).await {
        Ok(res) => return Ok(res),
        Err(e) => e,
    };
    debug!(url = %proxied, error = %first_err, "Primary asset fetch failed");

    if try_original && proxied != uri {
        match fetch(uri.to_string()).await {
            Ok(res) => return Ok(res),
            Err(e) => debug!(url = %uri, error = %e, "Original asset fetch failed"),
        }
    }

    let Some(node) = node else {
        return Err(first_err);
    };
    let signed = match signer.get_signed_urls(&[uri.to_string()], node).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(url = %uri, error = %e, "Signed URL lookup failed");
            return Err(first_err);
        }
    };
    let Some(signed_url) = signed.into_iter().next() else {
        return Err(first_err);
    };

    fetch(signed_url).await.map_err(|e| {
        debug!(url = %uri, error = %e, "Signed asset fetch failed");
        first_err
    })
}

impl Client {
    /// Download a file referenced by a content node, with proxy, original
    /// and signed-URL fallbacks.
    pub async fn download_file(
        &self,
        uri: &str,
        node: Option<&Block>,
    ) -> Result<DownloadFileResponse, ApiError> {
        fetch_with_fallback(uri, node, true, self, |url| async move {
            self.download_url(&url).await
        })
        .await
    }

    /// Streaming variant of [`Client::download_file`]: proxied URL, then
    /// signed URL. The caller owns the returned response.
    pub async fn download_file_stream(
        &self,
        uri: &str,
        node: Option<&Block>,
    ) -> Result<reqwest::Response, ApiError> {
        fetch_with_fallback(uri, node, false, self, |url| async move {
            self.download_url_stream(&url).await
        })
        .await
    }

    /// Stream an attachment stored under a node.
    pub async fn download_attachment_stream(
        &self,
        uid: &str,
        node: &Block,
    ) -> Result<reqwest::Response, ApiError> {
        let url = attachment_url(uid, Some(node))
            .ok_or_else(|| ApiError::InvalidUrl("empty attachment id".to_string()))?;
        self.download_url_stream(&url).await
    }
}

#[async_trait]
impl SignedUrlSource for Client {
    async fn get_signed_urls(&self, urls: &[String], node: &Block) -> Result<Vec<String>, ApiError> {
        self.signed_file_urls(urls, node).await
    }
}
