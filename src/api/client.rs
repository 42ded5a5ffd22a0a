//! Douyin web API HTTP client.

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use crate::api::context::RequestContext;
use crate::api::types::{self, PageResult};
use crate::error::{Error, Result};
use crate::media::ItemDocument;

/// Web API base URL.
const API_BASE: &str = "https://www.douyin.com/aweme/v1/web";

/// Fallback single-item endpoint that tolerates missing signatures.
const SHARE_API_BASE: &str = "https://www.iesdouyin.com/web/api/v2/aweme/iteminfo/";

/// Mobile single-item endpoint, less strictly validated.
const MOBILE_API_BASE: &str = "https://m.douyin.com/web/api/v2/aweme/iteminfo/";

/// Page size requested from listing endpoints.
const PAGE_SIZE: u32 = 35;

/// Authenticated client for metadata endpoints.
///
/// All requests carry the run's [`RequestContext`] headers. Listing methods
/// return loosely-decoded [`PageResult`]s; schema knowledge stays inside the
/// item documents.
pub struct DouyinApi {
    client: Client,
    ctx: Arc<RequestContext>,
}

impl DouyinApi {
    /// Create a client around a shared HTTP client and request context.
    pub fn new(client: Client, ctx: Arc<RequestContext>) -> Self {
        Self { client, ctx }
    }

    /// The underlying HTTP client (shared with the downloader).
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// The run's request context.
    pub fn context(&self) -> Arc<RequestContext> {
        self.ctx.clone()
    }

    /// Browser-ish query parameters every web endpoint expects.
    fn web_params(extra: &[(&str, String)]) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("device_platform".into(), "webapp".into()),
            ("aid".into(), "6383".into()),
            ("channel".into(), "channel_pc_web".into()),
            ("pc_client_type".into(), "1".into()),
            ("version_code".into(), "170400".into()),
            ("version_name".into(), "17.4.0".into()),
            ("cookie_enabled".into(), "true".into()),
            ("browser_language".into(), "zh-CN".into()),
            ("browser_platform".into(), "MacIntel".into()),
            ("browser_name".into(), "Chrome".into()),
            ("browser_version".into(), "122.0.0.0".into()),
            ("browser_online".into(), "true".into()),
        ];
        for (key, value) in extra {
            params.push(((*key).into(), value.clone()));
        }
        params
    }

    /// Make a GET request and decode the JSON body.
    async fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(params)
            .headers(self.ctx.headers())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("response status: {}", status);

        if status.as_u16() == 429 {
            return Err(Error::RateLimited(60));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::Authentication(format!("HTTP {} from {}", status, url)));
        }
        if !status.is_success() {
            return Err(Error::Api(format!("HTTP {} from {}", status, url)));
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Err(Error::Api(format!("empty response from {}", url)));
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "failed to parse response from {}: {} - {}",
                url,
                e,
                &text[..text.len().min(200)]
            ))
        })
    }

    /// Decode a listing body, enforcing its status code when present.
    fn decode_page(body: Value, cursor_key: &str, what: &str) -> Result<PageResult> {
        if let Some(code) = types::status_code(&body) {
            if code != 0 {
                let msg = types::status_msg(&body).unwrap_or("unknown error");
                return Err(Error::Api(format!("{}: status {} ({})", what, code, msg)));
            }
        }
        Ok(types::page_from_value(&body, cursor_key))
    }

    /// One page of a user's posted items.
    pub async fn user_posts(&self, sec_uid: &str, cursor: &str) -> Result<PageResult> {
        let url = format!("{}/aweme/post/", API_BASE);
        let params = Self::web_params(&[
            ("sec_user_id", sec_uid.to_string()),
            ("max_cursor", cursor_or_zero(cursor)),
            ("count", PAGE_SIZE.to_string()),
        ]);
        let body = self.get_json(&url, &params).await?;
        Self::decode_page(body, "max_cursor", "user posts")
    }

    /// One page of a user's liked items.
    pub async fn user_likes(&self, sec_uid: &str, cursor: &str) -> Result<PageResult> {
        let url = format!("{}/aweme/favorite/", API_BASE);
        let params = Self::web_params(&[
            ("sec_user_id", sec_uid.to_string()),
            ("max_cursor", cursor_or_zero(cursor)),
            ("count", PAGE_SIZE.to_string()),
        ]);
        let body = self.get_json(&url, &params).await?;
        Self::decode_page(body, "max_cursor", "user likes")
    }

    /// One page of a collection's items.
    pub async fn collection_items(&self, mix_id: &str, cursor: &str) -> Result<PageResult> {
        let url = format!("{}/mix/aweme/", API_BASE);
        let params = Self::web_params(&[
            ("mix_id", mix_id.to_string()),
            ("cursor", cursor_or_zero(cursor)),
            ("count", PAGE_SIZE.to_string()),
        ]);
        let body = self.get_json(&url, &params).await?;
        // This endpoint omits the status_code envelope.
        Ok(types::page_from_value(&body, "cursor"))
    }

    /// One page of the items using a music track.
    pub async fn music_items(&self, music_id: &str, cursor: &str) -> Result<PageResult> {
        let url = format!("{}/music/aweme/", API_BASE);
        let params = Self::web_params(&[
            ("music_id", music_id.to_string()),
            ("cursor", cursor_or_zero(cursor)),
            ("count", PAGE_SIZE.to_string()),
        ]);
        let body = self.get_json(&url, &params).await?;
        Ok(types::page_from_value(&body, "cursor"))
    }

    /// One page of a user's collection list.
    pub async fn user_mix_list(&self, sec_uid: &str, cursor: &str) -> Result<types::MixListPage> {
        let url = format!("{}/mix/list/", API_BASE);
        let params = Self::web_params(&[
            ("sec_user_id", sec_uid.to_string()),
            ("cursor", cursor_or_zero(cursor)),
            ("count", PAGE_SIZE.to_string()),
        ]);
        let body = self.get_json(&url, &params).await?;

        if let Some(code) = types::status_code(&body) {
            if code != 0 {
                let msg = types::status_msg(&body).unwrap_or("unknown error");
                return Err(Error::Api(format!("mix list: status {} ({})", code, msg)));
            }
        }
        Ok(types::mix_list_from_value(&body))
    }

    /// Single item via the web detail endpoint.
    pub async fn item_detail(&self, item_id: &str) -> Result<ItemDocument> {
        let url = format!("{}/aweme/detail/", API_BASE);
        let params = Self::web_params(&[("aweme_id", item_id.to_string())]);
        let body = self.get_json(&url, &params).await?;

        if let Some(code) = types::status_code(&body) {
            if code != 0 {
                let msg = types::status_msg(&body).unwrap_or("unknown error");
                return Err(Error::Api(format!(
                    "item detail {}: status {} ({})",
                    item_id, code, msg
                )));
            }
        }
        match body.get("aweme_detail") {
            Some(detail) if !detail.is_null() => Ok(ItemDocument::new(detail.clone())),
            _ => Err(Error::Api(format!("item detail {}: empty body", item_id))),
        }
    }

    /// Single item via the share ("iteminfo") endpoint.
    pub async fn item_share_info(&self, item_id: &str) -> Result<ItemDocument> {
        self.item_info_endpoint(SHARE_API_BASE, item_id).await
    }

    /// Single item via the mobile endpoint.
    pub async fn item_mobile_info(&self, item_id: &str) -> Result<ItemDocument> {
        self.item_info_endpoint(MOBILE_API_BASE, item_id).await
    }

    async fn item_info_endpoint(&self, base: &str, item_id: &str) -> Result<ItemDocument> {
        let params = vec![("item_ids".to_string(), item_id.to_string())];
        let body = self.get_json(base, &params).await?;

        let first = body
            .get("item_list")
            .and_then(Value::as_array)
            .and_then(|list| list.first());
        match first {
            Some(item) => Ok(ItemDocument::new(item.clone())),
            None => Err(Error::Api(format!(
                "item info {}: no item in response from {}",
                item_id, base
            ))),
        }
    }
}

fn cursor_or_zero(cursor: &str) -> String {
    if cursor.is_empty() {
        "0".to_string()
    } else {
        cursor.to_string()
    }
}
