//! サービス間HTTPクライアント
//!
//! ベースURLと `api-key` ヘッダーを束ねた薄いラッパー。

use reqwest::{Client, RequestBuilder, Url};
use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::protocol::API_KEY_HEADER;
use std::time::Duration;

/// 1リクエストのタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// 他サービス向けクライアント
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base: Url,
    key: Option<String>,
}

impl ServiceClient {
    /// ベースURLとAPIキーから作成（URLが不正なら設定エラー）
    pub fn new(base_url: &str, key: Option<&str>) -> ScraperResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ScraperError::Config(format!("invalid URL {base_url}: {e}")))?;
        base.set_query(None);
        base.set_fragment(None);
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ScraperError::Config(format!(
                "unsupported URL scheme in {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScraperError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            key: key.filter(|k| !k.is_empty()).map(str::to_string),
        })
    }

    /// GETリクエストを組み立てる（`path_and_query` はクエリ文字列を含んでよい）
    pub fn get(&self, path_and_query: &str) -> ScraperResult<RequestBuilder> {
        Ok(self.authorize(self.client.get(self.url(path_and_query)?)))
    }

    /// POSTリクエストを組み立てる
    pub fn post(&self, path: &str) -> ScraperResult<RequestBuilder> {
        Ok(self.authorize(self.client.post(self.url(path)?)))
    }

    /// ベースURLのパスの後ろに連結する（ベースのパス接頭辞は保持する）
    fn url(&self, path_and_query: &str) -> ScraperResult<Url> {
        let prefix = self.base.as_str().trim_end_matches('/');
        let suffix = path_and_query.trim_start_matches('/');

        Url::parse(&format!("{prefix}/{suffix}"))
            .map_err(|e| ScraperError::InvalidInput(format!("invalid path {path_and_query}: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_urls() {
        assert!(matches!(
            ServiceClient::new("not a url", None),
            Err(ScraperError::Config(_))
        ));
        assert!(matches!(
            ServiceClient::new("ftp://tracker:21", None),
            Err(ScraperError::Config(_))
        ));
    }

    #[test]
    fn test_joins_path_and_query() {
        let client = ServiceClient::new("http://127.0.0.1:8091", None).unwrap();
        let url = client.url("/admin_query_one?user=u1&from=0").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8091/admin_query_one?user=u1&from=0");
    }

    #[test]
    fn test_keeps_base_path_prefix() {
        for base in ["http://host:8091/tracker", "http://host:8091/tracker/"] {
            let client = ServiceClient::new(base, None).unwrap();
            assert_eq!(
                client.url("/update").unwrap().as_str(),
                "http://host:8091/tracker/update"
            );
            assert_eq!(
                client.url("/admin_query_all?from=0").unwrap().as_str(),
                "http://host:8091/tracker/admin_query_all?from=0"
            );
        }
    }
}
