//! tracker クライアント
//!
//! 集計バッチの送信と、管理者向け問い合わせの素通し転送。

use scraper_common::error::{ScraperError, ScraperResult};
use scraper_common::protocol::{UsersRequests, UPDATE_PATH};

use crate::http::ServiceClient;

/// 転送先からの応答（そのまま呼び出し元へ返す）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    /// ステータスコード
    pub status: u16,
    /// Content-Type
    pub content_type: Option<String>,
    /// 本文
    pub body: Vec<u8>,
}

/// tracker クライアント
#[derive(Debug, Clone)]
pub struct CollectorClient {
    http: ServiceClient,
}

impl CollectorClient {
    /// tracker のベースURLから作成
    pub fn new(base_url: &str, key: Option<&str>) -> ScraperResult<Self> {
        Ok(Self {
            http: ServiceClient::new(base_url, key)?,
        })
    }

    /// 集計バッチを `/update` へ送信する
    pub async fn push(&self, batch: &UsersRequests) -> ScraperResult<()> {
        let response = self
            .http
            .post(UPDATE_PATH)?
            .json(batch)
            .send()
            .await
            .map_err(|e| ScraperError::Http(format!("failed to push batch: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Http(format!("tracker answered {status}")));
        }
        Ok(())
    }

    /// パスとクエリをそのまま tracker に転送し、応答を返す
    pub async fn forward(&self, path_and_query: &str) -> ScraperResult<Forwarded> {
        let response = self
            .http
            .get(path_and_query)?
            .send()
            .await
            .map_err(|e| ScraperError::Http(format!("failed to forward request: {e}")))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ScraperError::Http(format!("failed to read forwarded body: {e}")))?
            .to_vec();

        Ok(Forwarded {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_push_sends_batch_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .and(header("api-key", "secret"))
            .and(body_json(serde_json::json!({"u1": 3})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = CollectorClient::new(&server.uri(), Some("secret")).unwrap();
        let batch: UsersRequests = [("u1".to_string(), 3)].into_iter().collect();
        client.push(&batch).await.unwrap();
    }

    #[tokio::test]
    async fn test_push_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CollectorClient::new(&server.uri(), None).unwrap();
        let err = client.push(&UsersRequests::new()).await.unwrap_err();
        assert!(matches!(err, ScraperError::Http(_)));
    }

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin_query_one"))
            .and(query_param("user", "u1"))
            .and(query_param("from", "0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain; charset=utf-8")
                    .set_body_string("42"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin_query_all"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad from"))
            .mount(&server)
            .await;

        let client = CollectorClient::new(&server.uri(), None).unwrap();

        let ok = client.forward("/admin_query_one?user=u1&from=0").await.unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body, b"42");
        assert_eq!(ok.content_type.as_deref(), Some("text/plain; charset=utf-8"));

        let bad = client.forward("/admin_query_all?from=x").await.unwrap();
        assert_eq!(bad.status, 400);
        assert_eq!(bad.body, b"bad from");
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tracker/update"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tracker/admin_query_one"))
            .and(query_param("user", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("7"))
            .expect(1)
            .mount(&server)
            .await;

        let client = CollectorClient::new(&format!("{}/tracker", server.uri()), None).unwrap();
        client.push(&UsersRequests::new()).await.unwrap();

        let ok = client.forward("/admin_query_one?user=u1&from=0").await.unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body, b"7");
    }

    #[tokio::test]
    async fn test_unreachable_tracker_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = CollectorClient::new(&url, None).unwrap();
        let err = client.forward("/admin_query_all?from=0").await.unwrap_err();
        assert!(matches!(err, ScraperError::Http(_)));
    }
}
