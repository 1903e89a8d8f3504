//! Endpoint bindings on [`ApiClient`].

use async_trait::async_trait;
use scribe_core::{
    derive_object_key, AuthorizationGrant, CatalogEntry, CatalogRecord, MediaKind,
    NormalizedPayload, ProgressSink,
};
use serde::Deserialize;

use crate::error::ClientError;
use crate::traits::{AuthorizationClient, CatalogRegistrar, Uploader};
use crate::ApiClient;

const PRESIGN_PATH: &str = "/assets/presign";
const ASSETS_PATH: &str = "/assets";

const UPLOAD_STARTED_PERCENT: u8 = 50;
const UPLOAD_CONFIRMED_PERCENT: u8 = 100;

#[derive(Debug, Deserialize)]
struct PresignData {
    pre_sign_put_url: String,
}

impl ApiClient {
    /// Everything the catalog currently knows, newest first as returned by the server.
    #[tracing::instrument(skip(self))]
    pub async fn list_catalog(&self) -> Result<Vec<CatalogRecord>, ClientError> {
        let records: Option<Vec<CatalogRecord>> = self.get(ASSETS_PATH, &[]).await?;
        Ok(records.unwrap_or_default())
    }
}

#[async_trait]
impl AuthorizationClient for ApiClient {
    #[tracing::instrument(skip(self), fields(object_key))]
    async fn authorize(
        &self,
        filename: &str,
        kind: MediaKind,
    ) -> Result<AuthorizationGrant, ClientError> {
        let object_key = derive_object_key(filename);
        tracing::Span::current().record("object_key", object_key.as_str());

        let data: Option<PresignData> = self
            .get(
                PRESIGN_PATH,
                &[
                    ("name", object_key.clone()),
                    ("kind", kind.as_str().to_string()),
                ],
            )
            .await?;

        let write_url = data
            .map(|d| d.pre_sign_put_url)
            .filter(|url| !url.is_empty())
            .ok_or(ClientError::MissingData("pre_sign_put_url"))?;

        tracing::debug!("Write grant issued");
        Ok(AuthorizationGrant {
            object_key,
            write_url,
        })
    }
}

#[async_trait]
impl Uploader for ApiClient {
    #[tracing::instrument(skip(self, payload, progress), fields(object_key = %grant.object_key, size = payload.len()))]
    async fn upload(
        &self,
        grant: &AuthorizationGrant,
        payload: &NormalizedPayload,
        progress: &dyn ProgressSink,
    ) -> Result<(), ClientError> {
        progress.on_progress(UPLOAD_STARTED_PERCENT);
        self.put_bytes(&grant.write_url, payload.content_type, payload.bytes.clone())
            .await?;
        progress.on_progress(UPLOAD_CONFIRMED_PERCENT);

        tracing::debug!("Object stored");
        Ok(())
    }
}

#[async_trait]
impl CatalogRegistrar for ApiClient {
    #[tracing::instrument(skip(self, entries), fields(count = entries.len()))]
    async fn register(&self, entries: &[CatalogEntry]) -> Result<(), ClientError> {
        let _: Option<serde_json::Value> = self.post_json(ASSETS_PATH, entries).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use mockito::Matcher;
    use std::sync::Mutex;
    use std::time::Duration;

    fn client(base: &str, auth: Auth) -> ApiClient {
        ApiClient::new(
            base.to_string(),
            "/api/v1".to_string(),
            auth,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn grant(url: String) -> AuthorizationGrant {
        AuthorizationGrant {
            object_key: "cover-1700000000000".to_string(),
            write_url: url,
        }
    }

    fn payload() -> NormalizedPayload {
        NormalizedPayload {
            bytes: bytes::Bytes::from_static(b"RIFF....WEBP"),
            content_type: "image/webp",
        }
    }

    #[tokio::test]
    async fn authorize_requests_presigned_url_with_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/assets/presign")
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("name=cover-[0-9]+".to_string()),
                Matcher::UrlEncoded("kind".to_string(), "image".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code":200,"msg":"ok","data":{"pre_sign_put_url":"https://bucket.example.com/put?sig=abc"}}"#,
            )
            .create_async()
            .await;

        let grant = client(&server.url(), Auth::Bearer("token".to_string()))
            .authorize("photos/cover.png", MediaKind::Image)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(grant.object_key.starts_with("cover-"));
        assert_eq!(grant.write_url, "https://bucket.example.com/put?sig=abc");
    }

    #[tokio::test]
    async fn authorize_without_url_is_missing_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/assets/presign")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":200,"msg":"ok","data":null}"#)
            .create_async()
            .await;

        let err = client(&server.url(), Auth::Anonymous)
            .authorize("post.md", MediaKind::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingData("pre_sign_put_url")));
    }

    #[tokio::test]
    async fn upload_puts_bytes_without_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/bucket/cover-1700000000000")
            .match_header("content-type", "image/webp")
            .match_header("authorization", Matcher::Missing)
            .match_body("RIFF....WEBP")
            .with_status(200)
            .create_async()
            .await;

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);

        client(&server.url(), Auth::Bearer("token".to_string()))
            .upload(
                &grant(format!("{}/bucket/cover-1700000000000", server.url())),
                &payload(),
                &sink,
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(*seen.lock().unwrap(), vec![50, 100]);
    }

    #[tokio::test]
    async fn upload_rejected_by_store_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/bucket/cover-1700000000000")
            .with_status(403)
            .with_body("SignatureDoesNotMatch")
            .create_async()
            .await;

        let seen = Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().unwrap().push(p);

        let err = client(&server.url(), Auth::Anonymous)
            .upload(
                &grant(format!("{}/bucket/cover-1700000000000", server.url())),
                &payload(),
                &sink,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status { status: 403, .. }));
        assert_eq!(*seen.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn register_posts_all_entries_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/assets")
            .match_body(Matcher::Json(serde_json::json!([
                { "name": "cover-1", "kind": "image" },
                { "name": "post-2", "kind": "document" }
            ])))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":200,"msg":"ok","data":null}"#)
            .expect(1)
            .create_async()
            .await;

        let entries = vec![
            CatalogEntry {
                object_key: "cover-1".to_string(),
                media_kind: MediaKind::Image,
            },
            CatalogEntry {
                object_key: "post-2".to_string(),
                media_kind: MediaKind::Document,
            },
        ];

        client(&server.url(), Auth::Anonymous)
            .register(&entries)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn register_envelope_failure_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/assets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":500,"msg":"catalog unavailable"}"#)
            .create_async()
            .await;

        let err = client(&server.url(), Auth::Anonymous)
            .register(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { code: 500, .. }));
    }

    #[tokio::test]
    async fn list_catalog_parses_records() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/assets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code":200,"msg":"ok","data":[
                    {"name":"cover-1","kind":"image","created_at":"2026-01-02T03:04:05Z"},
                    {"name":"post-2","kind":"document","created_at":"2026-01-02T03:05:00Z"}
                ]}"#,
            )
            .create_async()
            .await;

        let records = client(&server.url(), Auth::Anonymous)
            .list_catalog()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, MediaKind::Document);
        assert_eq!(
            records[0].created_at,
            "2026-01-02T03:04:05Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
    }
}
