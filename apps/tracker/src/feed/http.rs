use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::feed::{FeedError, LiveFeed, RecordFeed};
use crate::models::{Record, RecordId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Live feed that talks to a remote tracker API, for deployments where the
/// pages are served apart from the store.
pub struct HttpFeed {
    client: Client,
    base: Url,
    collection: String,
}

impl HttpFeed {
    pub fn new(base_url: &str, collection: &str) -> Result<Self, FeedError> {
        let base = Url::parse(base_url)
            .map_err(|e| FeedError::Transport(format!("invalid API base URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FeedError::Transport(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            collection: collection.to_string(),
        })
    }

    fn endpoint(&self, id: Option<&RecordId>) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", self.collection.as_str()]);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    id: Option<&RecordId>,
) -> Result<T, FeedError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(FeedError::NotFound(id.clone()));
        }
    }
    if !status.is_success() {
        return Err(FeedError::Status(status.as_u16()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| FeedError::Decode(e.to_string()))
}

fn transport(e: reqwest::Error) -> FeedError {
    FeedError::Transport(e.to_string())
}

#[async_trait]
impl RecordFeed for HttpFeed {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FeedError> {
        let response = self
            .client
            .get(self.endpoint(None))
            .send()
            .await
            .map_err(transport)?;
        read_json(response, None).await
    }

    async fn fetch_one(&self, id: &RecordId) -> Result<Record, FeedError> {
        let response = self
            .client
            .get(self.endpoint(Some(id)))
            .send()
            .await
            .map_err(transport)?;
        read_json(response, Some(id)).await
    }
}

#[async_trait]
impl LiveFeed for HttpFeed {
    async fn update_status(&self, id: &RecordId, status: &str) -> Result<Record, FeedError> {
        let response = self
            .client
            .put(self.endpoint(Some(id)))
            .json(&json!({ "status": status }))
            .send()
            .await
            .map_err(transport)?;
        read_json(response, Some(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::{record, serve};
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};

    #[test]
    fn test_endpoint_joins_collection_and_escapes_id() {
        let feed = HttpFeed::new("http://api.example.com/tracker/", "jobs").unwrap();
        assert_eq!(
            feed.endpoint(None).as_str(),
            "http://api.example.com/tracker/api/jobs"
        );
        assert_eq!(
            feed.endpoint(Some(&RecordId::new("a b/c"))).as_str(),
            "http://api.example.com/tracker/api/jobs/a%20b%2Fc"
        );
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(HttpFeed::new("mailto:someone@example.com", "jobs").is_err());
        assert!(HttpFeed::new("not a url", "jobs").is_err());
    }

    #[tokio::test]
    async fn test_maps_remote_outcomes() {
        let router = Router::new()
            .route(
                "/api/applications",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/api/applications/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "1" {
                        Ok(Json(record("1", "Acme", "2024-01-10", "Submitted")))
                    } else {
                        Err(AxumStatus::NOT_FOUND)
                    }
                }),
            );
        let base = serve(router).await;
        let feed = HttpFeed::new(&base, "applications").unwrap();

        assert!(matches!(feed.fetch_all().await, Err(FeedError::Status(500))));
        assert_eq!(
            feed.fetch_one(&RecordId::new("1")).await.unwrap().company,
            "Acme"
        );
        assert!(matches!(
            feed.fetch_one(&RecordId::new("2")).await,
            Err(FeedError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed = HttpFeed::new(&format!("http://{addr}"), "applications").unwrap();
        assert!(matches!(feed.fetch_all().await, Err(FeedError::Transport(_))));
    }
}
