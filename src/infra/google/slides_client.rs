use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::api_models::{self, ApiPage, ApiPresentation};
use super::google_auth::GoogleCredentials;
use crate::core::slides::{
    BatchRequest, PresentationDetails, PresentationHandle, SlideSnapshot, SlidesApi, SlidesError,
};

const SLIDES_BASE_URL: &str = "https://slides.googleapis.com/v1";

/// Minimal Slides v1 REST client. Only the calls the core layer needs.
pub struct GoogleSlidesClient {
    client: Client,
    credentials: GoogleCredentials,
    base_url: String,
}

impl GoogleSlidesClient {
    pub fn new(client: Client, credentials: GoogleCredentials) -> Self {
        Self {
            client,
            credentials,
            base_url: SLIDES_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SlidesError> {
        let token = self.credentials.bearer().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SlidesError::RemoteApi {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, SlidesError> {
        let response = check_status(response).await?;
        response.json().await.map_err(|e| SlidesError::RemoteApi {
            status: 0,
            message: format!("unexpected response body: {}", e),
        })
    }
}

/// Page object IDs are `[A-Za-z0-9_][A-Za-z0-9_:-]*`. Anything else would
/// change the meaning of the page URL.
fn check_page_id(page_id: &str) -> Result<(), SlidesError> {
    let mut chars = page_id.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphanumeric() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'))
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SlidesError::invalid(format!("'{}' is not a valid slide ID", page_id)))
    }
}

/// Turns non-2xx responses into errors. 401 means the credentials are bad.
pub(crate) async fn check_status(response: Response) -> Result<Response, SlidesError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = api_models::error_message(&body);
    if status == StatusCode::UNAUTHORIZED {
        return Err(SlidesError::Auth(message));
    }
    Err(SlidesError::RemoteApi {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SlidesApi for GoogleSlidesClient {
    async fn create_presentation(&self, title: &str) -> Result<PresentationDetails, SlidesError> {
        let url = format!("{}/presentations", self.base_url);
        let response = self
            .send(self.client.post(&url).json(&serde_json::json!({ "title": title })))
            .await?;
        let created: ApiPresentation = Self::json(response).await?;
        Ok(created.into())
    }

    async fn get_presentation(
        &self,
        presentation: &PresentationHandle,
    ) -> Result<PresentationDetails, SlidesError> {
        let url = format!("{}/presentations/{}", self.base_url, presentation);
        let response = self.send(self.client.get(&url)).await?;
        let api: ApiPresentation = Self::json(response).await?;
        tracing::debug!(presentation_id = %presentation, slides = api.slides.len(), "Fetched presentation");
        Ok(api.into())
    }

    async fn get_page(
        &self,
        presentation: &PresentationHandle,
        page_id: &str,
    ) -> Result<Option<SlideSnapshot>, SlidesError> {
        check_page_id(page_id)?;
        let url = format!(
            "{}/presentations/{}/pages/{}",
            self.base_url, presentation, page_id
        );
        let response = self.send(self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let page: ApiPage = Self::json(response).await?;
        Ok(Some(page.into_snapshot()))
    }

    async fn batch_update(
        &self,
        presentation: &PresentationHandle,
        batch: &BatchRequest,
    ) -> Result<(), SlidesError> {
        let url = format!(
            "{}/presentations/{}:batchUpdate",
            self.base_url, presentation
        );
        let response = self.send(self.client.post(&url).json(batch)).await?;
        check_status(response).await?;
        tracing::debug!(presentation_id = %presentation, requests = batch.len(), "Batch update accepted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::super::google_auth::{AccessTokenProvider, GoogleCredentials};
    use crate::core::slides::SlidesError;

    pub struct FixedToken;

    #[async_trait]
    impl AccessTokenProvider for FixedToken {
        async fn access_token(&self) -> Result<String, SlidesError> {
            Ok("test-token".to_string())
        }
    }

    pub fn credentials() -> GoogleCredentials {
        GoogleCredentials::new(Arc::new(FixedToken))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::credentials;
    use super::*;
    use crate::core::slides::page_requests::PageRequest;
    use crate::core::slides::RgbColor;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleSlidesClient {
        GoogleSlidesClient::new(Client::new(), credentials()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_create_presentation_sends_title_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/presentations"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({ "title": "Q1 Review" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "presentationId": "abc",
                "title": "Q1 Review",
                "slides": [{ "objectId": "p" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let details = client(&server).create_presentation("Q1 Review").await.unwrap();
        assert_eq!(details.presentation_id, "abc");
        assert_eq!(details.slides[0].slide_id, "p");
    }

    #[tokio::test]
    async fn test_missing_page_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/presentations/abc/pages/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "not found" }
            })))
            .mount(&server)
            .await;

        let page = client(&server)
            .get_page(&PresentationHandle::new("abc"), "ghost")
            .await
            .unwrap();
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_page_id_outside_object_id_alphabet_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objectId": "x" })))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        for page_id in ["a/b", "x?y", "", "s1#frag", "../abc"] {
            let err = client
                .get_page(&PresentationHandle::new("abc"), page_id)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "InvalidSpec", "{:?}", page_id);
        }
        assert!(check_page_id("g1a2b3_0").is_ok());
        assert!(check_page_id("title_k3J9aQ0zXw1B").is_ok());
    }

    #[tokio::test]
    async fn test_batch_update_posts_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/presentations/abc:batchUpdate"))
            .and(body_partial_json(json!({
                "requests": [{ "updatePageProperties": { "objectId": "s1" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "replies": [{}] })))
            .expect(1)
            .mount(&server)
            .await;

        let mut batch = BatchRequest::new();
        batch.push(PageRequest::background_fill("s1", RgbColor::SOFT_BACKGROUND));
        client(&server)
            .batch_update(&PresentationHandle::new("abc"), &batch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_rejection_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "Invalid requests[0].createImage: bad url" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .batch_update(&PresentationHandle::new("abc"), &BatchRequest::new())
            .await
            .unwrap_err();
        match err {
            SlidesError::RemoteApi { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("createImage"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_presentation(&PresentationHandle::new("abc"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "AuthError");
    }
}
