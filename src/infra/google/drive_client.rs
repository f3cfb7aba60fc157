// Drive v3 client: uploads chart images (multipart), shares them publicly so
// the Slides API can fetch them, and searches for theme presentations.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};

use super::api_models::{DriveFile, DriveFileList};
use super::google_auth::GoogleCredentials;
use super::slides_client::check_status;
use crate::core::slides::{AssetReference, AssetUploader, SlidesError, ThemeCatalog, ThemeTemplate};

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";
const PRESENTATION_MIME: &str = "application/vnd.google-apps.presentation";

pub struct GoogleDriveClient {
    client: Client,
    credentials: GoogleCredentials,
    base_url: String,
    upload_url: String,
}

impl GoogleDriveClient {
    pub fn new(client: Client, credentials: GoogleCredentials) -> Self {
        Self {
            client,
            credentials,
            base_url: DRIVE_BASE_URL.to_string(),
            upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }

    /// Points both the metadata and upload endpoints at `root`
    /// (`{root}/drive/v3` and `{root}/upload/drive/v3`).
    pub fn with_root_url(mut self, root: &str) -> Self {
        let root = root.trim_end_matches('/');
        self.base_url = format!("{}/drive/v3", root);
        self.upload_url = format!("{}/upload/drive/v3", root);
        self
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SlidesError> {
        let token = self.credentials.bearer().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SlidesError::RemoteApi {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            })?;
        check_status(response).await
    }

    /// `files.list` restricted to presentations matching `name_clause`,
    /// newest first.
    async fn search_presentations(&self, name_clause: &str) -> Result<Vec<ThemeTemplate>, SlidesError> {
        let query = format!(
            "mimeType='{}' and trashed=false and ({})",
            PRESENTATION_MIME, name_clause
        );
        let url = format!("{}/files", self.base_url);
        let response = self
            .send(self.client.get(&url).query(&[
                ("q", query.as_str()),
                ("orderBy", "modifiedTime desc"),
                ("fields", "files(id,name,modifiedTime)"),
                ("pageSize", "100"),
            ]))
            .await?;
        let list: DriveFileList = response.json().await.map_err(|e| SlidesError::RemoteApi {
            status: 0,
            message: format!("unexpected Drive response: {}", e),
        })?;
        Ok(list.files.into_iter().map(ThemeTemplate::from).collect())
    }
}

/// Escapes a value for use inside a single-quoted Drive query string.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// `multipart/related` body: JSON metadata part followed by the media part.
fn multipart_body(boundary: &str, metadata: &serde_json::Value, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {ct}\r\n\r\n",
            b = boundary,
            meta = metadata,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn upload_failure(err: SlidesError) -> SlidesError {
    match err {
        SlidesError::RemoteApi { status, message } => {
            SlidesError::UploadFailure(format!("Drive returned {}: {}", status, message))
        }
        other => other,
    }
}

#[async_trait]
impl AssetUploader for GoogleDriveClient {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<AssetReference, SlidesError> {
        let boundary: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let metadata = serde_json::json!({ "name": file_name, "mimeType": content_type });

        let url = format!("{}/files", self.upload_url);
        let response = self
            .send(
                self.client
                    .post(&url)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={}", boundary),
                    )
                    .body(multipart_body(&boundary, &metadata, content_type, bytes)),
            )
            .await
            .map_err(upload_failure)?;
        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| SlidesError::UploadFailure(format!("unexpected Drive response: {}", e)))?;

        let permission_url = format!("{}/files/{}/permissions", self.base_url, file.id);
        self.send(
            self.client
                .post(&permission_url)
                .json(&serde_json::json!({ "role": "reader", "type": "anyone" })),
        )
        .await
        .map_err(upload_failure)?;

        tracing::info!(file_id = %file.id, file_name, bytes = bytes.len(), "Uploaded asset to Drive");
        Ok(AssetReference::from_drive_file(file.id))
    }
}

#[async_trait]
impl ThemeCatalog for GoogleDriveClient {
    async fn list_themes(&self) -> Result<Vec<ThemeTemplate>, SlidesError> {
        self.search_presentations("name contains 'theme' or name contains 'template'")
            .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ThemeTemplate>, SlidesError> {
        let clause = format!("name contains '{}'", escape_query(name));
        Ok(self.search_presentations(&clause).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::infra::google::slides_client::test_support::credentials;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Hands out `file1`, `file2`, ... per upload.
    struct SequentialIds(AtomicUsize);

    impl Respond for SequentialIds {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(200).set_body_json(json!({ "id": format!("file{}", n) }))
        }
    }

    async fn mount_drive(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .and(query_param("uploadType", "multipart"))
            .respond_with(SequentialIds(AtomicUsize::new(0)))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/file1/permissions"))
            .and(body_partial_json(json!({ "role": "reader", "type": "anyone" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "anyoneWithLink" })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/file2/permissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "anyoneWithLink" })))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> GoogleDriveClient {
        GoogleDriveClient::new(Client::new(), credentials()).with_root_url(&server.uri())
    }

    #[tokio::test]
    async fn test_same_bytes_twice_give_distinct_references() {
        let server = MockServer::start().await;
        mount_drive(&server).await;
        let drive = client(&server);

        let bytes = [137u8, 80, 78, 71];
        let first = drive.upload("chart.png", "image/png", &bytes).await.unwrap();
        let second = drive.upload("chart.png", "image/png", &bytes).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.url, "https://drive.google.com/uc?id=file1");
        assert_eq!(second.file_id, "file2");
    }

    #[tokio::test]
    async fn test_upload_rejection_is_upload_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "storage quota exceeded" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .upload("chart.png", "image/png", &[1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "UploadFailure");
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_permission_failure_is_upload_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "f9" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/f9/permissions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let err = client(&server)
            .upload("chart.png", "image/png", &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, SlidesError::UploadFailure(_)));
    }

    #[tokio::test]
    async fn test_theme_listing_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("orderBy", "modifiedTime desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [
                    { "id": "t2", "name": "Dark Theme", "modifiedTime": "2024-05-01T00:00:00Z" },
                    { "id": "t1", "name": "Company Template" }
                ]
            })))
            .mount(&server)
            .await;

        let drive = client(&server);
        let themes = drive.list_themes().await.unwrap();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].name, "Dark Theme");
        assert!(themes[1].modified.is_none());

        let found = drive.find_by_name("Dark").await.unwrap().unwrap();
        assert_eq!(found.id, "t2");
    }

    #[test]
    fn test_query_escaping() {
        assert_eq!(escape_query("Bob's \\ deck"), "Bob\\'s \\\\ deck");
    }

    #[test]
    fn test_multipart_layout() {
        let body = multipart_body("XYZ", &json!({"name": "a.png"}), "image/png", b"PNG");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--XYZ\r\nContent-Type: application/json"));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNG\r\n--XYZ--"));
    }
}
