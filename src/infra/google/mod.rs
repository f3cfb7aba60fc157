// Google infra layer.
// - `google_auth.rs` obtains access tokens (token file or service account).
// - `slides_client.rs` talks to the Slides v1 API.
// - `drive_client.rs` uploads assets and searches for themes in Drive v3.

pub mod api_models;
pub mod drive_client;
pub mod google_auth;
pub mod slides_client;

pub use drive_client::GoogleDriveClient;
pub use google_auth::GoogleCredentials;
pub use slides_client::GoogleSlidesClient;
