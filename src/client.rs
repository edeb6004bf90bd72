use crate::{
    error::ErrorKind,
    files::{
        model::{CreateFileMetadata, CreateFileRequest, UploadFileResponse},
        File, FileBuilder,
    },
    generation::{GenerateContentRequest, GenerationResponse},
};
use mime::Mime;
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, ClientBuilder, Response,
};
use serde::de::DeserializeOwned;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{fmt, sync::Arc};
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to build HTTP client"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("response is missing the '{header}' header"))]
    MissingResponseHeader { header: String },

    #[snafu(display("failed to read response body"))]
    DecodeResponse { source: reqwest::Error },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidApiKey { .. } | Error::BuildClient { .. } | Error::ConstructUrl { .. } => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Remote,
        }
    }
}

/// Gemini model identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    Gemini20Flash,
    Gemini25Flash,
    Gemini25Pro,
    /// Any other model, stored with its `models/` prefix
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini20Flash => "models/gemini-2.0-flash",
            Model::Gemini25Flash => "models/gemini-2.5-flash",
            Model::Gemini25Pro => "models/gemini-2.5-pro",
            Model::Custom(name) => name,
        }
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        let name = if name.starts_with("models/") {
            name
        } else {
            format!("models/{name}")
        };

        match name.as_str() {
            "models/gemini-2.0-flash" => Model::Gemini20Flash,
            "models/gemini-2.5-flash" => Model::Gemini25Flash,
            "models/gemini-2.5-pro" => Model::Gemini25Pro,
            _ => Model::Custom(name),
        }
    }
}

impl From<&str> for Model {
    fn from(name: &str) -> Self {
        Model::from(name.to_string())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal client for making requests to the Gemini API
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: Model,
    base_url: Url,
}

impl GeminiClient {
    fn new(
        client_builder: ClientBuilder,
        api_key: &str,
        model: Model,
        mut base_url: Url,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http_client = client_builder
            .default_headers(headers)
            .build()
            .context(BuildClientSnafu)?;

        // `Url::join` drops the last path segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            model,
            base_url,
        })
    }

    /// Generate content
    #[instrument(skip_all, fields(
        model = %self.model,
        messages.parts.count = request.contents.len(),
        system.instruction.present = request.system_instruction.is_some(),
    ))]
    pub(crate) async fn generate_content_raw(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(&format!("{}:generateContent", self.model))?;
        let response = self
            .http_client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        Self::read_json(response).await
    }

    /// Upload a file with the resumable upload protocol: a `start` command that
    /// announces size and type, then a single `upload, finalize` with the bytes.
    #[instrument(skip_all, fields(file.size = file_bytes.len(), mime.type = %mime_type))]
    pub(crate) async fn upload_file(
        &self,
        display_name: Option<String>,
        file_bytes: Vec<u8>,
        mime_type: Mime,
    ) -> Result<File, Error> {
        let url = self.build_upload_url();
        let request = CreateFileRequest {
            file: CreateFileMetadata { display_name },
        };

        let response = self
            .http_client
            .post(url.clone())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header(
                "X-Goog-Upload-Header-Content-Length",
                file_bytes.len().to_string(),
            )
            .header("X-Goog-Upload-Header-Content-Type", mime_type.to_string())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;
        let response = Self::check_response(response).await?;

        let upload_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .context(MissingResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?;
        let upload_url = Url::parse(upload_url).context(ConstructUrlSnafu {
            suffix: upload_url,
        })?;
        debug!(%upload_url, "upload session started");

        let response = self
            .http_client
            .post(upload_url.clone())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(file_bytes)
            .send()
            .await
            .context(PerformRequestSnafu { url: upload_url })?;

        let response: UploadFileResponse = Self::read_json(response).await?;
        Ok(response.file)
    }

    /// Get file metadata by resource name
    #[instrument(skip_all, fields(file.name = name))]
    pub(crate) async fn get_file(&self, name: &str) -> Result<File, Error> {
        let url = self.build_url(name)?;
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        Self::read_json(response).await
    }

    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let description = response.text().await.ok().filter(|text| !text.is_empty());
        BadResponseSnafu {
            code: status.as_u16(),
            description,
        }
        .fail()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let response = Self::check_response(response).await?;
        let body = response.text().await.context(DecodeResponseSnafu)?;
        serde_json::from_str(&body).context(DeserializeSnafu)
    }

    /// Build a URL for the API
    fn build_url(&self, suffix: &str) -> Result<Url, Error> {
        self.base_url
            .join(suffix)
            .context(ConstructUrlSnafu { suffix })
    }

    /// The upload endpoint mirrors the API path under an `/upload` prefix
    fn build_upload_url(&self) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("/upload{}files", self.base_url.path());
        url.set_path(&path);
        url
    }
}

/// Client for the Gemini API
#[derive(Clone)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_model(api_key, Model::default())
    }

    /// Create a new client with the specified API key and model
    pub fn with_model(api_key: impl AsRef<str>, model: impl Into<Model>) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(ConstructUrlSnafu {
            suffix: DEFAULT_BASE_URL,
        })?;
        Self::with_model_and_base_url(api_key, model, base_url)
    }

    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url(
        api_key: impl AsRef<str>,
        model: impl Into<Model>,
        base_url: Url,
    ) -> Result<Self, Error> {
        Self::with_client_builder(Client::builder(), api_key, model, base_url)
    }

    /// Create a new client from a preconfigured HTTP client builder (proxy, timeouts)
    pub fn with_client_builder(
        client_builder: ClientBuilder,
        api_key: impl AsRef<str>,
        model: impl Into<Model>,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client =
            GeminiClient::new(client_builder, api_key.as_ref(), model.into(), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// The model every generation request is sent to
    pub fn model(&self) -> &Model {
        &self.client.model
    }

    /// Start building a file upload
    pub fn create_file<B: Into<Vec<u8>>>(&self, bytes: B) -> FileBuilder {
        FileBuilder::new(self.client.clone(), bytes)
    }

    /// Fetch the current metadata of an uploaded file
    pub async fn get_file(&self, name: &str) -> Result<File, Error> {
        self.client.get_file(name).await
    }

    /// Execute a content generation request
    pub async fn generate(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        self.client.generate_content_raw(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{files::FileState, generation::ContentBuilder};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> Gemini {
        let base_url = Url::parse(&server.url("/v1beta")).unwrap();
        Gemini::with_model_and_base_url("test-key", "gemini-2.0-flash", base_url).unwrap()
    }

    #[test]
    fn model_names_are_normalized() {
        assert_eq!(Model::from("gemini-2.5-pro"), Model::Gemini25Pro);
        assert_eq!(Model::from("models/gemini-2.0-flash"), Model::Gemini20Flash);
        assert_eq!(
            Model::from("gemini-1.5-flash").as_str(),
            "models/gemini-1.5-flash"
        );
    }

    #[tokio::test]
    async fn generate_posts_to_model_endpoint_with_key_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.0-flash:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .json_body(json!({
                        "contents": [{"parts": [{"text": "Hi"}], "role": "user"}]
                    }));
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "Hello!"}], "role": "model"},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {
                        "promptTokenCount": 2,
                        "candidatesTokenCount": 3,
                        "totalTokenCount": 5
                    }
                }));
            })
            .await;

        let gemini = client_for(&server);
        let request = ContentBuilder::new().with_user_message("Hi").build();
        let response = gemini.generate(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text().as_deref(), Some("Hello!"));
        assert_eq!(
            response.usage_metadata.unwrap().total_token_count,
            Some(5)
        );
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.0-flash:generateContent");
                then.status(429).body("quota exhausted");
            })
            .await;

        let gemini = client_for(&server);
        let request = ContentBuilder::new().with_user_message("Hi").build();
        let error = gemini.generate(request).await.unwrap_err();

        match error {
            Error::BadResponse { code, description } => {
                assert_eq!(code, 429);
                assert_eq!(description.as_deref(), Some("quota exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_runs_start_then_finalize() {
        let server = MockServer::start_async().await;
        let session_url = server.url("/upload-session/123");

        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/v1beta/files")
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", "5")
                    .header("X-Goog-Upload-Header-Content-Type", "video/mp4")
                    .json_body(json!({"file": {"display_name": "clip.mp4"}}));
                then.status(200).header("x-goog-upload-url", &session_url);
            })
            .await;
        let finalize = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload-session/123")
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body("abcde");
                then.status(200).json_body(json!({
                    "file": {
                        "name": "files/abc",
                        "mimeType": "video/mp4",
                        "sizeBytes": "5",
                        "uri": "https://example.test/files/abc",
                        "state": "PROCESSING"
                    }
                }));
            })
            .await;

        let gemini = client_for(&server);
        let file = gemini
            .create_file(b"abcde".to_vec())
            .display_name("clip.mp4")
            .with_mime_type("video/mp4".parse().unwrap())
            .upload()
            .await
            .unwrap();

        start.assert_async().await;
        finalize.assert_async().await;
        assert_eq!(file.name, "files/abc");
        assert_eq!(file.size_bytes, Some(5));
        assert_eq!(file.state, FileState::Processing);
    }

    #[tokio::test]
    async fn upload_without_session_header_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/upload/v1beta/files");
                then.status(200);
            })
            .await;

        let gemini = client_for(&server);
        let error = gemini
            .create_file(b"abc".to_vec())
            .upload()
            .await
            .unwrap_err();

        assert!(matches!(error, Error::MissingResponseHeader { .. }));
    }

    #[tokio::test]
    async fn get_file_reads_state() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/files/abc");
                then.status(200).json_body(json!({
                    "name": "files/abc",
                    "state": "ACTIVE",
                    "uri": "https://example.test/files/abc",
                    "createTime": "2024-06-01T12:00:00.000000Z"
                }));
            })
            .await;

        let file = client_for(&server).get_file("files/abc").await.unwrap();
        assert_eq!(file.state, FileState::Active);
        assert!(file.create_time.is_some());
    }
}
