//! ML pipeline client.
//!
//! Forwards uploaded media to the external ML service that extracts note
//! content: OCR for images, ASR for audio, and the full pipeline that runs
//! extraction end to end and creates a note.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::MlError;

/// A block of OCR-extracted text with its confidence and bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrBlock {
    pub text: String,
    pub confidence: f64,
    pub bbox: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    blocks: Vec<OcrBlock>,
}

#[derive(Debug, Deserialize)]
struct AsrResponse {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    note_id: String,
}

/// Client for the ML extraction service.
pub struct MlClient {
    base_url: Url,
    http_client: Client,
}

impl MlClient {
    /// Default request timeout; pipeline jobs can run for minutes.
    const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Create a client with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, MlError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with an explicit timeout in seconds.
    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self, MlError> {
        let base_url =
            Url::parse(base_url).map_err(|e| MlError::InvalidBaseUrl(e.to_string()))?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MlError::RequestFailed(e.to_string()))?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Run a file through the full extraction pipeline.
    ///
    /// Returns the id of the note the service created.
    pub async fn pipeline(
        &self,
        data: Vec<u8>,
        filename: &str,
        user_id: &str,
    ) -> Result<String, MlError> {
        let response: PipelineResponse = self.send_file("/pipeline", data, filename, user_id).await?;
        Ok(response.note_id)
    }

    /// Extract text blocks from an image.
    pub async fn ocr(
        &self,
        data: Vec<u8>,
        filename: &str,
        user_id: &str,
    ) -> Result<Vec<OcrBlock>, MlError> {
        let response: OcrResponse = self.send_file("/ocr", data, filename, user_id).await?;
        Ok(response.blocks)
    }

    /// Transcribe an audio file.
    pub async fn asr(
        &self,
        data: Vec<u8>,
        filename: &str,
        user_id: &str,
    ) -> Result<String, MlError> {
        let response: AsrResponse = self.send_file("/asr", data, filename, user_id).await?;
        Ok(response.transcript)
    }

    async fn send_file<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        data: Vec<u8>,
        filename: &str,
        user_id: &str,
    ) -> Result<T, MlError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| MlError::InvalidBaseUrl(e.to_string()))?;

        debug!(endpoint = %endpoint, "sending file to ML service");

        let part = Part::bytes(data).file_name(filename.to_string());
        let mut form = Form::new().part("file", part);
        if !user_id.is_empty() {
            form = form.text("user_id", user_id.to_string());
        }

        let mut request = self.http_client.post(url).multipart(form);
        if !user_id.is_empty() {
            request = request.header("X-User-ID", user_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MlError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MlError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pipeline_returns_note_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pipeline")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"note_id":"abc123"}"#)
            .create_async()
            .await;

        let client = MlClient::new(&server.url()).unwrap();
        let note_id = client
            .pipeline(b"fake image bytes".to_vec(), "lecture.png", "user-1")
            .await
            .unwrap();

        assert_eq!(note_id, "abc123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn ocr_returns_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/ocr")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"blocks":[{"text":"mitochondria","confidence":0.97,"bbox":[0.0,0.0,10.0,4.0]}]}"#)
            .create_async()
            .await;

        let client = MlClient::new(&server.url()).unwrap();
        let blocks = client
            .ocr(b"fake image bytes".to_vec(), "page.png", "user-1")
            .await
            .unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "mitochondria");
    }

    #[tokio::test]
    async fn error_status_surfaces_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/asr")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let client = MlClient::new(&server.url()).unwrap();
        let err = client
            .asr(b"fake audio".to_vec(), "talk.wav", "")
            .await
            .unwrap_err();

        match err {
            MlError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model crashed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            MlClient::new("not a url"),
            Err(MlError::InvalidBaseUrl(_))
        ));
    }
}
