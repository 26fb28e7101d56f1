//! Certificate Vision Extraction Client
//!
//! Client for the hosted vision-model service that reads a certificate
//! image and returns the structured attribute record. Retries and timeout
//! policy live here; the scoring engine never performs I/O.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::RawCertificateRecord;

/// Client for the vision extraction service
#[derive(Clone)]
pub struct CertificateVisionClient {
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    http_client: Client,
}

/// Request to extract attributes from a certificate image
#[derive(Debug, Serialize)]
pub struct ExtractionRequest<'a> {
    pub request_id: Uuid,
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub image_url: &'a str,
}

/// Response from the extraction API
#[derive(Debug, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub data: Option<RawCertificateRecord>,
    pub error: Option<String>,
    #[serde(default)]
    pub retries: u32,
}

impl CertificateVisionClient {
    /// Create a new vision extraction client
    pub fn new(endpoint: String, api_key: String, model: String, max_retries: u32) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            model,
            max_retries,
            http_client,
        }
    }

    /// Create a client from environment variables
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("GEMDIG__VISION__ENDPOINT").ok()?;
        let api_key = std::env::var("GEMDIG__VISION__API_KEY").ok()?;
        let model =
            std::env::var("GEMDIG__VISION__MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Some(Self::new(endpoint, api_key, model, 4))
    }

    /// Extract the attribute record for one certificate image.
    ///
    /// Retries transient failures up to the configured limit; a terminal
    /// failure carries the last error body.
    pub async fn extract(&self, certificate_link: &str) -> AppResult<RawCertificateRecord> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.extract_once(certificate_link).await {
                Ok(record) => return Ok(record),
                Err(AppError::VisionExtraction(message)) => {
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        %message,
                        "vision extraction attempt failed"
                    );
                    last_error = message;
                }
                Err(other) => return Err(other),
            }
        }

        Err(AppError::VisionExtraction(format!(
            "extraction failed after {} attempts: {}",
            self.max_retries, last_error
        )))
    }

    async fn extract_once(&self, certificate_link: &str) -> AppResult<RawCertificateRecord> {
        let request = ExtractionRequest {
            request_id: Uuid::new_v4(),
            model: &self.model,
            temperature: 0.0,
            max_tokens: 2000,
            image_url: certificate_link,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VisionExtraction(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::VisionExtraction(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: ExtractionResponse = response
            .json()
            .await
            .map_err(|e| AppError::VisionExtraction(format!("Failed to parse response: {}", e)))?;

        match result {
            ExtractionResponse {
                success: true,
                data: Some(record),
                ..
            } => Ok(record),
            ExtractionResponse { error, .. } => Err(AppError::VisionExtraction(
                error.unwrap_or_else(|| "extraction returned no data".to_string()),
            )),
        }
    }
}
