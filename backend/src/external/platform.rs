//! Host platform API client
//!
//! Renders reports and delivers chatter messages, activities and
//! notifications through the platform REST API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::PlatformConfig;
use crate::error::{AppError, AppResult};
use crate::ports::{Activity, Chatter, ChatterMessage, RecordRef, ReportRenderer};

/// Platform API client
#[derive(Clone)]
pub struct PlatformClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct RenderRequest {
    model: &'static str,
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    /// Base64 PDF content
    content: String,
}

#[derive(Debug, Serialize)]
struct NotifyRequest<'a> {
    subject: &'a str,
    body: &'a str,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Platform client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    async fn execute(&self, request: RequestBuilder) -> AppResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::PlatformApiError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PlatformApiError(format!("{} - {}", status, body)));
        }
        Ok(response)
    }

    fn chatter_path(target: RecordRef, endpoint: &str) -> String {
        format!("/chatter/{}/{}/{}", target.model.as_str(), target.id, endpoint)
    }
}

#[async_trait]
impl ReportRenderer for PlatformClient {
    async fn render_pdf(&self, report: &str, record: RecordRef) -> AppResult<Vec<u8>> {
        let request = self
            .post(&format!("/reports/{}/render", report))
            .json(&RenderRequest {
                model: record.model.as_str(),
                id: record.id,
            });

        let data: RenderResponse = self
            .execute(request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::PlatformApiError(format!("Failed to parse report: {}", e)))?;

        STANDARD
            .decode(data.content)
            .map_err(|e| AppError::PlatformApiError(format!("Invalid report content: {}", e)))
    }
}

#[async_trait]
impl Chatter for PlatformClient {
    async fn post_message(&self, target: RecordRef, message: ChatterMessage) -> AppResult<()> {
        let request = self
            .post(&Self::chatter_path(target, "messages"))
            .json(&message);
        self.execute(request).await?;
        Ok(())
    }

    async fn schedule_activity(&self, target: RecordRef, activity: Activity) -> AppResult<()> {
        let request = self
            .post(&Self::chatter_path(target, "activities"))
            .json(&activity);
        self.execute(request).await?;
        Ok(())
    }

    async fn notify_followers(
        &self,
        target: RecordRef,
        subject: &str,
        body: &str,
    ) -> AppResult<()> {
        let request = self
            .post(&Self::chatter_path(target, "notify"))
            .json(&NotifyRequest { subject, body });
        self.execute(request).await?;
        Ok(())
    }

    async fn notify_group(&self, group_id: Uuid, subject: &str, body: &str) -> AppResult<()> {
        let request = self
            .post(&format!("/groups/{}/notify", group_id))
            .json(&NotifyRequest { subject, body });
        self.execute(request).await?;
        Ok(())
    }
}
