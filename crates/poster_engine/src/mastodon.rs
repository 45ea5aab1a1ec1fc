//! Mastodon REST client.
//!
//! Statuses go to `POST /api/v1/statuses`, attachments to `POST /api/v2/media`.
//! A `202 Accepted` upload is still being processed server-side and is polled
//! through `GET /api/v1/media/{id}` until it has a url.

use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use reqwest::header::RETRY_AFTER;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::failure_kind;
use crate::{
    FailureKind, MediaId, MediaPayload, PublishError, Publisher, StatusDraft, StatusId,
    SubmissionFailure,
};

#[derive(Debug, Clone)]
pub struct MastodonSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub media_poll_attempts: u32,
    pub media_poll_interval: Duration,
}

impl Default for MastodonSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            media_poll_attempts: 30,
            media_poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    visibility: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media_ids: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
}

#[derive(Deserialize)]
struct MediaResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

pub struct MastodonClient {
    http: reqwest::Client,
    instance: Url,
    token: String,
    settings: MastodonSettings,
}

impl MastodonClient {
    pub fn new(
        instance: &Url,
        token: impl Into<String>,
        settings: MastodonSettings,
    ) -> Result<Self, SubmissionFailure> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SubmissionFailure::new(FailureKind::Network, err.to_string()))?;

        let mut instance = instance.clone();
        if !instance.path().ends_with('/') {
            let path = format!("{}/", instance.path());
            instance.set_path(&path);
        }

        Ok(Self {
            http,
            instance,
            token: token.into(),
            settings,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SubmissionFailure> {
        self.instance
            .join(path)
            .map_err(|err| SubmissionFailure::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, SubmissionFailure> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| SubmissionFailure::new(failure_kind(&err), err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let kind = match status.as_u16() {
            401 | 403 => FailureKind::Unauthorized,
            429 => FailureKind::RateLimited { retry_after },
            400 | 422 => FailureKind::Rejected,
            code => FailureKind::HttpStatus(code),
        };
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|api| api.error)
            .unwrap_or_else(|_| status.to_string());
        Err(SubmissionFailure::new(kind, message))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SubmissionFailure> {
        response
            .json::<T>()
            .await
            .map_err(|err| SubmissionFailure::new(FailureKind::InvalidResponse, err.to_string()))
    }

    async fn post_status(&self, draft: &StatusDraft) -> Result<StatusId, SubmissionFailure> {
        let body = StatusRequest {
            status: &draft.text,
            visibility: draft.visibility.as_str(),
            media_ids: draft.media_ids.iter().map(MediaId::as_str).collect(),
            in_reply_to_id: draft.in_reply_to.as_ref().map(StatusId::as_str),
        };
        let url = self.endpoint("api/v1/statuses")?;
        let response = self.send(self.http.post(url).json(&body)).await?;
        let created: StatusResponse = Self::read_json(response).await?;
        engine_debug!("created status {}", created.id);
        Ok(StatusId(created.id))
    }

    async fn post_media(&self, media: MediaPayload) -> Result<MediaId, SubmissionFailure> {
        let part = Part::bytes(media.bytes)
            .file_name(media.file_name)
            .mime_str(&media.mime)
            .map_err(|err| {
                SubmissionFailure::new(
                    FailureKind::UnsupportedContentType {
                        content_type: media.mime.clone(),
                    },
                    err.to_string(),
                )
            })?;
        let mut form = Form::new().part("file", part);
        if let Some(description) = media.description {
            form = form.text("description", description);
        }

        let url = self.endpoint("api/v2/media")?;
        let response = self.send(self.http.post(url).multipart(form)).await?;
        let processing = response.status() == StatusCode::ACCEPTED;
        let uploaded: MediaResponse = Self::read_json(response).await?;
        if processing || uploaded.url.is_none() {
            return self.await_processing(uploaded.id).await;
        }
        engine_debug!("uploaded media {}", uploaded.id);
        Ok(MediaId(uploaded.id))
    }

    async fn await_processing(&self, id: String) -> Result<MediaId, SubmissionFailure> {
        let url = self.endpoint(&format!("api/v1/media/{id}"))?;
        for attempt in 1..=self.settings.media_poll_attempts {
            tokio::time::sleep(self.settings.media_poll_interval).await;
            let response = self.send(self.http.get(url.clone())).await?;
            let still_processing = response.status() == StatusCode::PARTIAL_CONTENT;
            let media: MediaResponse = Self::read_json(response).await?;
            if !still_processing && media.url.is_some() {
                engine_debug!("media {id} ready after {attempt} poll(s)");
                return Ok(MediaId(media.id));
            }
            engine_trace!("media {id} still processing (poll {attempt})");
        }
        Err(SubmissionFailure::new(
            FailureKind::ProcessingTimeout,
            format!(
                "media {id} not ready after {} poll(s)",
                self.settings.media_poll_attempts
            ),
        ))
    }
}

#[async_trait::async_trait]
impl Publisher for MastodonClient {
    async fn upload_media(&self, media: MediaPayload) -> Result<MediaId, PublishError> {
        let src = media.file_name.clone();
        self.post_media(media)
            .await
            .map_err(|failure| PublishError::media(src, failure))
    }

    async fn create_status(&self, draft: StatusDraft) -> Result<StatusId, PublishError> {
        self.post_status(&draft)
            .await
            .map_err(PublishError::PostSubmission)
    }
}
