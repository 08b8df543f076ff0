use super::{ApiError, GalleryApi, ImageDetail, ImageFields, ImageFile, ImagePage, ImageSummary};
use crate::config::Config;
use crate::query::{ListQuery, PaginationState};
use reqwest::StatusCode;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

/// reqwest-backed client for the gallery API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: reqwest::Url,
    client: reqwest::Client,
}

/// `{success, data?, pagination?, error?}` wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    pagination: Option<PaginationState>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(config.include_credentials)
            .build()?;
        let base = config.gallery_api_base();
        let base_url = reqwest::Url::parse(&base)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base));
        }
        Ok(Self { base_url, client })
    }

    /// Gallery base with `segment` appended as one percent-encoded path
    /// segment, so ids containing `/` or `?` stay inside it.
    fn url(&self, segment: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if !segment.is_empty() {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(segment);
            }
        }
        url
    }

    /// Check status and the `success` flag; on error, read body for detail message.
    async fn read_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, ApiError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let detail: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: detail.error.or(detail.message),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Application(envelope.error));
        }
        Ok(envelope)
    }

    /// Single-image endpoints: a 404 means the record does not exist.
    fn image_missing(err: ApiError) -> ApiError {
        match err {
            ApiError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                ApiError::NotFound
            }
            other => other,
        }
    }

    fn require_data<T>(data: Option<T>) -> Result<T, ApiError> {
        data.ok_or_else(|| ApiError::Decode("response is missing `data`".to_string()))
    }
}

impl GalleryApi for ApiClient {
    async fn list(&self, query: &ListQuery) -> Result<ImagePage, ApiError> {
        let url = self.url("");
        tracing::debug!(page = query.page, limit = query.limit, "GET {}", url);

        let resp = self.client.get(url).query(&query.to_params()).send().await?;
        let envelope: Envelope<Vec<ImageSummary>> = Self::read_envelope(resp).await?;

        let pagination = envelope
            .pagination
            .ok_or_else(|| ApiError::Decode("response is missing `pagination`".to_string()))?;
        Ok(ImagePage {
            items: Self::require_data(envelope.data)?,
            pagination,
        })
    }

    async fn detail(&self, id: &str) -> Result<ImageDetail, ApiError> {
        let url = self.url(id);
        tracing::debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;
        let envelope: Envelope<ImageDetail> =
            Self::read_envelope(resp).await.map_err(Self::image_missing)?;
        Self::require_data(envelope.data)
    }

    async fn update(&self, id: &str, fields: &ImageFields) -> Result<ImageDetail, ApiError> {
        let url = self.url(id);
        tracing::debug!("PUT {}", url);

        let resp = self
            .client
            .put(url)
            .multipart(fields.to_form())
            .send()
            .await?;
        let envelope: Envelope<ImageDetail> =
            Self::read_envelope(resp).await.map_err(Self::image_missing)?;
        Self::require_data(envelope.data)
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(id);
        tracing::debug!("DELETE {}", url);

        let resp = self.client.delete(url).send().await?;
        let _: Envelope<IgnoredAny> =
            Self::read_envelope(resp).await.map_err(Self::image_missing)?;
        Ok(())
    }

    async fn create(&self, file: &ImageFile, fields: &ImageFields) -> Result<ImageDetail, ApiError> {
        let url = self.url("");
        tracing::debug!(file = %file.file_name, size = file.bytes.len(), "POST {}", url);

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = fields.to_form().part("image", part);

        let resp = self.client.post(url).multipart(form).send().await?;
        let envelope: Envelope<ImageDetail> = Self::read_envelope(resp).await?;
        Self::require_data(envelope.data)
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let resp = self.client.get(self.url("categories")).send().await?;
        let envelope: Envelope<Vec<String>> = Self::read_envelope(resp).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn tags(&self) -> Result<Vec<String>, ApiError> {
        let resp = self.client.get(self.url("tags-list")).send().await?;
        let envelope: Envelope<Vec<String>> = Self::read_envelope(resp).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}
