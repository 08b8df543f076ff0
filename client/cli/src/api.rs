use crate::query::{ListQuery, PaginationState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;

mod rest;

pub use rest::ApiClient;

// --- Image types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_path: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    #[serde(flatten)]
    pub summary: ImageSummary,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub mime_type: String,
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePage {
    pub items: Vec<ImageSummary>,
    pub pagination: PaginationState,
}

/// Record ids arrive as strings from some backends and as numbers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// --- Form fields ---

/// Text fields shared by create and update. Built through [`ImageFields::new`],
/// which trims values and drops empty optionals so they are left out of the
/// multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFields {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Comma-separated, as the backend expects.
    pub tags: Option<String>,
    pub featured: bool,
}

impl ImageFields {
    pub fn new(title: &str, description: &str, category: &str, tags: &str, featured: bool) -> Self {
        fn non_empty(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        Self {
            title: title.trim().to_string(),
            description: non_empty(description),
            category: non_empty(category),
            tags: non_empty(tags),
            featured,
        }
    }

    pub fn to_form(&self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new().text("title", self.title.clone());
        if let Some(description) = &self.description {
            form = form.text("description", description.clone());
        }
        if let Some(category) = &self.category {
            form = form.text("category", category.clone());
        }
        if let Some(tags) = &self.tags {
            form = form.text("tags", tags.clone());
        }
        form.text("featured", self.featured.to_string())
    }
}

/// File payload of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },
    #[error("Image not found")]
    NotFound,
    #[error("request rejected: {}", .0.as_deref().unwrap_or("no details"))]
    Application(Option<String>),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Single user-visible string for any failure. Server-supplied messages
    /// win; everything else falls back to the per-operation text.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::NotFound => "Image not found".to_string(),
            ApiError::Status {
                message: Some(message),
                ..
            }
            | ApiError::Application(Some(message)) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

// --- API seam ---

/// Operations of the gallery HTTP API.
pub trait GalleryApi {
    fn list(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<ImagePage, ApiError>> + Send;

    fn detail(&self, id: &str) -> impl Future<Output = Result<ImageDetail, ApiError>> + Send;

    fn update(
        &self,
        id: &str,
        fields: &ImageFields,
    ) -> impl Future<Output = Result<ImageDetail, ApiError>> + Send;

    fn remove(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn create(
        &self,
        file: &ImageFile,
        fields: &ImageFields,
    ) -> impl Future<Output = Result<ImageDetail, ApiError>> + Send;

    fn categories(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn tags(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;
}

/// Category and tag option lists for the filter controls. Failures are
/// logged and yield empty lists; they never block the listing.
pub async fn filter_options<A: GalleryApi>(api: &A) -> (Vec<String>, Vec<String>) {
    let (categories, tags) = tokio::join!(api.categories(), api.tags());
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {}", e);
        Vec::new()
    });
    let tags = tags.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch tags: {}", e);
        Vec::new()
    });
    (categories, tags)
}
