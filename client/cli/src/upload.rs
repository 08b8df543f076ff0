//! Upload workflow: pick a local file, validate it, send it with its metadata

use crate::api::{self, GalleryApi, ImageDetail, ImageFile};
use crate::form::{FormField, ImageForm, ValidationError};
use std::path::{Path, PathBuf};

/// 5 MiB
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// How many known tags are offered as "Popular tags".
pub const POPULAR_TAG_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Failed(String),
}

/// Check a file's type and size.
pub fn validate_file(mime_type: &str, size: u64) -> Result<(), ValidationError> {
    if !mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge);
    }
    Ok(())
}

/// A local file chosen for upload. Only metadata is read until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let metadata = std::fs::metadata(path).map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime_type,
            size: metadata.len(),
        })
    }

    fn read(&self) -> Result<ImageFile, UploadError> {
        let bytes = std::fs::read(&self.path).map_err(|source| UploadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(ImageFile {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            bytes,
        })
    }
}

/// Known values offered while the form is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    form: ImageForm,
    file: Option<SelectedFile>,
    error: Option<String>,
    suggestions: Suggestions,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &ImageForm {
        &self.form
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn edit(&mut self, field: FormField) {
        self.form.apply(field);
    }

    /// Fetch category and tag options. Failures leave the lists empty.
    pub async fn load_suggestions<A: GalleryApi>(&mut self, api: &A) {
        if !self.form.category.trim().is_empty() && !self.form.tags.trim().is_empty() {
            return;
        }
        let (categories, tags) = api::filter_options(api).await;
        self.suggestions = Suggestions { categories, tags };
    }

    /// Hint lines for category and tags, only while those fields are blank.
    pub fn hints(&self) -> Vec<String> {
        let mut hints = Vec::new();
        let known = &self.suggestions;
        if self.form.category.trim().is_empty() && !known.categories.is_empty() {
            hints.push(format!("Categories: {}", known.categories.join(", ")));
        }
        if self.form.tags.trim().is_empty() && !known.tags.is_empty() {
            let popular: Vec<&str> = known
                .tags
                .iter()
                .take(POPULAR_TAG_LIMIT)
                .map(String::as_str)
                .collect();
            hints.push(format!("Popular tags: {}", popular.join(", ")));
        }
        hints
    }

    /// Accept the file only if it passes the local checks; a rejected file
    /// leaves any previous selection in place.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ValidationError> {
        if let Err(e) = validate_file(&file.mime_type, file.size) {
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.file = Some(file);
        self.error = None;
        Ok(())
    }

    /// Validate, read the file and create the record. The form is reset on
    /// success.
    pub async fn submit<A: GalleryApi>(&mut self, api: &A) -> Result<ImageDetail, UploadError> {
        let result = self.try_submit(api).await;
        match &result {
            Ok(created) => {
                tracing::info!(id = %created.summary.id, "image uploaded");
                let suggestions = std::mem::take(&mut self.suggestions);
                *self = Self {
                    suggestions,
                    ..Self::default()
                };
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    async fn try_submit<A: GalleryApi>(&self, api: &A) -> Result<ImageDetail, UploadError> {
        let selected = self.file.as_ref().ok_or(ValidationError::MissingFile)?;
        validate_file(&selected.mime_type, selected.size)?;
        self.form.validate()?;

        let file = selected.read()?;
        api.create(&file, &self.form.to_fields())
            .await
            .map_err(|e| {
                tracing::warn!("upload failed: {}", e);
                UploadError::Failed(e.user_message("Upload failed. Please try again."))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::MockApi;

    fn selected(mime_type: &str, size: u64) -> SelectedFile {
        SelectedFile {
            path: PathBuf::from("photo.png"),
            file_name: "photo.png".to_string(),
            mime_type: mime_type.to_string(),
            size,
        }
    }

    #[test]
    fn test_validate_file() {
        assert!(validate_file("image/png", 1024).is_ok());
        assert!(validate_file("image/jpeg", MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(
            validate_file("image/png", MAX_UPLOAD_BYTES + 1),
            Err(ValidationError::TooLarge)
        );
        assert_eq!(
            validate_file("application/pdf", 10),
            Err(ValidationError::NotAnImage)
        );
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_locally() {
        let api = MockApi::new();
        let mut upload = UploadForm::new();

        let err = upload
            .select_file(selected("image/png", 6 * 1024 * 1024))
            .unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 5MB");
        assert_eq!(upload.error(), Some("File size must be less than 5MB"));
        assert!(upload.file().is_none());

        upload.edit(FormField::Title("Big".into()));
        assert!(upload.submit(&api).await.is_err());
        assert!(api.create_calls().is_empty());
    }

    #[test]
    fn test_non_image_rejected() {
        let mut upload = UploadForm::new();
        let err = upload.select_file(selected("text/plain", 10)).unwrap_err();
        assert_eq!(err.to_string(), "Please select an image file");
    }

    #[tokio::test]
    async fn test_missing_title_rejected() {
        let api = MockApi::new();
        let mut upload = UploadForm::new();
        upload.select_file(selected("image/png", 10)).unwrap();
        upload.edit(FormField::Title("  ".into()));

        let err = upload.submit(&api).await.unwrap_err();
        assert!(matches!(err, UploadError::Invalid(ValidationError::MissingTitle)));
        assert!(api.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_file() {
        let api = MockApi::new();
        let mut upload = UploadForm::new();
        upload.edit(FormField::Title("Nothing".into()));

        let err = upload.submit(&api).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select an image file");
    }

    #[tokio::test]
    async fn test_submit_sends_file_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.png");
        std::fs::write(&path, vec![7u8; 256]).unwrap();

        let api = MockApi::new();
        let mut upload = UploadForm::new();
        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 256);
        upload.select_file(file).unwrap();
        upload.edit(FormField::Title(" Harbor ".into()));
        upload.edit(FormField::Tags("boats, sea".into()));

        let created = upload.submit(&api).await.unwrap();
        assert_eq!(created.summary.title, "Harbor");
        assert_eq!(created.summary.tags, vec!["boats", "sea"]);

        let calls = api.create_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.bytes.len(), 256);
        assert_eq!(calls[0].1.description, None);

        assert!(upload.file().is_none());
        assert_eq!(upload.form(), &ImageForm::default());
    }

    #[tokio::test]
    async fn test_hints_for_blank_category_and_tags() {
        let api = MockApi::new().with_categories(&["nature", "city"]);
        let mut upload = UploadForm::new();
        assert!(upload.hints().is_empty());

        upload.load_suggestions(&api).await;
        assert_eq!(
            upload.hints(),
            vec!["Categories: nature, city", "Popular tags: sky, sea"]
        );

        upload.edit(FormField::Category("city".into()));
        upload.edit(FormField::Tags("fog".into()));
        assert!(upload.hints().is_empty());
    }

    #[test]
    fn test_popular_tags_are_capped() {
        let mut upload = UploadForm::new();
        upload.suggestions.tags = (0..8).map(|i| format!("t{}", i)).collect();
        upload.edit(FormField::Category("any".into()));

        assert_eq!(upload.hints(), vec!["Popular tags: t0, t1, t2, t3, t4"]);
    }

    #[tokio::test]
    async fn test_server_rejection_surfaces_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let api = MockApi::new();
        api.reject_mutations("Unsupported image format");
        let mut upload = UploadForm::new();
        upload.select_file(SelectedFile::from_path(&path).unwrap()).unwrap();
        upload.edit(FormField::Title("A".into()));

        let err = upload.submit(&api).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported image format");
        assert!(upload.file().is_some());
    }
}
