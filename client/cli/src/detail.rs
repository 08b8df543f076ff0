//! Detail page workflow: load one image, edit it, delete it

use crate::api::{ApiError, GalleryApi, ImageDetail};
use crate::form::{FormField, ImageForm, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Failed(String),
    #[error("Image not loaded")]
    NotLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStatus {
    Idle,
    Loading,
    Saving,
    Deleting,
}

pub struct DetailView<A> {
    api: A,
    id: String,
    image: Option<ImageDetail>,
    form: ImageForm,
    editing: bool,
    status: DetailStatus,
    error: Option<String>,
}

impl<A: GalleryApi> DetailView<A> {
    pub fn new(api: A, id: &str) -> Self {
        Self {
            api,
            id: id.to_string(),
            image: None,
            form: ImageForm::default(),
            editing: false,
            status: DetailStatus::Idle,
            error: None,
        }
    }

    pub fn image(&self) -> Option<&ImageDetail> {
        self.image.as_ref()
    }

    pub fn form(&self) -> &ImageForm {
        &self.form
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn status(&self) -> DetailStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the record and reseed the edit form from it.
    pub async fn load(&mut self) -> Result<&ImageDetail, DetailError> {
        self.status = DetailStatus::Loading;
        let result = self.api.detail(&self.id).await;
        self.status = DetailStatus::Idle;

        let detail = result.map_err(|e| self.fail(e, "Failed to fetch image"))?;
        self.error = None;
        Ok(self.replace(detail))
    }

    pub fn start_edit(&mut self) {
        self.editing = true;
    }

    /// Leave edit mode and throw away unsaved changes.
    pub fn cancel_edit(&mut self) {
        self.editing = false;
        if let Some(image) = &self.image {
            self.form = ImageForm::from_detail(image);
        }
    }

    pub fn edit(&mut self, field: FormField) {
        self.form.apply(field);
    }

    /// Send the form. The server's echoed record replaces local state.
    pub async fn save(&mut self) -> Result<&ImageDetail, DetailError> {
        if self.image.is_none() {
            return Err(DetailError::NotLoaded);
        }
        self.form.validate()?;

        self.status = DetailStatus::Saving;
        let result = self.api.update(&self.id, &self.form.to_fields()).await;
        self.status = DetailStatus::Idle;

        let detail = result.map_err(|e| self.fail(e, "Update failed"))?;
        tracing::info!(id = %self.id, "image updated");
        self.error = None;
        self.editing = false;
        Ok(self.replace(detail))
    }

    pub async fn delete(&mut self) -> Result<(), DetailError> {
        self.status = DetailStatus::Deleting;
        let result = self.api.remove(&self.id).await;
        self.status = DetailStatus::Idle;

        result.map_err(|e| self.fail(e, "Delete failed"))?;
        tracing::info!(id = %self.id, "image deleted");
        self.image = None;
        self.editing = false;
        Ok(())
    }

    fn replace(&mut self, detail: ImageDetail) -> &ImageDetail {
        self.form = ImageForm::from_detail(&detail);
        self.image.insert(detail)
    }

    fn fail(&mut self, err: ApiError, fallback: &str) -> DetailError {
        tracing::warn!(id = %self.id, "{}: {}", fallback, err);
        let message = err.user_message(fallback);
        self.error = Some(message.clone());
        DetailError::Failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::{detail, MockApi};

    fn seeded() -> MockApi {
        let mut image = detail("5");
        image.summary.tags = vec!["sky".into(), "sea".into()];
        MockApi::new().with_image(image)
    }

    #[tokio::test]
    async fn test_load_seeds_form() {
        let mut view = DetailView::new(seeded(), "5");
        view.load().await.unwrap();

        assert_eq!(view.form().tags, "sky, sea");
        assert_eq!(view.form().title, "Image 5");
        assert_eq!(view.status(), DetailStatus::Idle);
    }

    #[tokio::test]
    async fn test_missing_image() {
        let mut view = DetailView::new(MockApi::new(), "nope");
        let err = view.load().await.unwrap_err();

        assert_eq!(err.to_string(), "Image not found");
        assert_eq!(view.error(), Some("Image not found"));
        assert!(view.image().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_state_with_server_echo() {
        let mut view = DetailView::new(seeded(), "5");
        view.load().await.unwrap();
        view.start_edit();
        view.edit(FormField::Title("  Coast  ".into()));
        view.edit(FormField::Tags("sky ,  waves,".into()));
        view.edit(FormField::Featured(true));

        let saved = view.save().await.unwrap();
        assert_eq!(saved.summary.title, "Coast");
        assert_eq!(saved.summary.tags, vec!["sky", "waves"]);
        assert!(saved.summary.featured);

        // Form now reflects the server's normalization.
        assert_eq!(view.form().tags, "sky, waves");
        assert!(!view.is_editing());
    }

    #[tokio::test]
    async fn test_blank_title_never_reaches_server() {
        let mut view = DetailView::new(seeded(), "5");
        view.load().await.unwrap();
        view.edit(FormField::Title("   ".into()));

        let err = view.save().await.unwrap_err();
        assert!(matches!(err, DetailError::Invalid(ValidationError::MissingTitle)));
        assert!(view.api.update_calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_save_keeps_previous_record() {
        let api = seeded();
        api.reject_mutations("Title already taken");
        let mut view = DetailView::new(api, "5");
        view.load().await.unwrap();
        view.edit(FormField::Title("Other".into()));

        let err = view.save().await.unwrap_err();
        assert_eq!(err.to_string(), "Title already taken");
        assert_eq!(view.image().unwrap().summary.title, "Image 5");
        assert_eq!(view.form().title, "Other");
    }

    #[tokio::test]
    async fn test_cancel_edit_restores_form() {
        let mut view = DetailView::new(seeded(), "5");
        view.load().await.unwrap();
        view.start_edit();
        view.edit(FormField::Category("draft".into()));
        view.cancel_edit();

        assert_eq!(view.form().category, "");
        assert!(!view.is_editing());
    }

    #[tokio::test]
    async fn test_delete() {
        let mut view = DetailView::new(seeded(), "5");
        view.load().await.unwrap();
        view.delete().await.unwrap();

        assert!(view.image().is_none());
        assert!(!view.api.contains("5"));
    }
}
