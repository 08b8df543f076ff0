//! Typed form state shared by the edit and upload workflows

use crate::api::{ImageDetail, ImageFields};

/// Advisory checks run before any request is sent. The server validates again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select an image file")]
    MissingFile,
    #[error("Please select an image file")]
    NotAnImage,
    #[error("File size must be less than 5MB")]
    TooLarge,
    #[error("Title is required")]
    MissingTitle,
}

/// One edit to one field of an [`ImageForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Title(String),
    Description(String),
    Category(String),
    /// Comma-separated tag list.
    Tags(String),
    Featured(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub featured: bool,
}

impl ImageForm {
    /// Seed from a fetched record; tags are joined back into one string.
    pub fn from_detail(detail: &ImageDetail) -> Self {
        let summary = &detail.summary;
        Self {
            title: summary.title.clone(),
            description: summary.description.clone().unwrap_or_default(),
            category: summary.category.clone().unwrap_or_default(),
            tags: summary.tags.join(", "),
            featured: summary.featured,
        }
    }

    pub fn apply(&mut self, field: FormField) {
        match field {
            FormField::Title(v) => self.title = v,
            FormField::Description(v) => self.description = v,
            FormField::Category(v) => self.category = v,
            FormField::Tags(v) => self.tags = v,
            FormField::Featured(v) => self.featured = v,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }

    pub fn to_fields(&self) -> ImageFields {
        ImageFields::new(
            &self.title,
            &self.description,
            &self.category,
            &self.tags,
            self.featured,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::detail;

    #[test]
    fn test_seed_from_detail() {
        let mut image = detail("1");
        image.summary.tags = vec!["sky".into(), "sea".into(), "sky".into()];
        image.summary.category = Some("travel".into());

        let form = ImageForm::from_detail(&image);
        assert_eq!(form.title, "Image 1");
        assert_eq!(form.description, "");
        assert_eq!(form.category, "travel");
        assert_eq!(form.tags, "sky, sea, sky");
        assert!(!form.featured);
    }

    #[test]
    fn test_apply_updates_single_field() {
        let mut form = ImageForm::default();
        form.apply(FormField::Title("Harbor".into()));
        form.apply(FormField::Featured(true));

        assert_eq!(form.title, "Harbor");
        assert!(form.featured);
        assert_eq!(form.description, "");
    }

    #[test]
    fn test_blank_title_rejected() {
        let form = ImageForm {
            title: "   ".into(),
            ..ImageForm::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingTitle));
        assert_eq!(ValidationError::MissingTitle.to_string(), "Title is required");
    }

    #[test]
    fn test_to_fields_omits_empty_optionals() {
        let form = ImageForm {
            title: " Dunes ".into(),
            description: "".into(),
            category: "desert".into(),
            tags: "  ".into(),
            featured: false,
        };
        let fields = form.to_fields();
        assert_eq!(fields.title, "Dunes");
        assert_eq!(fields.description, None);
        assert_eq!(fields.category.as_deref(), Some("desert"));
        assert_eq!(fields.tags, None);
    }
}
