use super::record;
use crate::ai::{encode_file, BinaryPayload, ImageEditService};
use crate::models::{EditRequest, EditTool};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

pub struct EditorPage {
    service: Arc<dyn ImageEditService>,
    original: Option<BinaryPayload>,
    edited_image: Option<String>,
    error: Option<String>,
}

impl EditorPage {
    pub fn new(service: Arc<dyn ImageEditService>) -> Self {
        Self {
            service,
            original: None,
            edited_image: None,
            error: None,
        }
    }

    /// Replace the working image, discarding any previous edit.
    pub fn load_image(&mut self, image: BinaryPayload) {
        self.original = Some(image);
        self.edited_image = None;
        self.error = None;
    }

    pub async fn upload(&mut self, path: &Path) -> Result<()> {
        let encoded = encode_file(path).await;
        let image = record(&mut self.error, encoded)?;
        self.load_image(image);
        Ok(())
    }

    /// Run one quick tool or free-text edit against the working image.
    pub async fn apply(&mut self, tool: &EditTool) -> Result<String> {
        let Some(image) = self.original.as_ref() else {
            return record(
                &mut self.error,
                Err(Error::Validation("Please upload an image first.".to_string())),
            );
        };

        self.error = None;
        self.edited_image = None;

        let instruction = match tool.instruction() {
            Ok(instruction) => instruction,
            Err(e) => return record(&mut self.error, Err(e)),
        };

        tracing::info!("Applying {} edit", tool.id());
        let request = EditRequest::new(image.clone(), instruction);
        let result = self.service.edit_image(&request).await;
        let edited = record(&mut self.error, result)?;
        self.edited_image = Some(edited.clone());
        Ok(edited)
    }

    pub fn reset(&mut self) {
        self.original = None;
        self.edited_image = None;
        self.error = None;
    }

    pub fn original(&self) -> Option<&BinaryPayload> {
        self.original.as_ref()
    }

    pub fn edited_image(&self) -> Option<&str> {
        self.edited_image.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockEditClient;

    fn image() -> BinaryPayload {
        BinaryPayload::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "image/png")
    }

    #[tokio::test]
    async fn test_apply_maps_tool_to_instruction() {
        let client = MockEditClient::new().with_response("data:image/png;base64,AAAA".to_string());
        let mut page = EditorPage::new(Arc::new(client.clone()));
        page.load_image(image());

        let edited = page
            .apply(&EditTool::StyleFilter("watercolor painting".to_string()))
            .await
            .unwrap();

        assert_eq!(edited, "data:image/png;base64,AAAA");
        assert_eq!(page.edited_image(), Some("data:image/png;base64,AAAA"));
        assert_eq!(
            client.instructions(),
            vec!["Apply a watercolor painting style to this image."]
        );
    }

    #[tokio::test]
    async fn test_blank_object_is_rejected_before_calling_service() {
        let client = MockEditClient::new();
        let mut page = EditorPage::new(Arc::new(client.clone()));
        page.load_image(image());

        let err = page
            .apply(&EditTool::RemoveObject(" ".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            page.error(),
            Some("Please describe the object you want to remove.")
        );
        assert_eq!(client.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_in_response_leaves_no_result() {
        let client = MockEditClient::new().with_missing_image();
        let mut page = EditorPage::new(Arc::new(client));
        page.load_image(image());

        let err = page.apply(&EditTool::RemoveBackground).await.unwrap_err();
        assert!(matches!(err, Error::NoImageInResponse));
        assert!(page.edited_image().is_none());
        assert_eq!(page.error(), Some("No image data found in the AI response."));
    }

    #[tokio::test]
    async fn test_apply_without_image_fails() {
        let mut page = EditorPage::new(Arc::new(MockEditClient::new()));
        let err = page.apply(&EditTool::ColorCorrect).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_loading_new_image_clears_previous_edit() {
        let mut page = EditorPage::new(Arc::new(MockEditClient::new()));
        page.load_image(image());
        page.apply(&EditTool::ColorCorrect).await.unwrap();
        assert!(page.edited_image().is_some());

        page.load_image(image());
        assert!(page.edited_image().is_none());

        page.reset();
        assert!(page.original().is_none());
    }

    #[tokio::test]
    async fn test_upload_unreadable_file_records_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = EditorPage::new(Arc::new(MockEditClient::new()));

        let err = page.upload(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(page.error().is_some());
        assert!(page.original().is_none());
    }
}
