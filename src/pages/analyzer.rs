use super::record;
use crate::ai::{encode_file, BinaryPayload, ImageAnalysisService};
use crate::models::{AnalysisDepth, AnalysisRequest};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

pub struct AnalyzerPage {
    service: Arc<dyn ImageAnalysisService>,
    image: Option<BinaryPayload>,
    analysis: Option<String>,
    error: Option<String>,
}

impl AnalyzerPage {
    pub fn new(service: Arc<dyn ImageAnalysisService>) -> Self {
        Self {
            service,
            image: None,
            analysis: None,
            error: None,
        }
    }

    pub fn load_image(&mut self, image: BinaryPayload) {
        self.image = Some(image);
        self.analysis = None;
        self.error = None;
    }

    pub async fn upload(&mut self, path: &Path) -> Result<()> {
        let encoded = encode_file(path).await;
        let image = record(&mut self.error, encoded)?;
        self.load_image(image);
        Ok(())
    }

    pub async fn analyze(&mut self, depth: AnalysisDepth) -> Result<String> {
        let Some(image) = self.image.as_ref() else {
            return record(
                &mut self.error,
                Err(Error::Validation("Please upload an image first.".to_string())),
            );
        };

        self.error = None;
        self.analysis = None;

        tracing::info!("Running {:?} analysis", depth);
        let request = AnalysisRequest::new(image.clone(), depth);
        let result = self.service.analyze_image(&request).await;
        let text = record(&mut self.error, result)?;
        self.analysis = Some(text.clone());
        Ok(text)
    }

    pub fn reset(&mut self) {
        self.image = None;
        self.analysis = None;
        self.error = None;
    }

    pub fn image(&self) -> Option<&BinaryPayload> {
        self.image.as_ref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
