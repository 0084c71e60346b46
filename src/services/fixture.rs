use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NewAnnotation;

use super::AnnotationSource;

/// Fixed annotations, for tests and reproducible demos.
pub struct FixtureSource {
    annotations: Vec<NewAnnotation>,
}

impl FixtureSource {
    pub fn new(annotations: Vec<NewAnnotation>) -> Self {
        Self { annotations }
    }

    /// Load a JSON array of annotations.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl AnnotationSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch(&self) -> Vec<NewAnnotation> {
        self.annotations.clone()
    }
}
