//! Craft image classification: a vision backend produces raw label
//! predictions, and static keyword tables map them into craft type,
//! detected materials, and a likely region of origin.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::models::{ClassificationResult, Meta};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Image file not found: {0}")]
    ImageNotFound(String),
    #[error("Failed to read image: {0}")]
    Io(String),
    #[error("Vision backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelPrediction {
    pub label: String,
    pub score: f64,
}

/// Source of label predictions for an image. The concrete model is an
/// external collaborator; handlers only see this trait.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn predict(&self, image: &[u8]) -> Result<Vec<LabelPrediction>, ClassifierError>;

    /// Identifier stamped into result metadata.
    fn model_id(&self) -> &str;
}

const CRAFT_KEYWORDS: &[(&str, &[&str])] = &[
    ("pottery", &["pot", "vase", "jar", "pottery", "ceramic", "clay"]),
    ("textile", &["fabric", "cloth", "textile", "weaving", "loom", "thread"]),
    ("woodwork", &["wood", "carving", "furniture", "wooden"]),
    ("metalwork", &["metal", "iron", "bronze", "brass", "copper"]),
    ("basketry", &["basket", "wicker", "weave"]),
    ("jewelry", &["necklace", "bracelet", "jewelry", "ornament"]),
    ("painting", &["painting", "canvas", "art"]),
    ("sculpture", &["sculpture", "statue", "carving"]),
];

const MATERIAL_KEYWORDS: &[(&str, &[&str])] = &[
    ("clay", &["pot", "pottery", "ceramic", "clay"]),
    ("wood", &["wood", "wooden", "timber"]),
    ("metal", &["metal", "iron", "bronze", "brass", "copper", "silver", "gold"]),
    ("fabric", &["fabric", "cloth", "textile", "cotton", "silk", "wool"]),
    ("natural_fiber", &["basket", "wicker", "bamboo", "reed", "straw"]),
];

const REGION_MAP: &[(&str, &str)] = &[
    ("pottery", "South Asia"),
    ("textile", "South Asia"),
    ("woodwork", "Southeast Asia"),
    ("metalwork", "Middle East"),
    ("basketry", "Southeast Asia"),
    ("jewelry", "South Asia"),
    ("painting", "East Asia"),
    ("sculpture", "South Asia"),
];

fn map_to_craft_type(predictions: &[LabelPrediction]) -> String {
    for prediction in predictions {
        let label = prediction.label.to_lowercase();
        for (craft_type, keywords) in CRAFT_KEYWORDS {
            if keywords.iter().any(|k| label.contains(k)) {
                return (*craft_type).to_string();
            }
        }
    }
    "traditional_craft".to_string()
}

fn detect_materials(predictions: &[LabelPrediction]) -> Vec<String> {
    let mut materials: Vec<String> = Vec::new();
    for prediction in predictions.iter().take(5) {
        let label = prediction.label.to_lowercase();
        for (material, keywords) in MATERIAL_KEYWORDS {
            if keywords.iter().any(|k| label.contains(k))
                && !materials.iter().any(|m| m == material)
            {
                materials.push((*material).to_string());
            }
        }
    }
    if materials.is_empty() {
        materials.push("traditional_materials".to_string());
    }
    materials
}

fn estimate_region(craft_type: &str) -> String {
    REGION_MAP
        .iter()
        .find(|(craft, _)| *craft == craft_type)
        .map(|(_, region)| (*region).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Classification service shared read-only across requests. Constructed
/// once at startup and injected through application state.
pub struct CraftClassifier {
    backend: Box<dyn VisionBackend>,
}

impl CraftClassifier {
    pub fn new(backend: Box<dyn VisionBackend>) -> Self {
        Self { backend }
    }

    /// Build from environment: a hosted inference endpoint when
    /// `VISION_API_URL` is set, demo predictions otherwise.
    pub fn from_env() -> Self {
        match std::env::var("VISION_API_URL") {
            Ok(url) => {
                info!("Using hosted vision backend at {}", url);
                Self::new(Box::new(HostedVisionBackend::new(url)))
            }
            Err(_) => {
                info!("VISION_API_URL not set - using demo vision backend");
                Self::new(Box::new(DemoVisionBackend))
            }
        }
    }

    pub async fn classify(&self, image_path: &str) -> Result<ClassificationResult, ClassifierError> {
        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClassifierError::ImageNotFound(image_path.to_string())
            } else {
                ClassifierError::Io(e.to_string())
            }
        })?;

        let predictions = self.backend.predict(&bytes).await?;
        if predictions.is_empty() {
            return Err(ClassifierError::Backend(
                "no predictions returned".to_string(),
            ));
        }

        let craft_type = map_to_craft_type(&predictions);
        let materials_detected = detect_materials(&predictions);
        let possible_region = estimate_region(&craft_type);
        let confidence = (predictions[0].score * 100.0).round() / 100.0;

        Ok(ClassificationResult {
            craft_type,
            materials_detected,
            possible_region,
            confidence,
            meta: Meta::now(self.backend.model_id()),
        })
    }
}

/// Remote inference endpoint accepting a base64 image and returning top-k
/// label predictions.
pub struct HostedVisionBackend {
    client: reqwest::Client,
    url: String,
}

impl HostedVisionBackend {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, url }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<LabelPrediction>,
}

#[async_trait]
impl VisionBackend for HostedVisionBackend {
    async fn predict(&self, image: &[u8]) -> Result<Vec<LabelPrediction>, ClassifierError> {
        let payload = json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
            "top_k": 5
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClassifierError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Backend(format!(
                "status={} body={}",
                status, body
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Backend(e.to_string()))?;
        Ok(parsed.predictions)
    }

    fn model_id(&self) -> &str {
        "resnet50"
    }
}

/// Fixed predictions for running without a vision endpoint configured.
pub struct DemoVisionBackend;

#[async_trait]
impl VisionBackend for DemoVisionBackend {
    async fn predict(&self, _image: &[u8]) -> Result<Vec<LabelPrediction>, ClassifierError> {
        Ok(vec![
            LabelPrediction { label: "clay pot".into(), score: 0.91 },
            LabelPrediction { label: "vase".into(), score: 0.05 },
            LabelPrediction { label: "ceramic ware".into(), score: 0.02 },
            LabelPrediction { label: "jar".into(), score: 0.01 },
            LabelPrediction { label: "terracotta".into(), score: 0.01 },
        ])
    }

    fn model_id(&self) -> &str {
        "demo-vision"
    }
}
