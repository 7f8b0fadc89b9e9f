use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Inbound body for story/lesson generation. Fields are optional at the
/// deserialization boundary so handlers can enumerate the missing ones in
/// the 400 response instead of failing on the first absent key.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GenerateRequest {
    #[serde(default)]
    pub craft_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl GenerateRequest {
    /// Names of required fields that are absent or blank, in schema order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.craft_name) {
            missing.push("craft_name");
        }
        if blank(&self.category) {
            missing.push("category");
        }
        if blank(&self.region) {
            missing.push("region");
        }
        missing
    }

    /// Validate into a [`CraftInput`], or report the missing field names.
    pub fn validate(self) -> Result<CraftInput, Vec<&'static str>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }
        match (self.craft_name, self.category, self.region) {
            (Some(craft_name), Some(category), Some(region)) => Ok(CraftInput {
                craft_name,
                category,
                region,
            }),
            _ => unreachable!("missing_fields covers absent values"),
        }
    }
}

/// Validated generation input, produced once missing-field checks pass.
#[derive(Debug, Clone)]
pub struct CraftInput {
    pub craft_name: String,
    pub category: String,
    pub region: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Meta {
    pub generated_by: String,
    pub generated_at: String,
}

impl Meta {
    /// Stamp with the current UTC time, ISO-8601 with trailing "Z".
    pub fn now(model: &str) -> Self {
        Self {
            generated_by: model.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// The structured portion of a generated story.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryFields {
    pub title: String,
    pub historical_origin: String,
    pub artisan_background: String,
    pub cultural_significance: String,
    pub symbolism: String,
    pub traditional_usage: String,
    pub why_unique: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryDocument {
    pub craft_name: String,
    pub region: String,
    pub category: String,
    pub story: StoryFields,
    pub meta: Meta,
}

/// Hybrid response carrying both the narrative text and the structured JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryResult {
    pub text: String,
    pub json: StoryDocument,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// Lesson document as produced by the model (before enrichment).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Lesson {
    pub lesson_title: String,
    pub introduction: String,
    pub materials_required: Vec<String>,
    pub steps: Vec<String>,
    pub quiz: Vec<QuizItem>,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LessonResult {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub craft_name: String,
    pub category: String,
    pub region: String,
    pub meta: Meta,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassificationResult {
    pub craft_type: String,
    pub materials_detected: Vec<String>,
    pub possible_region: String,
    pub confidence: f64,
    pub meta: Meta,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_reports_absent_and_blank_in_schema_order() {
        let request = GenerateRequest {
            craft_name: Some("Pottery".into()),
            category: Some("   ".into()),
            region: None,
        };
        assert_eq!(request.missing_fields(), vec!["category", "region"]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn complete_request_validates() {
        let request = GenerateRequest {
            craft_name: Some("Pottery".into()),
            category: Some("pottery".into()),
            region: Some("India".into()),
        };
        let input = request.validate().unwrap();
        assert_eq!(input.craft_name, "Pottery");
    }

    #[test]
    fn meta_timestamp_is_utc_with_z_suffix() {
        let meta = Meta::now("gemini-2.5-flash");
        assert_eq!(meta.generated_by, "gemini-2.5-flash");
        assert!(meta.generated_at.ends_with('Z'));
        assert!(meta.generated_at.contains('T'));
    }
}
