//! Best-effort extraction of structured documents from raw model output.
//!
//! The upstream generator is an uncontrolled text model; the layout asked
//! for in the prompt is a convention, not a guarantee. Each parse is a
//! single pass: extract the candidate JSON, clean it, deserialize,
//! validate, and on any failure substitute a fixed schema-complete
//! fallback document. Malformed model output never reaches the caller.

use crate::models::{Lesson, QuizItem, StoryFields};

/// Marker separating the narrative from the structured block in a story
/// response.
const JSON_MARKER: &str = "JSON:";
const STORY_LABEL: &str = "STORY:";

/// Split a story response into (narrative text, parsed-or-fallback fields).
///
/// Narrative extraction is best effort: text before the "JSON:" marker, or
/// before the first brace block when the marker is absent. No fallback is
/// substituted for the narrative; if none is found it is empty.
pub fn parse_story_response(raw: &str) -> (String, StoryFields) {
    let (story_text, json_text) = match raw.split_once(JSON_MARKER) {
        Some((before, after)) => (clean_narrative(before), after.trim().to_string()),
        None => match extract_json_block(raw) {
            Some(block) => {
                let start = raw.find('{').unwrap_or(raw.len());
                (clean_narrative(&raw[..start]), block.to_string())
            }
            None => (clean_narrative(raw), "{}".to_string()),
        },
    };

    let fields = serde_json::from_str::<StoryFields>(&strip_code_fences(&json_text))
        .unwrap_or_else(|e| {
            tracing::warn!("story JSON rejected, using fallback: {}", e);
            fallback_story_fields()
        });

    (story_text, fields)
}

/// Parse a lesson response into a validated [`Lesson`], substituting the
/// fixed fallback lesson on any parse or validation failure.
pub fn parse_lesson_response(raw: &str) -> Lesson {
    match try_parse_lesson(raw) {
        Ok(lesson) => lesson,
        Err(reason) => {
            tracing::warn!("lesson JSON rejected, using fallback: {}", reason);
            fallback_lesson()
        }
    }
}

fn try_parse_lesson(raw: &str) -> Result<Lesson, String> {
    let cleaned = strip_code_fences(raw);
    let candidate = extract_json_block(&cleaned).unwrap_or(&cleaned);

    let lesson: Lesson = serde_json::from_str(candidate).map_err(|e| e.to_string())?;

    if lesson.quiz.len() != 3 {
        return Err(format!(
            "quiz must have exactly 3 questions, got {}",
            lesson.quiz.len()
        ));
    }
    for (i, question) in lesson.quiz.iter().enumerate() {
        if question.options.len() != 4 {
            return Err(format!(
                "quiz question {} must have 4 options, got {}",
                i + 1,
                question.options.len()
            ));
        }
    }

    Ok(lesson)
}

fn clean_narrative(segment: &str) -> String {
    segment.replace(STORY_LABEL, "").trim().to_string()
}

/// Remove markdown code-fence markers: every "```json" opener and one
/// trailing "```".
fn strip_code_fences(text: &str) -> String {
    let cleaned = text.replace("```json", "");
    let cleaned = cleaned.trim();
    cleaned
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(cleaned)
        .to_string()
}

/// Greedy brace block: first `{` through last `}`.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

/// Placeholder story fields used when the model's JSON cannot be parsed.
pub fn fallback_story_fields() -> StoryFields {
    StoryFields {
        title: "Traditional Craft Story".into(),
        historical_origin: "Ancient craft with rich heritage.".into(),
        artisan_background: "Skilled artisans pass down techniques through generations.".into(),
        cultural_significance: "Important part of cultural identity.".into(),
        symbolism: "Represents tradition and craftsmanship.".into(),
        traditional_usage: "Used in daily life and ceremonies.".into(),
        why_unique: "Unique techniques and cultural context.".into(),
    }
}

/// Placeholder lesson used when the model's JSON fails parsing or
/// validation. Schema-complete: 5 materials, 8 steps, 3 quiz items with 4
/// options each.
pub fn fallback_lesson() -> Lesson {
    Lesson {
        lesson_title: "Introduction to Traditional Craft".into(),
        introduction: "This lesson will teach you the fundamentals of traditional \
                       craft-making, including materials, techniques, and cultural \
                       significance."
            .into(),
        materials_required: vec![
            "Primary material".into(),
            "Tools".into(),
            "Workspace".into(),
            "Safety equipment".into(),
            "Finishing materials".into(),
        ],
        steps: vec![
            "Step 1: Prepare your workspace and gather materials".into(),
            "Step 2: Prepare the primary material".into(),
            "Step 3: Begin the basic technique".into(),
            "Step 4: Continue building the craft".into(),
            "Step 5: Add details and refinements".into(),
            "Step 6: Apply finishing touches".into(),
            "Step 7: Allow to dry/set".into(),
            "Step 8: Final inspection and corrections".into(),
        ],
        quiz: vec![
            QuizItem {
                question: "What is the first step in the craft-making process?".into(),
                options: vec![
                    "A) Prepare workspace and materials".into(),
                    "B) Start crafting immediately".into(),
                    "C) Apply finishing touches".into(),
                    "D) Skip preparation".into(),
                ],
                answer: "A".into(),
            },
            QuizItem {
                question: "Why is traditional craft important?".into(),
                options: vec![
                    "A) It's just a hobby".into(),
                    "B) Cultural heritage and identity".into(),
                    "C) No particular reason".into(),
                    "D) Only for decoration".into(),
                ],
                answer: "B".into(),
            },
            QuizItem {
                question: "What should you do after completing the craft?".into(),
                options: vec![
                    "A) Throw it away".into(),
                    "B) Ignore it".into(),
                    "C) Inspect and make corrections".into(),
                    "D) Start a new one immediately".into(),
                ],
                answer: "C".into(),
            },
        ],
        summary: "You have learned the basic techniques and cultural significance of this \
                  traditional craft. Practice these skills to preserve this important \
                  cultural heritage."
            .into(),
    }
}
