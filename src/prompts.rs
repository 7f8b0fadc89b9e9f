use crate::models::CraftInput;

/// Instruction template for story generation. Requests a two-part response:
/// a "STORY:" narrative followed by a "JSON:" block with the exact key set
/// of [`crate::models::StoryFields`].
pub fn story_prompt(input: &CraftInput) -> String {
    format!(
        r#"You are an expert in traditional crafts, cultural heritage, and artisan history.

Generate a rich, culturally-significant story about the craft: "{craft_name}"
Category: {category}
Region: {region}

The story should be exactly 2 paragraphs long and include:
- Historical origins and timeline
- Artisan background and traditional practices
- Cultural significance in the region
- Symbolism and meaning behind the craft
- Traditional usage and purpose
- What makes this craft unique

After the story, provide a structured JSON object with the following fields:
- title: A compelling title for the story
- historical_origin: Brief history (2-3 sentences)
- artisan_background: Who traditionally makes this craft (2-3 sentences)
- cultural_significance: Why it matters culturally (2-3 sentences)
- symbolism: Symbolic meanings and representations (2-3 sentences)
- traditional_usage: How it was/is traditionally used (2-3 sentences)
- why_unique: What makes it special and unique (2-3 sentences)

Format your response as:
STORY:
[2 paragraph story here]

JSON:
{{
  "title": "...",
  "historical_origin": "...",
  "artisan_background": "...",
  "cultural_significance": "...",
  "symbolism": "...",
  "traditional_usage": "...",
  "why_unique": "..."
}}"#,
        craft_name = input.craft_name,
        category = input.category,
        region = input.region,
    )
}

/// Instruction template for lesson generation. Requests a single JSON
/// object shaped like [`crate::models::Lesson`]: 6 top-level fields, a quiz
/// of exactly 3 questions with 4 options each.
pub fn lesson_prompt(input: &CraftInput) -> String {
    format!(
        r#"You are an expert craft instructor creating a beginner lesson plan.

Create a structured lesson for learning the craft: "{craft_name}"
Category: {category}
Region: {region}

Respond with ONLY a JSON object (no extra text, no markdown) containing:
- lesson_title: An engaging title for the lesson
- introduction: 2-3 sentence overview of what the student will learn
- materials_required: A list of materials and tools needed
- steps: A list of 6-10 clear, ordered instructions
- quiz: Exactly 3 multiple-choice questions. Each question must have:
  - question: The question text
  - options: Exactly 4 options, each prefixed "A)", "B)", "C)", "D)"
  - answer: The letter of the correct option
- summary: 2-3 sentences recapping the lesson and its cultural value

JSON:
{{
  "lesson_title": "...",
  "introduction": "...",
  "materials_required": ["..."],
  "steps": ["..."],
  "quiz": [
    {{
      "question": "...",
      "options": ["A) ...", "B) ...", "C) ...", "D) ..."],
      "answer": "A"
    }}
  ],
  "summary": "..."
}}"#,
        craft_name = input.craft_name,
        category = input.category,
        region = input.region,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CraftInput {
        CraftInput {
            craft_name: "Madhubani Painting".into(),
            category: "painting".into(),
            region: "Bihar, India".into(),
        }
    }

    #[test]
    fn story_prompt_substitutes_fields_verbatim() {
        let prompt = story_prompt(&input());
        assert!(prompt.contains("\"Madhubani Painting\""));
        assert!(prompt.contains("Category: painting"));
        assert!(prompt.contains("Region: Bihar, India"));
        assert!(prompt.contains("STORY:"));
        assert!(prompt.contains("JSON:"));
    }

    #[test]
    fn lesson_prompt_names_every_required_key() {
        let prompt = lesson_prompt(&input());
        for key in [
            "lesson_title",
            "introduction",
            "materials_required",
            "steps",
            "quiz",
            "summary",
        ] {
            assert!(prompt.contains(key), "missing key {key}");
        }
        assert!(prompt.contains("Exactly 3 multiple-choice"));
        assert!(prompt.contains("Exactly 4 options"));
    }
}
