//! Prompt construction for the three stages.
//!
//! These are pure functions so the exact wording can be tested without a
//! provider. Source texts (topic, essay, feedback) are embedded verbatim.

/// The five feedback categories the reviewer is asked to cover.
pub const REVIEW_CATEGORIES: [&str; 5] = [
    "Content quality and relevance to the prompt",
    "Structure and organization",
    "Clarity and coherence",
    "Areas for improvement",
    "Specific suggestions for enhancement",
];

/// Builds the prompt for the generate stage.
#[must_use]
pub fn essay_prompt(topic: &str, language: Option<&str>) -> String {
    let mut prompt = format!(
        "Write a comprehensive essay on the following topic:\n\n{topic}\n\n\
         Please write a well-structured essay with an introduction, body paragraphs, \
         and a conclusion."
    );
    if let Some(language) = language {
        prompt.push_str(&format!("\n\nImportant: Please write the essay in {language}."));
    }
    prompt
}

/// Builds the prompt for the review stage.
#[must_use]
pub fn review_prompt(essay: &str, topic: &str, language: Option<&str>) -> String {
    let categories: String = REVIEW_CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, category)| format!("{}. {category}\n", i + 1))
        .collect();

    let mut prompt = format!(
        "You are an expert essay reviewer. Please review the following essay and provide \
         constructive feedback.\n\n\
         Original Prompt: {topic}\n\n\
         Essay to Review:\n\n{essay}\n\n\
         Please provide detailed feedback covering:\n{categories}\n\
         Format your feedback in a clear, actionable manner."
    );
    if let Some(language) = language {
        prompt.push_str(&format!(
            "\n\nNote: The essay is written in {language}. \
             Please provide your feedback in the same language."
        ));
    }
    prompt
}

/// Builds the prompt for the revise stage.
#[must_use]
pub fn revision_prompt(essay: &str, feedback: &str, topic: &str, language: Option<&str>) -> String {
    let mut prompt = format!(
        "You wrote the following essay based on this prompt:\n\n\
         Original Prompt: {topic}\n\n\
         Your Original Essay:\n\n{essay}\n\n\
         You received the following feedback:\n\n{feedback}\n\n\
         Please revise your essay incorporating the feedback. Maintain the core content \
         and structure while addressing the suggestions provided."
    );
    if let Some(language) = language {
        prompt.push_str(&format!(
            "\n\nImportant: Please write the revised essay in {language}."
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_essay_prompt_with_language() {
        let prompt = essay_prompt("Climate change", Some("Spanish"));
        assert!(prompt.contains("Climate change"));
        assert!(prompt.contains("introduction, body paragraphs, and a conclusion"));
        assert!(prompt.ends_with("\n\nImportant: Please write the essay in Spanish."));
    }

    #[test]
    fn test_essay_prompt_exact_text() {
        assert_eq!(
            essay_prompt("Tides", None),
            "Write a comprehensive essay on the following topic:\n\nTides\n\n\
             Please write a well-structured essay with an introduction, body paragraphs, \
             and a conclusion."
        );
    }

    #[test]
    fn test_review_prompt_lists_five_categories() {
        let prompt = review_prompt("The essay body.", "Climate change", None);

        assert!(prompt.contains("Original Prompt: Climate change"));
        assert!(prompt.contains("Essay to Review:\n\nThe essay body.\n\n"));
        for (i, category) in REVIEW_CATEGORIES.iter().enumerate() {
            assert!(prompt.contains(&format!("{}. {category}\n", i + 1)), "{category}");
        }
        assert!(!prompt.contains("6."));
        assert!(!prompt.contains("Note:"));
    }

    #[test]
    fn test_review_prompt_with_language() {
        let prompt = review_prompt("Ensayo.", "Clima", Some("Spanish"));
        assert!(prompt.ends_with(
            "Note: The essay is written in Spanish. Please provide your feedback in the same language."
        ));
    }

    #[test]
    fn test_revision_prompt_embeds_sources_verbatim() {
        let essay = "First line.\n\n  Indented {braces} and 100% symbols.";
        let feedback = "1. Tighten the intro\n2. Cite sources";
        let prompt = revision_prompt(essay, feedback, "Climate change", None);

        assert!(prompt.contains("Original Prompt: Climate change"));
        assert!(prompt.contains(essay));
        assert!(prompt.contains(feedback));
        let essay_at = prompt.find(essay).unwrap();
        let feedback_at = prompt.find(feedback).unwrap();
        assert!(essay_at < feedback_at);
    }

    #[test]
    fn test_revision_prompt_with_language() {
        let prompt = revision_prompt("e", "f", "t", Some("French"));
        assert!(prompt.ends_with("Important: Please write the revised essay in French."));
    }
}
