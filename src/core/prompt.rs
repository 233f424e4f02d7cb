//! 作文回饋與全班總評的 prompt 組裝
//!
//! 純函式，不做 I/O。

use crate::domain::model::Feedback;

/// 全班總評中每篇回饋保留的字元數
pub const CLASS_SUMMARY_CHAR_LIMIT: usize = 500;

const ELLIPSIS: &str = "...";
const FEEDBACK_SEPARATOR: &str = "\n\n---\n\n";

pub fn build_essay_prompt(essay_text: &str, rubric_text: &str, guidance_text: &str) -> String {
    format!(
        r#"You are an expert educator providing detailed feedback on student essays.

<essay>
{essay_text}
</essay>

<rubric>
{rubric_text}
</rubric>

<feedback_guidance>
{guidance_text}
</feedback_guidance>

Based on the essay, rubric, and feedback guidance provided above, generate comprehensive feedback for this student essay.
Follow the structure and tone guidelines specified in the feedback guidance.

Provide specific band levels, justifications, and actionable recommendations."#
    )
}

pub fn build_class_prompt(feedback_items: &[Feedback], rubric_text: &str) -> String {
    let feedback_summary = feedback_items
        .iter()
        .map(|item| format!("Essay: {}\n{}", item.name, truncate_feedback(&item.feedback)))
        .collect::<Vec<_>>()
        .join(FEEDBACK_SEPARATOR);

    format!(
        r#"You are an expert educator analyzing overall class performance on an essay assignment.

<rubric>
{rubric_text}
</rubric>

<individual_feedbacks>
{feedback_summary}
</individual_feedbacks>

Based on the rubric and the individual student feedbacks provided above, generate a comprehensive class-level analysis that includes:

1. **Overall Performance Summary**
   - Distribution of band levels across the class
   - General trends and patterns

2. **What Went Well**
   - Common strengths across multiple students
   - Successful application of concepts
   - Positive patterns observed

3. **Areas for Improvement**
   - Common weaknesses or gaps
   - Recurring issues across multiple essays
   - Misconceptions that need addressing

4. **Recommendations for Next Steps**
   - Specific teaching strategies to address common issues
   - Topics that need re-teaching or reinforcement
   - Suggested activities or exercises for the whole class
   - Differentiation strategies for different performance levels

5. **Positive Observations**
   - Growth areas
   - Promising developments
   - Student engagement indicators

Format the response in clear Markdown with appropriate headings and bullet points."#
    )
}

/// 以字元數截斷（非字詞邊界），超過上限才加上省略號
pub fn truncate_feedback(text: &str) -> String {
    if text.chars().count() > CLASS_SUMMARY_CHAR_LIMIT {
        text.chars().take(CLASS_SUMMARY_CHAR_LIMIT).collect::<String>() + ELLIPSIS
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(name: &str, text: &str) -> Feedback {
        Feedback {
            name: name.to_string(),
            feedback: text.to_string(),
        }
    }

    #[test]
    fn test_essay_prompt_embeds_inputs_verbatim() {
        let prompt = build_essay_prompt("good essay", "Band 1-5 rubric", "be concise");

        assert!(prompt.contains("<essay>\ngood essay\n</essay>"));
        assert!(prompt.contains("<rubric>\nBand 1-5 rubric\n</rubric>"));
        assert!(prompt.contains("<feedback_guidance>\nbe concise\n</feedback_guidance>"));
        assert!(prompt.contains("band levels, justifications, and actionable recommendations"));
    }

    #[test]
    fn test_truncate_long_feedback() {
        let long = "a".repeat(750);
        let truncated = truncate_feedback(&long);

        assert_eq!(truncated, format!("{}...", "a".repeat(500)));
    }

    #[test]
    fn test_short_feedback_unmodified() {
        assert_eq!(truncate_feedback("short"), "short");

        let exact = "b".repeat(500);
        assert_eq!(truncate_feedback(&exact), exact);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(501);
        let truncated = truncate_feedback(&text);

        assert_eq!(truncated.chars().count(), 503);
        assert!(truncated.starts_with(&"é".repeat(500)));
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_class_prompt_joins_summaries() {
        let items = vec![feedback("A.txt", "feedback A"), feedback("B.txt", "feedback B")];
        let prompt = build_class_prompt(&items, "the rubric");

        assert!(prompt.contains(
            "<individual_feedbacks>\nEssay: A.txt\nfeedback A\n\n---\n\nEssay: B.txt\nfeedback B\n</individual_feedbacks>"
        ));
        assert!(prompt.contains("<rubric>\nthe rubric\n</rubric>"));
        for heading in [
            "Overall Performance Summary",
            "What Went Well",
            "Areas for Improvement",
            "Recommendations for Next Steps",
            "Positive Observations",
        ] {
            assert!(prompt.contains(heading), "missing section {heading}");
        }
    }

    #[test]
    fn test_class_prompt_truncates_each_item() {
        let items = vec![feedback("A.txt", &"x".repeat(600))];
        let prompt = build_class_prompt(&items, "r");

        assert!(prompt.contains(&format!("Essay: A.txt\n{}...\n", "x".repeat(500))));
        assert!(!prompt.contains(&"x".repeat(501)));
    }
}
