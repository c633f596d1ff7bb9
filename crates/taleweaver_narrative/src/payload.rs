//! Shapes the model is asked to produce.
//!
//! Every field is optional on the way in; models routinely omit some.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DescriptionPayload {
    pub story_premise: String,
    pub next_question: String,
    pub premise_options: Vec<String>,
}

/// A suggested next action; models return either objects or bare strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChoicePayload {
    Detailed { choice: String },
    Plain(String),
}

impl ChoicePayload {
    pub fn into_text(self) -> String {
        match self {
            ChoicePayload::Detailed { choice } => choice,
            ChoicePayload::Plain(choice) => choice,
        }
    }
}

pub(crate) fn choice_texts(choices: Vec<ChoicePayload>) -> Vec<String> {
    choices.into_iter().map(ChoicePayload::into_text).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct BeginPayload {
    pub story_parts: Vec<String>,
    pub primary_objective: String,
    pub milestones: Vec<String>,
    pub choices: Vec<ChoicePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ContinuePayload {
    pub story_parts: Vec<String>,
    pub choices: Vec<ChoicePayload>,
    pub rating: Option<String>,
    pub achieved_current_milestone: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum EndingPayload {
    Parts(Vec<String>),
    Wrapped {
        #[serde(rename = "storyParts")]
        story_parts: Vec<String>,
    },
}

impl EndingPayload {
    pub fn into_parts(self) -> Vec<String> {
        match self {
            EndingPayload::Parts(parts) => parts,
            EndingPayload::Wrapped { story_parts } => story_parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_json;

    #[test]
    fn test_choices_accept_objects_and_strings() {
        let payload: BeginPayload = parse_json(
            r#"{"choices": [{"choice": "Run", "rating": "BAD"}, "Hide"], "milestones": ["m1"]}"#,
        )
        .unwrap();
        assert_eq!(choice_texts(payload.choices), vec!["Run", "Hide"]);
        assert_eq!(payload.primary_objective, "");
    }

    #[test]
    fn test_ending_accepts_array_or_object() {
        let bare: EndingPayload = parse_json(r#"["one", "two", "three"]"#).unwrap();
        assert_eq!(bare.into_parts().len(), 3);
        let wrapped: EndingPayload = parse_json(r#"{"storyParts": ["one"]}"#).unwrap();
        assert_eq!(wrapped.into_parts(), vec!["one"]);
    }
}
