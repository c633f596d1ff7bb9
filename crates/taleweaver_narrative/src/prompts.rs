//! Prompt text sent to the text generator.

/// Every piece of prompt text the story flows send.
///
/// Swap the implementation to change tone, genre or output format without
/// touching flow logic. Only the ending and image prompts have defaults; the
/// rest are tied to the JSON shapes the flows parse.
pub trait StoryPrompts: Send + Sync {
    /// System message injected once at the start of a conversation.
    fn preamble(&self) -> String;

    /// Ask for a premise, a follow-up question and premise options.
    fn description(&self, user_input: &str) -> String;

    /// Ask for the opening, the objective, milestones and choices.
    fn begin_story(&self, user_input: &str) -> String;

    /// Ask for the next passage given the player's choice.
    fn continue_story(&self, user_input: &str, current_milestone: Option<&str>) -> String;

    /// Ask for a three-part conclusion.
    fn ending(&self) -> String {
        "The characters have achieved their primary objective. \
         Write the conclusion of the story. Don't repeat any of the story. \
         This next part should be a max of 200 words. \
         Split the story into 3 parts of similar length. \
         Return an array of strings with the story parts."
            .to_string()
    }

    /// Ask for a prose description of an illustration.
    fn image_description(&self, story: &str) -> String {
        format!(
            "Describe an image that captures the essence of this story: {}. \
             Do not use any words indicating violence or profanity. Return a string only. \
             Do not return JSON.",
            story
        )
    }

    /// Turn a scene description into an image model prompt.
    fn image_prompt(&self, description: &str) -> String {
        format!(
            "{}, storybook illustration, soft lighting, detailed, vibrant colors",
            description.trim()
        )
    }
}

/// The prompt set used unless another is supplied.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::{DefaultPrompts, StoryPrompts};
///
/// let prompts = DefaultPrompts;
/// let text = prompts.continue_story("Open the door", Some("Find the map"));
/// assert!(text.contains("Open the door"));
/// assert!(text.contains("Find the map"));
/// assert!(prompts.ending().contains("3 parts"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl StoryPrompts for DefaultPrompts {
    fn preamble(&self) -> String {
        "You are a creative storyteller running an interactive adventure. \
         You help the player shape a story, then narrate it one passage at a time, \
         offering meaningful choices. Keep content suitable for all ages. \
         When asked for JSON, respond with JSON only, without commentary."
            .to_string()
    }

    fn description(&self, user_input: &str) -> String {
        let input = if user_input.trim().is_empty() {
            "(no input yet, start the conversation)"
        } else {
            user_input
        };
        format!(
            "The player is describing the story they want to play. Player says: {}\n\
             Help them refine it. Respond with a JSON object with these fields:\n\
             - \"storyPremise\": a one-paragraph premise built from everything said so far\n\
             - \"nextQuestion\": one question that would make the premise more specific\n\
             - \"premiseOptions\": three short example answers to that question",
            input
        )
    }

    fn begin_story(&self, user_input: &str) -> String {
        format!(
            "Begin the story using this premise: {}\n\
             Respond with a JSON object with these fields:\n\
             - \"storyParts\": the opening passage split into 3 strings of similar length\n\
             - \"primaryObjective\": what the main character must ultimately achieve\n\
             - \"milestones\": 3 to 5 ordered steps towards that objective\n\
             - \"choices\": 3 objects with \"choice\" (what the player could do next) \
               and \"rating\" (GOOD, NEUTRAL or BAD for reaching the first milestone)",
            user_input
        )
    }

    fn continue_story(&self, user_input: &str, current_milestone: Option<&str>) -> String {
        let milestone = current_milestone.unwrap_or("the primary objective");
        format!(
            "The player chose: {}\n\
             The current milestone is: {}\n\
             Continue the story from that choice. Respond with a JSON object with these fields:\n\
             - \"storyParts\": the next passage split into 3 strings of similar length\n\
             - \"rating\": GOOD, NEUTRAL or BAD, how much the choice helped\n\
             - \"achievedCurrentMilestone\": true only if the passage completes the current milestone\n\
             - \"choices\": 3 objects with \"choice\" and \"rating\"",
            user_input, milestone
        )
    }
}
