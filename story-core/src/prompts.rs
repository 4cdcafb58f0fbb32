//! Prompt builders for the writer and reader agents.
//!
//! The marker constants are part of the wire protocol with the generation
//! capability: replies are parsed by searching for these exact strings, so
//! they must never change.

use crate::state::StoryMeta;

/// Opens the logical-consistency section of a reader reply.
pub const LOGICAL_MARKER: &str = "## logical detail confusion:";

/// Opens the character-growth section of a reader reply.
pub const CHARACTER_MARKER: &str = "## character growth confusion:";

/// Opens the refreshed outline in an outline-refresh reply.
pub const NEW_OUTLINE_MARKER: &str = "## new_outline:";

/// Opens the completed story in a polish reply.
pub const WHOLE_STORY_MARKER: &str = "## whole story:";

/// Terminates every marked section.
pub const END_MARKER: &str = "## END";

/// System prompt for the writer agent.
pub fn writer_system_prompt(meta: &StoryMeta, outline: &str) -> String {
    format!(
        "You're a talented story writer and a native speaker of {language}. \
         Your task is to edit a part of the story in {language} based on the \
         following OUTLINE:{outline}. It's fine to invent or drop details the \
         outline doesn't mention, such as characters' names, emotions, logic \
         and personal stories, as long as they're logically appropriate. Keep \
         everything as specific as possible.",
        language = meta.language,
    )
}

/// Initial expansion request for the writer agent.
pub fn writer_initial_prompt(meta: &StoryMeta, outline: &str, length: usize) -> String {
    format!(
        r#"Now, I'm writing a story based on the following information:
topic: {topic}, Main character: {main_character}, Main Goal: {main_goal}, language: {language}.
Your task is to expand specific writing based on the OUTLINE:{outline}, and your expanded story should still be focused on this topic: {topic}.
Follow these steps:
1. Expand the writing based on the original outline to at least {length} words;
2. It's fine to invent details the outline doesn't mention, such as characters' names and personal stories, as long as they're logically appropriate and as specific as possible.
3. Add some details to make this part of the story more readable.
4. Don't overwrite the settings or information of the main characters. Make sure your story is fresh to readers who have already read the former storylines.
5. Your output should be in {language}, and your story should still be focused on this topic: {topic} and OUTLINE:{outline}.
Output your result without any explanation."#,
        topic = meta.topic,
        main_character = meta.main_character,
        main_goal = meta.main_goal,
        language = meta.language,
        outline = outline,
        length = length,
    )
}

/// Revision request appended to the transcript after reader feedback.
pub fn writer_revision_prompt(
    meta: &StoryMeta,
    outline: &str,
    logical: &str,
    character_growth: &str,
) -> String {
    format!(
        r#"After reading your expanded story, I find there are some logical details and character growth issues in it. Here's my logical detail suggestion:{logical}.
And here's my character suggestion:{character_growth}.
Edit your last output into a better one that follows my logical suggestion and character growth suggestion. Still, make sure your story stays true to this topic: {topic} and OUTLINE:{outline}.
Follow these steps:
1. Look at the logical and character growth suggestions and edit your last output into a better one based on them.
2. Don't overwrite the settings or information of the main characters. Make sure your story is fresh to readers who have already read the former storylines.
Output your result without any explanation."#,
        topic = meta.topic,
        outline = outline,
        logical = logical,
        character_growth = character_growth,
    )
}

/// Asks the generation capability to re-derive the outline after expansion.
pub fn outline_refresh_prompt(meta: &StoryMeta, outline: &str, story: &str) -> String {
    format!(
        r#"You're a good story writer and a native speaker of {language}. Now you get one part of your story:{story}.
The story was generated based on this outline: {outline}
Your job is to see whether this part of the story carries any extra detail or added information compared to its original outline. If it does, generate a new outline based on this part of the story. Output your result without any explanation.
Follow this format:
{new_outline_marker}
<your new outline>
{end_marker}"#,
        language = meta.language,
        story = story,
        outline = outline,
        new_outline_marker = NEW_OUTLINE_MARKER,
        end_marker = END_MARKER,
    )
}

/// System prompt for the reader agent.
pub fn reader_system_prompt(meta: &StoryMeta) -> String {
    format!(
        "You're a delicate and experienced {topic} story reader and a native \
         speaker of {language}. You're a good thinker, eager to speak out \
         about issues in the story, and you also focus on its details.",
        topic = meta.topic,
        language = meta.language,
    )
}

/// Critique request for the reader agent.
pub fn reader_request_prompt(meta: &StoryMeta, segment: &str) -> String {
    format!(
        r#"I'm writing a story based on the following information:
topic: {topic}, Main character: {main_character}, Main Goal: {main_goal}, language: {language}.
Now here's a part of my story: {segment}.
Do you have any idea about the story? Follow these steps to give me your response:
1. Read this part of the story CAREFULLY;
2. Is there any part you find hard to logically understand? Give me your confusion and suggestions. If you can understand this part of the story well, just give an empty response;
3. Do the details in this part of the story logically make sense? Is the character growth of {main_character} detailed enough? If not, give me your suggestion. If you can understand the character growth well, just give me an empty response.
Give me your response in the following format:
{logical_marker}
<here, put the confusion and suggestions about the logic of this part of the story, in {language}, that you found in step 2>
{character_marker}
<here, put the confusion and suggestions about the character growth of this part of the story, in {language}, that you found in step 3>
{end_marker}"#,
        topic = meta.topic,
        main_character = meta.main_character,
        main_goal = meta.main_goal,
        language = meta.language,
        segment = segment,
        logical_marker = LOGICAL_MARKER,
        character_marker = CHARACTER_MARKER,
        end_marker = END_MARKER,
    )
}

/// Asks the generation capability to dedupe and complete a finished story.
pub fn finish_story_prompt(language: &str, story: &str) -> String {
    format!(
        r#"You're a good story writer and a native speaker of {language}. Now you get one part of your story:{story}. Your job is to complete the story and delete any repetitive part.
Follow these steps to edit this story part:
1. Read the story part carefully and delete any repetitive part;
2. Check the last sentence of this part of the story; if it is not complete, generate a new sentence completing it and output the completed whole story.
Output your story in this format:
{whole_story_marker}
<your new story>
{end_marker}"#,
        language = language,
        story = story,
        whole_story_marker = WHOLE_STORY_MARKER,
        end_marker = END_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> StoryMeta {
        StoryMeta::new("fantasy", "Mira", "find the lost city", "English")
    }

    #[test]
    fn test_reader_request_carries_markers() {
        let prompt = reader_request_prompt(&meta(), "Once upon a time.");
        assert!(prompt.contains(LOGICAL_MARKER));
        assert!(prompt.contains(CHARACTER_MARKER));
        assert!(prompt.contains(END_MARKER));
        assert!(prompt.contains("Once upon a time."));
    }

    #[test]
    fn test_outline_refresh_carries_markers() {
        let prompt = outline_refresh_prompt(&meta(), "the outline", "the story");
        assert!(prompt.contains(NEW_OUTLINE_MARKER));
        assert!(prompt.contains(END_MARKER));
    }

    #[test]
    fn test_initial_prompt_embeds_metadata() {
        let prompt = writer_initial_prompt(&meta(), "the outline", 800);
        assert!(prompt.contains("fantasy"));
        assert!(prompt.contains("Mira"));
        assert!(prompt.contains("find the lost city"));
        assert!(prompt.contains("800"));
    }
}
