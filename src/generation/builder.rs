use crate::{
    generation::{GenerateContentRequest, GenerationConfig},
    models::{Content, Role},
};

/// Builder for content generation requests
///
/// The builder only assembles the request body; executing it is the job of whatever
/// [`Generator`](crate::analysis::Generator) the caller holds.
#[derive(Debug, Default, Clone)]
pub struct ContentBuilder {
    pub contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
    system_instruction: Option<Content>,
}

impl ContentBuilder {
    /// Creates a new, empty `ContentBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system instruction for the request.
    ///
    /// System instructions are used to provide high-level guidance to the model, such as
    /// setting a persona, providing context, or defining the desired output format.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::text(text));
        self
    }

    /// Adds a user message to the conversation.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::text(text).with_role(Role::User));
        self
    }

    /// Adds a user message that places an uploaded file in front of the prompt text.
    ///
    /// The file goes first so that the model reads the prompt with the media already in
    /// context.
    pub fn with_user_message_and_file(
        mut self,
        text: impl Into<String>,
        mime_type: impl Into<String>,
        file_uri: impl Into<String>,
    ) -> Self {
        let content = Content::file_data(mime_type, file_uri)
            .with_parts_of(Content::text(text))
            .with_role(Role::User);
        self.contents.push(content);
        self
    }

    /// Sets the temperature for the request.
    ///
    /// Temperature controls the randomness of the output. Higher values (e.g., 1.0) produce
    /// more creative results, while lower values (e.g., 0.2) produce more deterministic results.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of output tokens for the request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: i32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
            generation_config: self.generation_config,
            system_instruction: self.system_instruction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_part_precedes_prompt_text() {
        let request = ContentBuilder::new()
            .with_user_message_and_file("Describe it", "video/mp4", "https://files/abc")
            .with_temperature(0.5)
            .build();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "parts": [
                        {"fileData": {"mimeType": "video/mp4", "fileUri": "https://files/abc"}},
                        {"text": "Describe it"}
                    ],
                    "role": "user"
                }],
                "generationConfig": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn system_instruction_has_no_role() {
        let request = ContentBuilder::new()
            .with_system_instruction("Be brief")
            .with_user_message("Hello")
            .with_max_output_tokens(100)
            .build();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"], json!({"parts": [{"text": "Be brief"}]}));
        assert_eq!(value["generationConfig"], json!({"maxOutputTokens": 100}));
        assert_eq!(value["contents"][0]["role"], "user");
    }
}
