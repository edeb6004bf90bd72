use serde::Serialize;
use std::{
    iter::Sum,
    ops::Add,
    time::Duration,
};

use crate::generation::{GenerationResponse, UsageMetadata};

/// Token consumption of one or more generation calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<&UsageMetadata> for TokenUsage {
    fn from(usage: &UsageMetadata) -> Self {
        let count = |value: Option<i32>| value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0);
        Self {
            prompt_tokens: count(usage.prompt_token_count),
            completion_tokens: count(usage.candidates_token_count),
            total_tokens: count(usage.total_token_count),
        }
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

impl Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), Add::add)
    }
}

/// The successful outcome of an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Generated text; `None` when the model returned no text parts
    pub text: Option<String>,
    pub usage: TokenUsage,
    /// Handle of the uploaded asset, for media analyses
    pub file_id: Option<String>,
}

impl Analysis {
    pub fn from_response(response: &GenerationResponse) -> Self {
        Self {
            text: response.text(),
            usage: response
                .usage_metadata
                .as_ref()
                .map(TokenUsage::from)
                .unwrap_or_default(),
            file_id: None,
        }
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    /// Merge per-chunk analyses in order.
    ///
    /// Each text is placed under a `Part i of n analysis:` heading, parts are separated
    /// by a blank line, and usage counters are summed.
    pub fn merge(parts: Vec<Analysis>) -> Analysis {
        let total = parts.len();
        let usage = parts.iter().map(|part| part.usage).sum();
        let text = parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                format!(
                    "Part {} of {total} analysis:\n{}",
                    index + 1,
                    part.text.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Analysis {
            text: Some(text),
            usage,
            file_id: None,
        }
    }
}

/// Outcome of the `test` command.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionReport {
    pub text: Option<String>,
    pub usage: TokenUsage,
    pub response_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(text: &str, prompt: u64, completion: u64) -> Analysis {
        Analysis {
            text: Some(text.to_string()),
            usage: TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            },
            file_id: None,
        }
    }

    #[test]
    fn merge_labels_parts_in_order_and_sums_usage() {
        let merged = Analysis::merge(vec![part("alpha", 10, 1), part("beta", 20, 2)]);

        assert_eq!(
            merged.text.as_deref(),
            Some("Part 1 of 2 analysis:\nalpha\n\nPart 2 of 2 analysis:\nbeta")
        );
        assert_eq!(
            merged.usage,
            TokenUsage {
                prompt_tokens: 30,
                completion_tokens: 3,
                total_tokens: 33,
            }
        );
    }

    #[test]
    fn missing_usage_counts_as_zero() {
        let usage = TokenUsage::from(&UsageMetadata {
            prompt_token_count: Some(7),
            ..Default::default()
        });
        assert_eq!(
            usage,
            TokenUsage {
                prompt_tokens: 7,
                completion_tokens: 0,
                total_tokens: 0,
            }
        );
    }
}
