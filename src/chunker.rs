//! Sentence-aligned splitting of oversized documents.
//!
//! Lengths are counted in `char`s. Chunks borrow from the input and concatenate back
//! into it exactly; a sentence longer than the limit is cut at `char` boundaries.

/// Characters that end a sentence.
pub const DEFAULT_TERMINATORS: &[char] = &['。', '！', '？', '.', '!', '?'];

/// Maximum chunk length used when the caller does not choose one.
pub const DEFAULT_MAX_CHARS: usize = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Upper bound on a chunk's length in `char`s; at least 1
    pub max_chars: usize,
    pub terminators: Vec<char>,
}

impl ChunkConfig {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            ..Self::default()
        }
    }

    pub fn with_terminators(mut self, terminators: impl IntoIterator<Item = char>) -> Self {
        self.terminators = terminators.into_iter().collect();
        self
    }

    /// Whether `text` fits in a single chunk.
    pub fn fits(&self, text: &str) -> bool {
        text.chars().count() <= self.max_chars
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            terminators: DEFAULT_TERMINATORS.to_vec(),
        }
    }
}

/// Split `text` into ordered chunks of at most `config.max_chars` characters.
///
/// Whole sentences are packed greedily. A sentence that alone exceeds the limit closes
/// the current chunk and is cut into limit-sized pieces; its remainder starts the next
/// chunk. Text that already fits, the empty string included, is returned as the only
/// chunk.
pub fn split_text<'a>(text: &'a str, config: &ChunkConfig) -> Vec<&'a str> {
    let max = config.max_chars.max(1);
    if text.chars().count() <= max {
        return vec![text];
    }

    let mut chunks = Vec::new();

    // current chunk is text[start..end], `len` chars long
    let mut start = 0;
    let mut end = 0;
    let mut len = 0;

    for sentence in text.split_inclusive(config.terminators.as_slice()) {
        let sentence_len = sentence.chars().count();

        if len + sentence_len <= max {
            end += sentence.len();
            len += sentence_len;
            continue;
        }

        if len > 0 {
            chunks.push(&text[start..end]);
        }
        start = end;

        let mut rest = sentence;
        let mut rest_len = sentence_len;
        while rest_len > max {
            let cut = byte_offset_of_char(rest, max);
            chunks.push(&rest[..cut]);
            rest = &rest[cut..];
            rest_len -= max;
            start += cut;
        }

        end = start + rest.len();
        len = rest_len;
    }

    if len > 0 {
        chunks.push(&text[start..end]);
    }

    chunks
}

fn byte_offset_of_char(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str, max_chars: usize) -> Vec<&str> {
        split_text(text, &ChunkConfig::new(max_chars))
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let text = "第一句。第二句。";
        assert_eq!(split(text, 100), vec![text]);
        assert_eq!(split(text, 8), vec![text]);
    }

    #[test]
    fn one_sentence_per_chunk_when_limit_is_tight() {
        assert_eq!(split("A。B。C。", 2), vec!["A。", "B。", "C。"]);
    }

    #[test]
    fn sentences_are_packed_greedily() {
        let chunks = split("Aa. Bb. Cc. Dd.", 8);
        assert_eq!(chunks, vec!["Aa. Bb.", " Cc. Dd."]);
    }

    #[test]
    fn oversized_sentence_is_force_split() {
        let chunks = split("短。abcdefghij。尾。", 4);
        assert_eq!(chunks, vec!["短。", "abcd", "efgh", "ij。", "尾。"]);
    }

    #[test]
    fn remainder_of_forced_split_joins_following_sentences() {
        let chunks = split("abcdefg。x。", 5);
        assert_eq!(chunks, vec!["abcde", "fg。x。"]);
    }

    #[test]
    fn multibyte_characters_are_never_broken() {
        let text = "這是一個沒有句號而且非常長的句子";
        let chunks = split(text, 5);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks[0], "這是一個沒");
    }

    #[test]
    fn trailing_text_without_terminator_is_kept() {
        assert_eq!(split("One. Two", 5), vec!["One.", " Two"]);
    }

    #[test]
    fn empty_input_is_one_empty_chunk() {
        assert_eq!(split("", 10), vec![""]);
        assert_eq!(split("", 1), vec![""]);
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(split("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn custom_terminators() {
        let config = ChunkConfig::new(4).with_terminators([';']);
        assert_eq!(split_text("ab;cd;ef", &config), vec!["ab;", "cd;", "ef"]);
    }

    #[test]
    fn chunks_respect_limit_and_reconstruct_input() {
        let text = "The quick brown fox jumps. Over the lazy dog! Again? \
                    天氣很好。我們去公園散步吧！好不好？\
                    Averyveryverylongwordwithoutanyterminatoratall and more.";
        for max in 1..=40 {
            let chunks = split(text, max);
            assert!(
                chunks.iter().all(|c| c.chars().count() <= max),
                "chunk over limit for max={max}"
            );
            assert!(chunks.iter().all(|c| !c.is_empty()));
            assert_eq!(chunks.concat(), text, "reconstruction failed for max={max}");
        }
    }
}
