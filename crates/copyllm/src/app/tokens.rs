//! Token estimation for aggregated documents.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use tiktoken_rs::{CoreBPE, cl100k_base};

/// Average characters per token when no encoder is available.
const CHARS_PER_TOKEN: f32 = 4.0;

static CL100K: Lazy<Option<Mutex<CoreBPE>>> = Lazy::new(|| match cl100k_base() {
    Ok(core) => Some(Mutex::new(core)),
    Err(err) => {
        tracing::warn!(error = %err, "failed to load cl100k tokenizer, using heuristic");
        None
    }
});

/// How a token count was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cl100k,
    Heuristic,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Cl100k => "cl100k",
            TokenSource::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimate {
    pub tokens: usize,
    pub characters: usize,
    pub source: TokenSource,
}

/// Approximate the prompt size of `text` with the `cl100k_base` encoding.
pub fn estimate_tokens(text: &str) -> TokenEstimate {
    let characters = text.chars().count();
    if text.trim().is_empty() {
        return TokenEstimate {
            tokens: 0,
            characters,
            source: TokenSource::Heuristic,
        };
    }

    let encoder = match &*CL100K {
        Some(core) => core.lock().ok(),
        None => None,
    };
    match encoder {
        Some(core) => TokenEstimate {
            tokens: core.encode_ordinary(text).len(),
            characters,
            source: TokenSource::Cl100k,
        },
        None => TokenEstimate {
            tokens: heuristic_tokens(characters),
            characters,
            source: TokenSource::Heuristic,
        },
    }
}

fn heuristic_tokens(characters: usize) -> usize {
    (characters as f32 / CHARS_PER_TOKEN).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        let estimate = estimate_tokens("   \n");
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.characters, 4);
    }

    #[test]
    fn counts_tokens_for_code() {
        let estimate = estimate_tokens("fn main() {\n    println!(\"hello\");\n}\n");
        assert!(estimate.tokens > 0);
        assert!(estimate.tokens < estimate.characters);
    }

    #[test]
    fn blank_text_is_counted_heuristically() {
        assert_eq!(estimate_tokens("").source, TokenSource::Heuristic);
    }

    #[test]
    fn heuristic_rounds_up() {
        assert_eq!(heuristic_tokens(9), 3);
        assert_eq!(heuristic_tokens(8), 2);
    }
}
