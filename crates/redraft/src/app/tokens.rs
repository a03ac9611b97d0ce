//! Token estimation for the outbound prompt.

use std::sync::{Arc, Mutex, OnceLock};

use tiktoken_rs::{CoreBPE, o200k_base};

/// Average characters per token used when no tokenizer is available.
const FALLBACK_CHARS_PER_TOKEN: f32 = 4.0;

/// Estimated size of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptEstimate {
    pub tokens: usize,
    pub characters: usize,
    /// False when the character heuristic was used instead of a real BPE.
    pub exact: bool,
}

/// Estimate tokens for `text` with the o200k BPE, falling back to a
/// character heuristic when tokenizer initialization fails.
///
/// Prompts are rebuilt fresh on every render, so there is nothing stable to
/// cache against; each call tokenizes from scratch.
pub fn estimate_prompt(text: &str) -> PromptEstimate {
    let characters = text.chars().count();
    if text.trim().is_empty() {
        return PromptEstimate {
            tokens: 0,
            characters,
            exact: true,
        };
    }

    match tokenizer() {
        Some(bpe) => PromptEstimate {
            tokens: bpe.lock().unwrap().encode_ordinary(text).len(),
            characters,
            exact: true,
        },
        None => PromptEstimate {
            tokens: heuristic_tokens(characters),
            characters,
            exact: false,
        },
    }
}

fn heuristic_tokens(characters: usize) -> usize {
    ((characters as f32) / FALLBACK_CHARS_PER_TOKEN).ceil().max(1.0) as usize
}

fn tokenizer() -> Option<Arc<Mutex<CoreBPE>>> {
    static O200K: OnceLock<Option<Arc<Mutex<CoreBPE>>>> = OnceLock::new();
    O200K
        .get_or_init(|| o200k_base().ok().map(|bpe| Arc::new(Mutex::new(bpe))))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_estimates_zero_tokens() {
        let estimate = estimate_prompt("");
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.characters, 0);
    }

    #[test]
    fn whitespace_only_prompt_estimates_zero_tokens() {
        assert_eq!(estimate_prompt("  \n\t ").tokens, 0);
    }

    #[test]
    fn nonempty_prompt_estimates_at_least_one_token() {
        let estimate = estimate_prompt("Hello world!");
        assert!(estimate.tokens >= 1);
        assert_eq!(estimate.characters, 12);
    }

    #[test]
    fn longer_prompts_cost_more_tokens() {
        let short = estimate_prompt("fn main() {}");
        let long = estimate_prompt(&"fn main() {}\n".repeat(50));
        assert!(long.tokens > short.tokens);
    }

    #[test]
    fn heuristic_scales_with_characters() {
        assert_eq!(heuristic_tokens(4), 1);
        assert_eq!(heuristic_tokens(10), 3);
        assert_eq!(heuristic_tokens(1), 1);
    }
}
