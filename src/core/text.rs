/// Word-level helpers — tokenizing text into sentences, training a chain
/// on them, and turning generated tokens back into text.

use crate::core::chain::Chain;
use crate::core::error::MarkovError;
use crate::core::sampler::Draw;
use crate::core::walker::Walker;

/// Special token marking sentence start.
pub const SENTENCE_START: &str = "<S>";
/// Special token marking sentence end.
pub const SENTENCE_END: &str = "</S>";

const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];
const PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':', '"', '\'', '(', ')'];

/// The padding state every sentence of a `train_sentences` chain starts from.
pub fn sentence_start(order: usize) -> Vec<String> {
    vec![SENTENCE_START.to_string(); order]
}

/// Train a word chain from raw text.
///
/// Each sentence is learned separately, prefixed with `order` start tokens
/// and followed by an end token. A walk from `sentence_start(order)`
/// therefore produces one sentence and stops after `SENTENCE_END`.
///
/// # Errors
/// `InvalidOrder` for order zero, `CorpusTooShort` if the text has no words.
pub fn train_sentences(text: &str, order: usize) -> Result<Chain<String>, MarkovError> {
    let mut chain = Chain::new(order)?;
    let mut sentences = 0;

    for line in text.lines() {
        let tokens = tokenize(line.trim());
        for sentence in split_into_sentences(&tokens) {
            let padded = sentence_start(order)
                .into_iter()
                .chain(sentence)
                .chain(std::iter::once(SENTENCE_END.to_string()));
            chain.learn(padded)?;
            sentences += 1;
        }
    }

    if sentences == 0 {
        return Err(MarkovError::CorpusTooShort {
            needed: 1,
            got: 0,
        });
    }

    log::debug!("trained {} on {} sentences", chain, sentences);
    Ok(chain)
}

/// Collect one sentence from `walker`, without the end token.
///
/// Stops at `SENTENCE_END`, at a dead end, or after `max_tokens` tokens.
pub fn walk_sentence<D: Draw>(walker: &mut Walker<String, D>, max_tokens: usize) -> Vec<String> {
    walker
        .by_ref()
        .take(max_tokens)
        .take_while(|token| token != SENTENCE_END)
        .collect()
}

/// Split text into words, with every punctuation mark as its own token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let mut run_start = 0;
        for (at, c) in word.char_indices() {
            if !PUNCTUATION.contains(&c) {
                continue;
            }
            if run_start < at {
                tokens.push(word[run_start..at].to_string());
            }
            tokens.push(c.to_string());
            run_start = at + c.len_utf8();
        }
        if run_start < word.len() {
            tokens.push(word[run_start..].to_string());
        }
    }
    tokens
}

/// Group tokens into sentences, each ending after `.`, `!` or `?`. Tokens
/// after the last ender form a final sentence.
pub fn split_into_sentences(tokens: &[String]) -> Vec<Vec<String>> {
    tokens
        .split_inclusive(|tok| is_single(tok, SENTENCE_ENDERS))
        .map(<[String]>::to_vec)
        .collect()
}

/// Reassemble tokens into natural text (attach punctuation to previous word).
pub fn reassemble_tokens(tokens: &[String]) -> String {
    let mut result = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 && !is_single(tok, PUNCTUATION) {
            result.push(' ');
        }
        result.push_str(tok);
    }
    result
}

fn is_single(tok: &str, set: &[char]) -> bool {
    let mut chars = tok.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if set.contains(&c))
}
