//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! This is an explicit, documented approximation — NOT an exact tokenizer
//! count. The per-section budgets in the assembler are tuned against this
//! heuristic, so it must not be silently "fixed" to be more accurate.

use devsquad_core::message::ConversationMessage;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() + 3) / 4
}

/// Estimate tokens for a conversation message including per-message
/// overhead (~4 tokens for speaker name and delimiters).
pub fn estimate_message_tokens(message: &ConversationMessage) -> usize {
    4 + estimate_tokens(&message.content)
}
