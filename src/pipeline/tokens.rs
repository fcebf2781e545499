use tiktoken_rs::{get_bpe_from_model, o200k_base};

/// Counts tokens in `text` under the vocabulary of `model_name`. A model
/// unknown to the tokenizer falls back to the generic `o200k_base`
/// vocabulary — the count is then an approximation of what the remote
/// service will bill, not an exact bound. Pure: same inputs, same count.
pub fn count_tokens(text: &str, model_name: &str) -> usize {
    let bpe = match get_bpe_from_model(model_name).or_else(|_| o200k_base()) {
        Ok(bpe) => bpe,
        // Embedded vocabularies failing to load leaves only the rough
        // chars-per-token heuristic.
        Err(_) => return estimate_tokens(text),
    };
    bpe.encode_with_special_tokens(text).len()
}

/// Rough estimate: ~4 chars per token.
fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}
