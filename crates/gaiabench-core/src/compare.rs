/// Case-insensitive substring containment: the expected final answer must
/// occur verbatim (modulo case) somewhere in the model's answer.
///
/// Deliberately blunt. No whitespace or punctuation normalization, no numeric
/// equivalence, no tokenization. "42" matches "The result is 42." but not
/// "forty-two". This mirrors the comparison the benchmark reviewers actually
/// use and is a documented limitation, not a bug.
pub fn is_correct(model_answer: &str, expected_answer: &str) -> bool {
    model_answer
        .to_lowercase()
        .contains(&expected_answer.to_lowercase())
}
