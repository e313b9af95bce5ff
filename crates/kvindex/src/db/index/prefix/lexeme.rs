use crate::{
    db::index::slot,
    error::InternalError,
    model::{EntityModel, FieldId},
    value::Value,
};
use std::collections::BTreeSet;

/// Lowercased maximal alphanumeric runs of every whitespace-separated word,
/// in text order and with repeats.
#[must_use]
pub fn split_lexemes(text: &str) -> Vec<String> {
    text.split_whitespace()
        .flat_map(|word| {
            word.to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|run| !run.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Lexemes stored for `text`: distinct, minus every lexeme that is a prefix
/// of another one.
#[must_use]
pub fn lexemes(text: &str) -> BTreeSet<String> {
    maximal(split_lexemes(text).into_iter().collect())
}

/// Lexemes stored for the indexed text fields of one row. Null fields
/// contribute nothing.
pub fn lexemes_for(
    model: &EntityModel,
    fields: &[FieldId],
    row: &[Option<Value>],
) -> Result<BTreeSet<String>, InternalError> {
    let mut all = BTreeSet::new();
    for field in fields {
        match slot(model, row, *field)? {
            None => {}
            Some(Value::Text(text)) => all.extend(split_lexemes(text)),
            Some(other) => {
                return Err(InternalError::index_unsupported(format!(
                    "prefix index field {field} holds a {} value",
                    other.kind()
                )));
            }
        }
    }

    Ok(maximal(all))
}

/// Whitespace-separated words of a phrase, lowercased and ordered by
/// ascending length. Punctuation stays inside its word. The last word is
/// the longest.
#[must_use]
pub fn split_search_words(phrase: &str) -> Vec<String> {
    let mut words: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
    words.sort_by_key(String::len);
    words
}

/// True when every word starts some lexeme.
#[must_use]
pub fn words_match(words: &[String], lexemes: &BTreeSet<String>) -> bool {
    words
        .iter()
        .all(|word| lexemes.iter().any(|lexeme| lexeme.starts_with(word.as_str())))
}

/// Lexemes to remove and to insert when a row's lexeme set changes.
#[must_use]
pub fn diff_lexemes(
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let removed = old.difference(new).cloned().collect();
    let inserted = new.difference(old).cloned().collect();

    (removed, inserted)
}

// In sorted order every lexeme extending `x` directly follows `x`.
fn maximal(sorted: BTreeSet<String>) -> BTreeSet<String> {
    let all: Vec<String> = sorted.into_iter().collect();

    all.iter()
        .enumerate()
        .filter(|(i, lexeme)| {
            all.get(i + 1)
                .is_none_or(|next| !next.starts_with(lexeme.as_str()))
        })
        .map(|(_, lexeme)| lexeme.clone())
        .collect()
}
