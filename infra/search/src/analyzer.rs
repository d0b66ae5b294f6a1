/// Lowercases `text` and splits it on every non-alphanumeric character.
///
/// ```rust
/// assert_eq!(wf_search::analyze("Jean-Luc O'Brien"), ["jean", "luc", "o", "brien"]);
/// ```
#[must_use]
pub fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
