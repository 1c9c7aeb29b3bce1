use std::collections::HashSet;

use crate::categories::CategoryTable;

pub const MAX_SAMPLE_PHRASES: usize = 5;

const GENERIC: &[&str] = &["use {api}", "call {api} {endpoint}", "get {endpoint} from {api}"];

/// Natural-language invocations for an endpoint: category templates first,
/// then the table's default templates, then generic fallbacks.
/// Case-insensitively unique, at most [`MAX_SAMPLE_PHRASES`].
pub fn sample_phrases(api: &str, endpoint: &str, category: &str, table: &CategoryTable) -> Vec<String> {
    let endpoint = endpoint.replace('_', " ");
    let category_templates = &table.profile(category).phrases;
    let default_templates = &table.default.phrases;

    let mut seen = HashSet::new();
    category_templates
        .iter()
        .map(String::as_str)
        .chain(default_templates.iter().map(String::as_str))
        .chain(GENERIC.iter().copied())
        .map(|t| t.replace("{api}", api).replace("{endpoint}", &endpoint))
        .filter(|p| seen.insert(p.to_lowercase()))
        .take(MAX_SAMPLE_PHRASES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_phrases_lead_and_cap_applies() {
        let table = CategoryTable::builtin();
        let phrases = sample_phrases("JokeAPI", "random", "Entertainment", &table);
        assert_eq!(phrases.len(), MAX_SAMPLE_PHRASES);
        assert_eq!(phrases[0], "tell me a joke");
        assert!(phrases.iter().any(|p| p.contains("JokeAPI")));
    }

    #[test]
    fn unknown_category_gets_generic_phrases() {
        let phrases = sample_phrases("Mystery", "by_name", "Nothing", &CategoryTable::default());
        assert_eq!(
            phrases,
            vec!["use Mystery", "call Mystery by name", "get by name from Mystery"]
        );
    }

    #[test]
    fn duplicates_collapse_case_insensitively() {
        let table = CategoryTable::parse(
            "default: {phrases: [\"USE {api}\", \"use {api}\"]}\ncategories: {}\n",
        )
        .unwrap();
        let phrases = sample_phrases("X", "y", "z", &table);
        assert_eq!(phrases, vec!["USE X", "call X y", "get y from X"]);
    }
}
