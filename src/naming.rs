//! Entity name to table / path / embed key conversion.

/// Pluralize a lowercased English noun: "user" -> "users", "category" -> "categories",
/// "status" -> "statuses". Deterministic; no irregular forms.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before_y = stem.chars().last();
        if before_y.map(|c| !"aeiou".contains(c)).unwrap_or(false) {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", word)
}

/// Table name and REST path segment for an entity: plural of the lowercased name.
pub fn table_name(entity_name: &str) -> String {
    pluralize(&entity_name.to_lowercase())
}

/// Key under which a single related row is embedded: lowercased singular name.
pub fn singular_key(entity_name: &str) -> String {
    entity_name.to_lowercase()
}
