//! Column-name derivation strategies
//!
//! Maps a Rust field/type name to the column name written into the
//! Parquet schema. `SnakeCase` reproduces the `camelCaseToSnakeCase`
//! transform of the source this crate was ported from, so descriptors
//! built from languages (or hand-authored specs) using camelCase field
//! names still map to idiomatic snake_case columns.

/// How a field's Rust identifier is turned into a Parquet column name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnNamingStrategy {
    /// Use the identifier unchanged
    #[default]
    FieldName,
    /// Apply [`camel_case_to_snake_case`]
    SnakeCase,
}

impl ColumnNamingStrategy {
    pub fn apply(self, name: &str) -> String {
        match self {
            ColumnNamingStrategy::FieldName => name.to_string(),
            ColumnNamingStrategy::SnakeCase => camel_case_to_snake_case(name),
        }
    }
}

/// Convert a camelCase (or PascalCase) identifier to snake_case.
///
/// A name with a leading underscore is treated as already finalized: only
/// the underscore prefix is stripped, with no further case splitting, so
/// `_alreadyLower` maps to `alreadyLower` rather than `already_lower`.
/// Otherwise, runs of consecutive uppercase letters are kept glued
/// (`URLPath -> url_path`, `HTML -> html`) unless the run is followed by a
/// lowercase letter, in which case an underscore is inserted before the
/// last uppercase letter of the run (`parseXMLValue -> parse_xml_value`).
pub fn camel_case_to_snake_case(name: &str) -> String {
    if name.starts_with('_') {
        let stripped = name.trim_start_matches('_');
        return if stripped.is_empty() {
            name.to_string()
        } else {
            stripped.to_string()
        };
    }

    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return name.to_string();
    }
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_upper = i > 0 && chars[i - 1].is_uppercase();
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());

            let starts_new_word = if i == 0 {
                false
            } else if !prev_is_upper {
                // lower/digit -> upper transition always starts a new word
                true
            } else {
                // upper -> upper transition only starts a new word when the
                // uppercase run is about to end (next char is lowercase),
                // i.e. this is the last capital of an acronym before a word
                next_is_lower
            };

            if starts_new_word && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    if out.is_empty() {
        name.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name() {
        assert_eq!(camel_case_to_snake_case("userName"), "user_name");
    }

    #[test]
    fn url_path() {
        assert_eq!(camel_case_to_snake_case("URLPath"), "url_path");
    }

    #[test]
    fn parse_xml_value() {
        assert_eq!(camel_case_to_snake_case("parseXMLValue"), "parse_xml_value");
    }

    #[test]
    fn bare_id() {
        assert_eq!(camel_case_to_snake_case("ID"), "id");
    }

    #[test]
    fn bare_html() {
        assert_eq!(camel_case_to_snake_case("HTML"), "html");
    }

    #[test]
    fn leading_underscore_lowercase() {
        assert_eq!(camel_case_to_snake_case("_alreadyLower"), "alreadyLower");
    }

    #[test]
    fn idempotent_on_already_snake_case() {
        let once = camel_case_to_snake_case("user_name");
        let twice = camel_case_to_snake_case(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "user_name");
    }

    #[test]
    fn empty_falls_back_to_input() {
        assert_eq!(camel_case_to_snake_case(""), "");
        assert_eq!(camel_case_to_snake_case("___"), "___");
    }

    #[test]
    fn strategy_field_name_is_identity() {
        assert_eq!(
            ColumnNamingStrategy::FieldName.apply("userName"),
            "userName"
        );
    }

    #[test]
    fn strategy_snake_case_delegates() {
        assert_eq!(
            ColumnNamingStrategy::SnakeCase.apply("userName"),
            "user_name"
        );
    }
}
