//! Inline style declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared style of an element, keyed by kebab-case property name.
///
/// There is no cascade: the computed style of an element is exactly what
/// its description declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMap {
    properties: BTreeMap<String, String>,
}

impl StyleMap {
    /// Create an empty style map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `prop: value; prop: value` text. Property names may be
    /// kebab-case (`background-color`) or camelCase (`backgroundColor`).
    pub fn parse(declarations: &str) -> Self {
        let mut style = Self::new();
        for declaration in declarations.split(';') {
            if let Some((property, value)) = declaration.split_once(':') {
                let property = property.trim();
                if !property.is_empty() {
                    style.set(property, value);
                }
            }
        }
        style
    }

    /// Set a declaration. Property names are normalized to kebab case.
    pub fn set(&mut self, property: &str, value: &str) {
        self.properties
            .insert(kebab_case(property.trim()), normalize_value(value));
    }

    /// Value of a declaration, in either naming.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties
            .get(&kebab_case(property.trim()))
            .map(String::as_str)
    }

    /// Remove a declaration, returning its value.
    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.properties.remove(&kebab_case(property.trim()))
    }

    /// Every declaration in `declarations` is present with an equal value.
    pub fn matches_declarations(&self, declarations: &str) -> bool {
        let expected = Self::parse(declarations);
        expected
            .properties
            .iter()
            .all(|(property, value)| self.properties.get(property) == Some(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(property, value)| (property.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (property, value) in &self.properties {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{property}: {value};")?;
            first = false;
        }
        Ok(())
    }
}

fn kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_case_properties() {
        let style = StyleMap::parse("backgroundColor: black;\n  color: White ;");
        assert_eq!(style.get("background-color"), Some("black"));
        assert_eq!(style.get("backgroundColor"), Some("black"));
        assert_eq!(style.get("color"), Some("white"));
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn test_matches_declarations_subset() {
        let mut style = StyleMap::new();
        style.set("background-color", "white");
        style.set("color", "black");
        style.set("padding", "8px  12px");

        assert!(style.matches_declarations("background-color: white; color: black;"));
        assert!(style.matches_declarations("padding: 8px 12px"));
        assert!(!style.matches_declarations("color: white"));
        assert!(!style.matches_declarations("border: none"));
    }

    #[test]
    fn test_display() {
        let style = StyleMap::parse("color: red; margin: 0");
        assert_eq!(style.to_string(), "color: red; margin: 0;");
    }
}
