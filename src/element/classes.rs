//! Class-token sets.

use std::fmt;

use indexmap::IndexSet;

/// An ordered set of CSS class tokens.
///
/// Tokens keep the order in which they were first inserted; inserting a
/// token twice is a no-op. String inputs are split on whitespace, so
/// `"btn btn-primary"` contributes two tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classes {
    tokens: IndexSet<String>,
}

impl Classes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, classes: impl Into<Classes>) -> &mut Self {
        let other = classes.into();
        for token in other.tokens {
            self.tokens.insert(token);
        }
        self
    }

    pub fn remove(&mut self, classes: impl Into<Classes>) -> &mut Self {
        let other = classes.into();
        for token in &other.tokens {
            self.tokens.shift_remove(token);
        }
        self
    }

    pub fn toggle(&mut self, class_name: &str) -> &mut Self {
        if self.tokens.contains(class_name) {
            self.tokens.shift_remove(class_name);
        } else {
            self.tokens.insert(class_name.to_string());
        }
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.tokens.contains(class_name)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// The value of the `class` attribute.
    pub fn render(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    fn push_str(&mut self, raw: &str) {
        for token in raw.split_whitespace() {
            self.tokens.insert(token.to_string());
        }
    }
}

impl fmt::Display for Classes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Classes {
    fn from(raw: &str) -> Self {
        let mut classes = Classes::new();
        classes.push_str(raw);
        classes
    }
}

impl From<String> for Classes {
    fn from(raw: String) -> Self {
        Classes::from(raw.as_str())
    }
}

impl From<&String> for Classes {
    fn from(raw: &String) -> Self {
        Classes::from(raw.as_str())
    }
}

impl From<&Classes> for Classes {
    fn from(classes: &Classes) -> Self {
        classes.clone()
    }
}

impl<T: AsRef<str>> From<Vec<T>> for Classes {
    fn from(items: Vec<T>) -> Self {
        items.iter().map(AsRef::as_ref).collect()
    }
}

impl<T: AsRef<str>, const N: usize> From<[T; N]> for Classes {
    fn from(items: [T; N]) -> Self {
        items.iter().map(AsRef::as_ref).collect()
    }
}

impl<T: Into<Classes>> From<Option<T>> for Classes {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<'a> FromIterator<&'a str> for Classes {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut classes = Classes::new();
        for raw in iter {
            classes.push_str(raw);
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut classes = Classes::from(["btn", "btn-primary"]);
        classes.toggle("btn-disabled");
        assert_eq!(classes.render(), "btn btn-primary btn-disabled");
        classes.toggle("btn-disabled");
        assert_eq!(classes.render(), "btn btn-primary");
    }

    #[test]
    fn test_union_of_inputs_deduplicates() {
        let nested = Classes::from("card shadow");
        let mut classes = Classes::from("card");
        classes
            .append(vec!["p-4", "card"])
            .append(&nested)
            .append(None::<&str>);
        assert_eq!(classes.render(), "card p-4 shadow");
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn test_render_equals_unique_net_insertions() {
        let ops: [(&str, bool); 7] = [
            ("a", true),
            ("b", true),
            ("a", true),
            ("c", true),
            ("b", false),
            ("d", true),
            ("b", true),
        ];
        let mut classes = Classes::new();
        let mut expected: Vec<&str> = Vec::new();
        for (token, insert) in ops {
            if insert {
                classes.append(token);
                if !expected.contains(&token) {
                    expected.push(token);
                }
            } else {
                classes.remove(token);
                expected.retain(|t| *t != token);
            }
        }
        assert_eq!(classes.render(), expected.join(" "));
        assert_eq!(classes.render(), "a c d b");
    }

    #[test]
    fn test_empty_renders_empty() {
        let mut classes = Classes::from("x");
        classes.remove("x");
        assert!(classes.is_empty());
        assert_eq!(classes.render(), "");
    }
}
