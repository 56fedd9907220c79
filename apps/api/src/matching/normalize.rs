use std::fmt;

/// A whitespace-collapsed, lower-cased name used only for lookups.
///
/// The empty key never matches anything, not even another empty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(String);

impl NameKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapses whitespace runs to one space, trims, lower-cases. Idempotent.
pub fn normalize(name: &str) -> NameKey {
    NameKey(
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "[A-Za-zÀ-ÿ' \t\n-]{0,40}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(once.as_str()), once);
        }

        #[test]
        fn normalized_key_has_no_outer_or_double_spaces(raw in "[A-Za-z \t]{0,40}") {
            let key = normalize(&raw);
            prop_assert!(!key.as_str().starts_with(' ') && !key.as_str().ends_with(' '));
            prop_assert!(!key.as_str().contains("  "));
        }
    }
}
