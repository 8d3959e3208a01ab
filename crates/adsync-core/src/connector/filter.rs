// ── Search filters ──
//
// The small subset of RFC 4515 filters load and synchronize issue. Rendered
// to the string form for a wire connector, evaluated directly against an
// `Entry` by the in-memory one.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dn::escape_filter_value;
use super::entry::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality { attribute: String, value: String },
    Present { attribute: String },
}

impl Filter {
    pub fn equals(attribute: &str, value: impl Into<String>) -> Self {
        Self::Equality {
            attribute: attribute.to_owned(),
            value: value.into(),
        }
    }

    pub fn present(attribute: &str) -> Self {
        Self::Present {
            attribute: attribute.to_owned(),
        }
    }

    pub fn object_class(class: &str) -> Self {
        Self::equals("objectClass", class)
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Every entry has an object class.
    pub fn any() -> Self {
        Self::present("objectClass")
    }

    /// Evaluate against an entry. Equality is case-insensitive, matching the
    /// directory's default matching rule for the attributes used here.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Self::Not(filter) => !filter.matches(entry),
            Self::Equality { attribute, value } => entry.has_value(attribute, value),
            Self::Present { attribute } => entry.has(attribute),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Not(filter) => write!(f, "(!{filter})"),
            Self::Equality { attribute, value } => {
                write!(f, "({attribute}={})", escape_filter_value(value))
            }
            Self::Present { attribute } => write!(f, "({attribute}=*)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_filter() -> Filter {
        Filter::and([
            Filter::object_class("user"),
            Filter::not(Filter::object_class("computer")),
        ])
    }

    #[test]
    fn renders_rfc4515() {
        insta::assert_snapshot!(user_filter(), @"(&(objectClass=user)(!(objectClass=computer)))");
    }

    #[test]
    fn escapes_special_characters_in_values() {
        let f = Filter::equals("cn", "a*(b)\\c");
        insta::assert_snapshot!(f, @r"(cn=a\2a\28b\29\5cc)");
    }

    #[test]
    fn evaluates_against_entries() {
        let user = Entry::new("CN=alice").with_attr("objectClass", ["top", "person", "user"]);
        let computer =
            Entry::new("CN=ws01").with_attr("objectClass", ["top", "user", "computer"]);
        assert!(user_filter().matches(&user));
        assert!(!user_filter().matches(&computer));
        assert!(Filter::any().matches(&user));
        assert!(
            !Filter::or([Filter::object_class("group"), Filter::present("cn")]).matches(&computer)
        );
    }
}
