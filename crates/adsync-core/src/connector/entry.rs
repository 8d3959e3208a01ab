// ── Directory entry ──
//
// A search result: the entry's distinguished name plus its attributes.
// Attribute names are matched case-insensitively, as the directory does.
// Binary-syntax attributes (`objectSid`, `objectGUID`) are kept apart from
// text attributes so their bytes are never forced through UTF-8.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AttributeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub dn: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bin_attrs: BTreeMap<String, Vec<Vec<u8>>>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            ..Self::default()
        }
    }

    /// Build an entry from the attribute set of a create request.
    pub fn from_attributes(dn: impl Into<String>, attributes: &AttributeMap) -> Self {
        let attrs = attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone().into_values()))
            .collect();
        Self {
            dn: dn.into(),
            attrs,
            bin_attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attrs
            .insert(name.to_owned(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_binary(mut self, name: &str, value: Vec<u8>) -> Self {
        self.bin_attrs.insert(name.to_owned(), vec![value]);
        self
    }

    fn key<'a, T>(map: &'a BTreeMap<String, T>, name: &str) -> Option<&'a T> {
        map.get(name).or_else(|| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// All text values of `name`; empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        Self::key(&self.attrs, name).map_or(&[], Vec::as_slice)
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// First value of `name` parsed as `T`. `None` when absent; `Some(Err)`
    /// when present but malformed.
    pub fn parse_first<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.first(name).map(|v| v.trim().parse())
    }

    pub fn binary(&self, name: &str) -> Option<&[u8]> {
        Self::key(&self.bin_attrs, name)
            .and_then(|vs| vs.first())
            .map(Vec::as_slice)
    }

    pub fn has(&self, name: &str) -> bool {
        !self.values(name).is_empty() || self.binary(name).is_some()
    }

    /// Whether any value of `name` equals `value`, ignoring ASCII case.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.values(name)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value))
    }

    /// A copy restricted to the requested attributes; empty means all.
    pub fn project(&self, attributes: &[&str]) -> Self {
        if attributes.is_empty() {
            return self.clone();
        }
        let wanted = |name: &String| attributes.iter().any(|a| a.eq_ignore_ascii_case(name));
        Self {
            dn: self.dn.clone(),
            attrs: self
                .attrs
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            bin_attrs: self
                .bin_attrs
                .iter()
                .filter(|(k, _)| wanted(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::connector::AttributeValue;

    #[test]
    fn lookups_ignore_attribute_case() {
        let entry = Entry::new("CN=alice,CN=Users,DC=example,DC=com")
            .with_attr("sAMAccountName", ["alice"])
            .with_binary("objectSid", vec![1, 0]);
        assert_eq!(entry.first("samaccountname"), Some("alice"));
        assert_eq!(entry.binary("OBJECTSID"), Some(&[1_u8, 0][..]));
        assert!(entry.values("mail").is_empty());
        assert!(!entry.has("mail"));
    }

    #[test]
    fn parse_first_distinguishes_absent_from_malformed() {
        let entry = Entry::new("CN=x").with_attr("uidNumber", ["abc"]);
        assert!(entry.parse_first::<u32>("gidNumber").is_none());
        assert!(entry.parse_first::<u32>("uidNumber").unwrap().is_err());
    }

    #[test]
    fn project_keeps_only_requested_attributes() {
        let entry = Entry::new("CN=g")
            .with_attr("cn", ["g"])
            .with_attr("member", ["CN=a", "CN=b"]);
        let projected = entry.project(&["Member"]);
        assert_eq!(projected.values("member").len(), 2);
        assert!(projected.first("cn").is_none());
        assert_eq!(entry.project(&[]), entry);
    }

    #[test]
    fn from_attributes_flattens_values() {
        let mut attrs = AttributeMap::new();
        attrs.insert("cn".into(), AttributeValue::from("alice"));
        attrs.insert(
            "objectClass".into(),
            AttributeValue::from(vec!["top".to_owned(), "user".to_owned()]),
        );
        let entry = Entry::from_attributes("CN=alice", &attrs);
        assert!(entry.has_value("objectclass", "USER"));
        assert_eq!(entry.first("cn"), Some("alice"));
    }
}
