// ── Distinguished names ──
//
// String helpers for RFC 4514 distinguished names and RFC 4515 filter
// values. Parsing is escape-aware but deliberately shallow: only what
// path building and member resolution need.

/// Escape an attribute value for use inside an RDN (RFC 4514 §2.4).
pub fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len() + 4);
    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            '\0' => out.push_str("\\00"),
            ' ' if i == 0 || i == last => out.push_str("\\20"),
            '#' if i == 0 => out.push_str("\\23"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an assertion value for use inside a search filter (RFC 4515 §3).
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\5c"),
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\0' => out.push_str("\\00"),
            _ => out.push(ch),
        }
    }
    out
}

/// `DC=example,DC=com` → `example.com`. Non-`DC` components are ignored.
pub fn domain_from_root(root: &str) -> String {
    split_rdns(root)
        .into_iter()
        .filter_map(|rdn| {
            let (attr, value) = rdn.split_once('=')?;
            attr.trim()
                .eq_ignore_ascii_case("DC")
                .then(|| value.trim().to_owned())
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a DN into its RDNs at unescaped commas. Each RDN is trimmed.
pub fn split_rdns(dn: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, ch) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            ',' => {
                out.push(dn[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = dn[start..].trim();
    if !tail.is_empty() || !out.is_empty() {
        out.push(tail);
    }
    out.retain(|rdn| !rdn.is_empty());
    out
}

/// The value of the leading RDN, still escaped.
pub fn rdn_value(dn: &str) -> Option<&str> {
    let first = split_rdns(dn).into_iter().next()?;
    first.split_once('=').map(|(_, v)| v.trim())
}

/// The DN with its leading RDN removed. `None` for a single-RDN name.
pub fn parent_dn(dn: &str) -> Option<String> {
    let rdns = split_rdns(dn);
    (rdns.len() > 1).then(|| rdns[1..].join(","))
}

/// Canonical comparison form: RDNs trimmed, whitespace around `=` removed,
/// ASCII-lowercased.
pub fn normalize_dn(dn: &str) -> String {
    split_rdns(dn)
        .into_iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((attr, value)) => format!("{}={}", attr.trim(), value.trim()),
            None => rdn.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(",")
        .to_ascii_lowercase()
}

/// `<attr>=<escaped value>,<parent>`.
pub fn child_dn(attribute: &str, value: &str, parent: &str) -> String {
    format!("{attribute}={},{parent}", escape_dn_value(value))
}
