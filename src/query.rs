//! Search queries and their serialization into the GitHub search syntax.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::Result;
use crate::qualifier::{Field, FieldKind, Parameter, Qualifier};

/// Characters that force a value to be wrapped in double quotes.
const QUOTE_TRIGGERS: &[char] = &[' ', '"', '\t', '\r', '\n'];

/// Resource category searched, selecting the endpoint and browser `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Code,
    Commits,
    Issues,
    Repositories,
    Users,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Code => "code",
            SearchKind::Commits => "commits",
            SearchKind::Issues => "issues",
            SearchKind::Repositories => "repositories",
            SearchKind::Users => "users",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named qualifiers of a query, keyed by a stable internal identifier such as `"Stars"`.
#[derive(Debug, Clone, Default)]
pub struct Qualifiers(HashMap<String, Qualifier>);

impl Qualifiers {
    pub fn new() -> Self {
        Qualifiers::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, qualifier: Qualifier) -> Option<Qualifier> {
        self.0.insert(name.into(), qualifier)
    }

    pub fn get(&self, name: &str) -> Option<&Qualifier> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Qualifier> {
        self.0.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Qualifier)> {
        self.0.iter().map(|(name, q)| (name.as_str(), q))
    }

    /// Wire key to value for every qualifier that has been set.
    pub fn list_set(&self) -> BTreeMap<String, String> {
        self.0
            .values()
            .filter(|q| q.is_set())
            .map(|q| (q.key().to_string(), q.value().to_string()))
            .collect()
    }
}

impl<N: Into<String>> FromIterator<(N, Qualifier)> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = (N, Qualifier)>>(iter: I) -> Self {
        Qualifiers(iter.into_iter().map(|(n, q)| (n.into(), q)).collect())
    }
}

/// A structured search: keywords, target kind, limit, ordering and qualifiers.
#[derive(Debug, Clone)]
pub struct Query {
    pub keywords: Vec<String>,
    pub kind: SearchKind,
    pub limit: u32,
    pub order: Parameter,
    pub sort: Parameter,
    pub qualifiers: Qualifiers,
}

impl Query {
    /// An empty query for `kind` with unvalidated `order`/`sort` and no qualifiers.
    pub fn new(kind: SearchKind) -> Self {
        Query {
            keywords: Vec::new(),
            kind,
            limit: 30,
            order: Parameter::new("order", FieldKind::String, "", None),
            sort: Parameter::new("sort", FieldKind::String, "", None),
            qualifiers: Qualifiers::new(),
        }
    }

    /// The `q` value: quoted keywords followed by one `key:value` token per set qualifier.
    pub fn search_terms(&self) -> String {
        let mut q = self
            .keywords
            .iter()
            .map(|k| quote_keyword(k))
            .collect::<Vec<_>>()
            .join(" ");
        for (key, value) in self.qualifiers.list_set() {
            q.push(' ');
            q.push_str(&key);
            q.push(':');
            q.push_str(&quote_qualifier(&value));
        }
        q
    }

    /// Request URL for one page of results against `https://api.<host>/search/<kind>`.
    pub fn api_url(&self, host: &str, page: u32, per_page: u32) -> Result<Url> {
        let mut params = self.ordering_params();
        params.insert("q", self.search_terms());
        params.insert("page", page.to_string());
        params.insert("per_page", per_page.to_string());

        let base = format!("https://api.{}/search/{}", host, self.kind);
        Ok(Url::parse_with_params(&base, params)?)
    }

    /// Human-facing URL for the search UI at `https://<host>/search`.
    pub fn browser_url(&self, host: &str) -> Result<Url> {
        let mut params = self.ordering_params();
        params.insert("q", self.search_terms());
        params.insert("type", self.kind.to_string());

        let base = format!("https://{}/search", host);
        Ok(Url::parse_with_params(&base, params)?)
    }

    // Sorted by name so the encoded query string is stable.
    fn ordering_params(&self) -> BTreeMap<&str, String> {
        let mut params = BTreeMap::new();
        for p in [&self.order, &self.sort] {
            if p.is_set() {
                params.insert(p.key(), p.value().to_string());
            }
        }
        params
    }
}

/// Quotes a keyword containing whitespace or quotes.
///
/// A `field:value` keyword keeps its field prefix bare: `label:in progress`
/// becomes `label:"in progress"`.
pub fn quote_keyword(keyword: &str) -> String {
    if !keyword.contains(QUOTE_TRIGGERS) {
        return keyword.to_string();
    }
    match keyword.split_once(':') {
        Some((field, value)) => format!("{}:{}", field, quote(value)),
        None => quote(keyword),
    }
}

fn quote_qualifier(value: &str) -> String {
    if value.contains(QUOTE_TRIGGERS) {
        quote(value)
    } else {
        value.to_string()
    }
}

/// Wraps `s` in double quotes with the escapes the search backend understands.
///
/// Quotes, backslashes and the common control characters get their short
/// escapes; other ASCII controls become `\xNN`, and non-printing characters
/// beyond ASCII become `\uNNNN` or `\UNNNNNNNN`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if is_non_printing(c) => {
                if (c as u32) < 0x10000 {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                } else {
                    let _ = write!(out, "\\U{:08x}", c as u32);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// Controls, separators other than the ASCII space, and invisible format characters.
fn is_non_printing(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{a0}'
                | '\u{ad}'
                | '\u{1680}'
                | '\u{2000}'..='\u{200f}'
                | '\u{2028}'..='\u{202f}'
                | '\u{205f}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{3000}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
        )
}

/// Deserializes an explicit `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregated search results.
///
/// `items` are passed through untouched; their shape depends on the kind searched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub incomplete_results: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Map<String, Value>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_count: u64,
}

impl SearchResult {
    /// Folds one decoded page into the aggregate.
    ///
    /// Items are appended; `total_count` and `incomplete_results` take the page's values.
    pub fn absorb_page(&mut self, page: SearchResult) {
        self.incomplete_results = page.incomplete_results;
        self.total_count = page.total_count;
        self.items.extend(page.items);
    }
}
