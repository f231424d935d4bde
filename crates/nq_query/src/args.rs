use nq_core::normalize_url;
use serde::{Deserialize, Deserializer};

pub const MAX_LIMIT: usize = 50;

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept `"url"`, `["a", "b"]` or null; normalize, drop blanks and duplicates, keep order.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(url)) => vec![url],
        Some(OneOrMany::Many(urls)) => urls,
    };

    let mut urls: Vec<String> = Vec::with_capacity(raw.len());
    for url in raw {
        let url = normalize_url(&url);
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }
    Ok(urls)
}

/// Arguments of the URL-driven commands.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UrlArgs {
    #[serde(default, alias = "url", deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Arguments of the filter-driven commands.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterArgs {
    #[serde(default, alias = "topic", alias = "query")]
    pub filter: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FilterArgs {
    pub fn filter(&self) -> Option<&str> {
        let filter = self.filter.trim();
        (!filter.is_empty()).then_some(filter)
    }
}

/// Arguments of `get_top_entities`; `urls` optionally scopes the aggregate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityArgs {
    #[serde(default, alias = "url", deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl EntityArgs {
    pub fn scope(&self) -> Option<&[String]> {
        (!self.urls.is_empty()).then_some(self.urls.as_slice())
    }
}

/// Requested limit, or `default`, clamped to `1..=MAX_LIMIT`.
pub fn effective_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}
