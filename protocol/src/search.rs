use crate::locale::Locale;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// One backend hit. The engine never looks inside; the accessors below only
/// serve presentation of the fields the backend conventionally emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult(pub Value);

impl SearchResult {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    pub fn meta(&self) -> Option<&str> {
        self.field("meta")
    }

    pub fn snippet(&self) -> Option<&str> {
        self.field("snippet")
    }

    pub fn href(&self) -> Option<&str> {
        self.field("href")
    }
}

/// Body of the search endpoint. A missing or `null` `results` field means the
/// same thing as an empty array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

impl SearchPayload {
    pub fn into_results(self) -> Vec<SearchResult> {
        self.results.unwrap_or_default()
    }
}

/// Criteria produced by an external filter editor. Passed through to the next
/// search untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(pub Map<String, Value>);

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattens the top-level entries into query parameters. Strings are sent
    /// verbatim, `null` entries are dropped, everything else is sent as JSON.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::Null => return None,
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), rendered))
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub lang: Locale,
    pub filters: Option<FilterSpec>,
}

impl SearchRequest {
    const RESERVED_PARAMS: [&'static str; 2] = ["q", "lang"];

    pub fn new(query: impl Into<String>, lang: Locale) -> Self {
        Self {
            query: query.into(),
            lang,
            filters: None,
        }
    }

    /// An empty filter object is the same as no filter.
    pub fn with_filters(mut self, filters: Option<FilterSpec>) -> Self {
        self.filters = filters.filter(|filters| !filters.is_empty());
        self
    }

    /// Query string parameters in wire order: `q`, `lang`, then filters. Filter
    /// entries cannot shadow the query or the language.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("q".to_string(), self.query.clone()),
            ("lang".to_string(), self.lang.code().to_string()),
        ];
        if let Some(filters) = &self.filters {
            pairs.extend(
                filters
                    .query_pairs()
                    .into_iter()
                    .filter(|(key, _)| !Self::RESERVED_PARAMS.contains(&key.as_str())),
            );
        }
        pairs
    }
}
