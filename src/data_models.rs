use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category label used for accounting when a link carries no `type`.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Links grouped by category, in the order the backend listed the categories.
pub type MergedByType = IndexMap<String, Vec<LinkEntry>>;

/// Typed view over the backend payload, used to walk and rebuild the two
/// link containers. The raw JSON stays authoritative for everything else:
/// `code`, `message` and unknown top-level keys are never re-serialized
/// from this struct.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
}

impl SearchResponse {
    pub fn from_upstream(raw: &Value) -> Result<SearchResponse, serde_json::Error> {
        SearchResponse::deserialize(raw)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_by_type: Option<MergedByType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchData {
    pub fn results(&self) -> &[ResultItem] {
        self.results.as_deref().unwrap_or_default()
    }

    pub fn merged_by_type(&self) -> Option<&MergedByType> {
        self.merged_by_type.as_ref()
    }
}

/// A single link. `url` is optional on the wire so that a missing URL can be
/// reported as a shape violation instead of failing the whole decode.
/// The category (`type`) stays in `extra` so it round-trips as received.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LinkEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkEntry {
    pub fn new(url: impl Into<String>, category: Option<&str>) -> LinkEntry {
        let mut extra = Map::new();
        if let Some(category) = category {
            extra.insert("type".to_string(), Value::from(category));
        }
        LinkEntry {
            url: Some(url.into()),
            extra,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.extra.get("type").and_then(Value::as_str)
    }

    /// Category for accounting; falls back to [`UNKNOWN_CATEGORY`].
    pub fn category_or_unknown(&self) -> &str {
        self.category().unwrap_or(UNKNOWN_CATEGORY)
    }
}

/// A message/post record. Everything except `links` is opaque to the filter
/// and lives in `fields`, so unknown keys survive untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResultItem {
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultItem {
    pub fn message_id(&self) -> Option<&str> {
        self.fields.get("message_id").and_then(Value::as_str)
    }
}

/// Query forwarded to the backend on `GET /api/search`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchQuery {
    #[serde(default)]
    pub kw: String,
    #[serde(default = "default_res")]
    pub res: String,
    #[serde(default)]
    pub src: String,
}

fn default_res() -> String {
    "merge".to_string()
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            kw: String::new(),
            res: default_res(),
            src: String::new(),
        }
    }
}

/// Body sent to the link validator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub links: Vec<String>,
    pub selected_platforms: Vec<String>,
}

/// Body returned by the link validator.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CheckResponse {
    #[serde(default)]
    pub valid_links: Vec<String>,
}
