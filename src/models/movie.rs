use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A search hit decorated with extended detail.
///
/// `rating`, `genres`, `runtime` and `tagline` are `None` when the per-movie
/// detail fetch failed; the rest comes from the search hit itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub runtime: Option<i32>,
    pub tagline: Option<String>,
}

impl MovieSummary {
    #[must_use]
    pub const fn is_enriched(&self) -> bool {
        self.rating.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Video {
    #[must_use]
    pub fn is_youtube_trailer(&self) -> bool {
        self.kind.as_deref() == Some("Trailer") && self.site.as_deref() == Some("YouTube")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Full provider detail for one movie, passed through untouched apart from
/// the decorations below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailers: Option<Vec<Video>>,

    /// Every other provider field (title, credits, images, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieDetail {
    /// A passed-through provider field, e.g. `"overview"` or `"runtime"`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key).filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(Value::as_str)
    }
}
