//! Data models for shelf
//!
//! Defines the catalog entry (`Item`) and the partial shapes used to create
//! and edit one (`ItemDraft`, `ItemPatch`).

use serde::{Deserialize, Deserializer, Serialize};

use crate::id::next_id;

/// Rating used when none is given, or when the given one is zero
pub const DEFAULT_RATING: i64 = 5;

/// Apply the rating default: absent or zero becomes [`DEFAULT_RATING`]
///
/// Zero is treated like "not set". A legitimate "no interest" rating of 0
/// cannot be stored.
pub fn normalize_rating(rating: Option<i64>) -> i64 {
    match rating {
        Some(r) if r != 0 => r,
        _ => DEFAULT_RATING,
    }
}

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Unique identifier, immutable after creation
    pub id: String,
    /// Category tag ("movies", "series", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-form year, empty when unknown
    #[serde(default)]
    pub year: String,
    /// Desirability rating
    #[serde(default = "default_rating", deserialize_with = "lenient_rating")]
    pub rating: i64,
    /// Embedded image data (a `data:` URL in practice)
    #[serde(default)]
    pub image: Option<String>,
}

impl Item {
    /// Build an item from a draft, assigning a fresh id
    pub fn from_draft(draft: ItemDraft) -> Self {
        Self {
            id: next_id(),
            kind: draft.kind.trim().to_string(),
            name: draft.name.trim().to_string(),
            year: draft.year.trim().to_string(),
            rating: normalize_rating(draft.rating),
            image: draft.image.filter(|i| !i.is_empty()),
        }
    }

    /// Rating as shown to the user, with the default applied
    pub fn display_rating(&self) -> i64 {
        normalize_rating(Some(self.rating))
    }

    /// Whether an image is attached
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Shallow-merge the fields present in `patch`
    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind.trim().to_string();
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(year) = patch.year {
            self.year = year.trim().to_string();
        }
        if let Some(rating) = patch.rating {
            self.rating = normalize_rating(Some(rating));
        }
        if let Some(image) = patch.image {
            self.image = image.filter(|i| !i.is_empty());
        }
    }
}

/// Fields for a new item; the id is assigned by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub kind: String,
    pub name: String,
    pub year: String,
    pub rating: Option<i64>,
    pub image: Option<String>,
}

impl ItemDraft {
    /// Create a draft with a category and a name
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    pub fn rating(mut self, rating: i64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Partial update for an existing item
///
/// `None` leaves a field untouched. For `image`, `Some(None)` removes the
/// image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
    pub rating: Option<i64>,
    pub image: Option<Option<String>>,
}

impl ItemPatch {
    /// Whether the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.name.is_none()
            && self.year.is_none()
            && self.rating.is_none()
            && self.image.is_none()
    }
}

fn default_rating() -> i64 {
    DEFAULT_RATING
}

/// Accept numbers, numeric strings and null for `rating`
///
/// Anything unusable falls back to the default instead of failing the
/// whole document.
fn lenient_rating<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let rating = match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    };
    Ok(rating.unwrap_or(DEFAULT_RATING))
}
