//! Row and document shapes moved through the sync pipeline.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The change boundary for a source: all rows with `modified` at or below the
/// watermark are known to be synchronized. Carries the zone offset so the
/// checkpoint file round-trips the original ISO-8601 value.
pub type Watermark = DateTime<FixedOffset>;

/// A person reference as stored in the nested index fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub name: String,
}

/// One denormalized change row produced by the change extractor.
///
/// The person-role lists are kept as the raw aggregated JSON from the join
/// query; the document processor is responsible for validating their shape.
/// A film with no related genres or persons still appears with those columns
/// NULL, which the processor turns into empty lists.
#[derive(Debug, Clone)]
pub struct FilmRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub directors: Option<Value>,
    pub actors: Option<Value>,
    pub writers: Option<Value>,
    /// For the `film_work` source this is the row's own `modified`; for
    /// related sources it is the maximum `modified` among the contributing
    /// related-table rows.
    pub modified: Watermark,
}

/// The validated, index-ready document.
///
/// Field names match the index mapping exactly; the mapping is strict, so
/// any divergence here is rejected by the index as a second line of defense.
/// Every list field is always present (possibly empty), never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDocument {
    pub id: String,
    pub imdb_rating: f64,
    pub genres: Vec<String>,
    pub title: String,
    pub description: String,
    pub directors_names: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}
