//! Document processing: raw change rows into validated search documents.
//!
//! A pure transformation with no I/O. Absent genre and person lists become
//! empty lists, the name-only projections are derived from the structured
//! person lists, and required scalar fields are checked before a row is
//! admitted into the batch.

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::SyncError;
use movies_etl_shared::{FilmDocument, FilmRow, PersonRef, Watermark};

/// What to do when a row fails validation.
///
/// The default is `Lenient`: the offending row is logged with its field and
/// skipped, the rest of the batch continues. `Strict` aborts the whole batch
/// on the first invalid row, before anything is appended for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    Strict,
    #[default]
    Lenient,
}

/// A document paired with the `modified` watermark of its originating row,
/// so the loader can advance the checkpoint as acknowledgements arrive.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub document: FilmDocument,
    pub modified: Watermark,
}

/// Processor that transforms raw film rows into index-ready documents.
pub struct DocumentProcessor {
    policy: ValidationPolicy,
}

impl DocumentProcessor {
    /// Create a processor with the given validation policy.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Transform a batch of rows, preserving extraction order.
    pub fn process_batch(&self, rows: Vec<FilmRow>) -> Result<Vec<IndexEntry>, SyncError> {
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows {
            match self.process_row(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => match self.policy {
                    ValidationPolicy::Strict => return Err(e),
                    ValidationPolicy::Lenient => {
                        warn!(error = %e, "Skipping invalid row");
                    }
                },
            }
        }

        debug!(count = entries.len(), "Processed row batch");
        Ok(entries)
    }

    /// Transform a single row into an index entry.
    pub fn process_row(&self, row: FilmRow) -> Result<IndexEntry, SyncError> {
        let id = row.id.to_string();

        let description = row
            .description
            .ok_or_else(|| SyncError::validation(&id, "description", "a string"))?;
        let imdb_rating = row
            .rating
            .ok_or_else(|| SyncError::validation(&id, "imdb_rating", "a float"))?;

        let directors = parse_people(&id, "directors", row.directors.as_ref())?;
        let actors = parse_people(&id, "actors", row.actors.as_ref())?;
        let writers = parse_people(&id, "writers", row.writers.as_ref())?;

        let document = FilmDocument {
            directors_names: names_of(&directors),
            actors_names: names_of(&actors),
            writers_names: names_of(&writers),
            id,
            imdb_rating,
            genres: row.genres.unwrap_or_default(),
            title: row.title,
            description,
            directors,
            actors,
            writers,
        };

        validate(&document)?;

        Ok(IndexEntry {
            document,
            modified: row.modified,
        })
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(ValidationPolicy::default())
    }
}

/// Check the scalar invariants of an assembled document.
///
/// Re-validating a document the processor produced is a no-op; this also
/// guards documents built through other paths before they reach the index.
pub fn validate(document: &FilmDocument) -> Result<(), SyncError> {
    if document.id.trim().is_empty() {
        return Err(SyncError::validation(
            &document.id,
            "id",
            "a non-empty string",
        ));
    }
    if document.title.trim().is_empty() {
        return Err(SyncError::validation(
            &document.id,
            "title",
            "a non-empty string",
        ));
    }
    if !document.imdb_rating.is_finite() {
        return Err(SyncError::validation(
            &document.id,
            "imdb_rating",
            "a float",
        ));
    }
    Ok(())
}

/// Parse an aggregated person-role JSON list into `PersonRef`s.
///
/// A film with no persons in a role arrives as NULL; that becomes an empty
/// list, never an absent field.
fn parse_people(
    document_id: &str,
    field: &'static str,
    value: Option<&Value>,
) -> Result<Vec<PersonRef>, SyncError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| SyncError::validation(document_id, field, "a list of {id, name} objects")),
    }
}

fn names_of(people: &[PersonRef]) -> Vec<String> {
    people.iter().map(|p| p.name.clone()).collect()
}
