//! Logical change sources tracked by the sync pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical source of changes, each backed by exactly one relational table.
///
/// `FilmWork` is the root aggregate; `Genre` and `Person` changes are
/// resolved back to the film works they contribute to before indexing.
/// Binding the query shape to an enum variant (rather than a table-name
/// string) means an unrecognized source cannot fall through at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    FilmWork,
    Genre,
    Person,
}

impl Source {
    /// All sources, in the fixed rotation order the orchestrator runs them.
    pub const ALL: [Source; 3] = [Source::FilmWork, Source::Genre, Source::Person];

    /// The source's table name (unqualified, under the `content` schema).
    pub fn table(&self) -> &'static str {
        match self {
            Source::FilmWork => "film_work",
            Source::Genre => "genre",
            Source::Person => "person",
        }
    }

    /// Whether this source is the root aggregate itself.
    pub fn is_root(&self) -> bool {
        matches!(self, Source::FilmWork)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
