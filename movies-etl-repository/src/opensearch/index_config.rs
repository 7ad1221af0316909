//! Film index configuration: settings, analyzer, and mappings.
//!
//! The schema is fixed and versionless. Free-text fields share one bilingual
//! `ru_en` analyzer (lowercase, English stop/stem/possessive-stem, Russian
//! stop/stem); mapping mode is strict, so documents carrying fields outside
//! this schema are rejected by the index itself, independent of the
//! validation done by the document processor.

use serde_json::{json, Value};

/// Default name of the film search index.
pub const DEFAULT_INDEX_NAME: &str = "movies";

/// Configuration for the film search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Name of the index documents are written to.
    pub name: String,
}

impl IndexConfig {
    /// Create a config for the given index name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// The settings and mappings body used when creating the film index.
pub fn index_body() -> Value {
    json!({
        "settings": {
            "refresh_interval": "1s",
            "analysis": {
                "filter": {
                    "english_stop": {
                        "type": "stop",
                        "stopwords": "_english_"
                    },
                    "english_stemmer": {
                        "type": "stemmer",
                        "language": "english"
                    },
                    "english_possessive_stemmer": {
                        "type": "stemmer",
                        "language": "possessive_english"
                    },
                    "russian_stop": {
                        "type": "stop",
                        "stopwords": "_russian_"
                    },
                    "russian_stemmer": {
                        "type": "stemmer",
                        "language": "russian"
                    }
                },
                "analyzer": {
                    "ru_en": {
                        "tokenizer": "standard",
                        "filter": [
                            "lowercase",
                            "english_stop",
                            "english_stemmer",
                            "english_possessive_stemmer",
                            "russian_stop",
                            "russian_stemmer"
                        ]
                    }
                }
            }
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": {"type": "keyword"},
                "imdb_rating": {"type": "float"},
                "genres": {"type": "keyword"},
                "title": {
                    "type": "text",
                    "analyzer": "ru_en",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "description": {
                    "type": "text",
                    "analyzer": "ru_en"
                },
                "directors_names": {
                    "type": "text",
                    "analyzer": "ru_en"
                },
                "actors_names": {
                    "type": "text",
                    "analyzer": "ru_en"
                },
                "writers_names": {
                    "type": "text",
                    "analyzer": "ru_en"
                },
                "directors": nested_person_mapping(),
                "actors": nested_person_mapping(),
                "writers": nested_person_mapping()
            }
        }
    })
}

/// Mapping shared by the three nested person-role fields.
fn nested_person_mapping() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": {
                "type": "keyword"
            },
            "name": {
                "type": "text",
                "analyzer": "ru_en"
            }
        }
    })
}
