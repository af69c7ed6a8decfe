//! Shape detection for the loosely specified movie payloads.
//!
//! The backend family this client talks to answers either with the data
//! itself or with the data wrapped in `{ "data": ... }`. Each shape is a
//! variant here, tried in declaration order.

use serde_json::Value;
use tracing::warn;

use crate::types::Movie;

/// A list response, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPayload {
    /// `[ {...}, ... ]`
    Direct(Vec<Value>),
    /// `{ "data": [ {...}, ... ] }`
    Envelope(Vec<Value>),
    /// Anything else: `{}`, `null`, a string, `{ "data": 3 }`.
    Unrecognized,
}

impl ListPayload {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => ListPayload::Direct(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => ListPayload::Envelope(items),
                _ => ListPayload::Unrecognized,
            },
            _ => ListPayload::Unrecognized,
        }
    }

    /// Decode the items. Unrecognized payloads become an empty list and
    /// entries that are not movie records are dropped.
    pub fn into_movies(self) -> Vec<Movie> {
        let items = match self {
            ListPayload::Direct(items) | ListPayload::Envelope(items) => items,
            ListPayload::Unrecognized => {
                // Keeps the front end usable against odd backends, but it can
                // also hide a broken endpoint, hence the log line.
                warn!("Unrecognized movie list payload; showing an empty list");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Movie>(item) {
                Ok(movie) => Some(movie),
                Err(e) => {
                    warn!("Skipping malformed movie entry: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// A single-record response, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    /// `{ "id": ..., "title": ... }`
    Direct(Movie),
    /// `{ "data": { "id": ..., ... } }`
    Envelope(Movie),
    /// No movie record in either position.
    Missing,
}

impl RecordPayload {
    pub fn classify(value: Value) -> Self {
        if let Some(inner) = value.get("data").filter(|v| v.is_object()) {
            if let Ok(movie) = serde_json::from_value::<Movie>(inner.clone()) {
                return RecordPayload::Envelope(movie);
            }
        }
        if value.is_object() {
            if let Ok(movie) = serde_json::from_value::<Movie>(value) {
                return RecordPayload::Direct(movie);
            }
        }
        RecordPayload::Missing
    }

    pub fn into_movie(self) -> Option<Movie> {
        match self {
            RecordPayload::Direct(movie) | RecordPayload::Envelope(movie) => Some(movie),
            RecordPayload::Missing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 1,
            "title": "Alien",
            "genre": "Horror",
            "releaseYear": 1979,
            "director": "Ridley Scott",
            "cast": ["Sigourney Weaver"]
        })
    }

    #[test]
    fn test_direct_and_envelope_decode_identically() {
        let direct = ListPayload::classify(json!([sample()]));
        let envelope = ListPayload::classify(json!({ "data": [sample()] }));
        assert!(matches!(direct, ListPayload::Direct(_)));
        assert!(matches!(envelope, ListPayload::Envelope(_)));
        assert_eq!(direct.into_movies(), envelope.into_movies());
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        for value in [json!({}), Value::Null, json!("movies"), json!({ "data": 5 }), json!(12)] {
            let payload = ListPayload::classify(value);
            assert_eq!(payload, ListPayload::Unrecognized);
            assert!(payload.into_movies().is_empty());
        }
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let payload = ListPayload::classify(json!([sample(), { "title": "no id" }, 3]));
        let movies = payload.into_movies();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Alien");
    }

    #[test]
    fn test_record_shapes() {
        assert!(matches!(RecordPayload::classify(sample()), RecordPayload::Direct(_)));
        assert!(matches!(
            RecordPayload::classify(json!({ "data": sample() })),
            RecordPayload::Envelope(_)
        ));
        assert_eq!(RecordPayload::classify(json!({ "ok": true })), RecordPayload::Missing);
        assert_eq!(RecordPayload::classify(json!([sample()])), RecordPayload::Missing);
    }
}
