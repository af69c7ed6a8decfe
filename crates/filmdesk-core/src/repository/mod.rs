pub mod payload;

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::gateway::{ApiResponse, Gateway};
use crate::types::{Movie, MovieDraft, MovieId};

pub use payload::{ListPayload, RecordPayload};

const MOVIES: &str = "movies";

/// Typed CRUD client for the `/movies` resource.
///
/// Holds no cache: every call is a fresh round trip.
#[derive(Clone)]
pub struct MovieRepository {
    gateway: Arc<Gateway>,
}

impl MovieRepository {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Fetch the whole collection.
    ///
    /// Accepts a bare array or a `data` envelope. Any other JSON shape is an
    /// empty list rather than an error.
    pub async fn list(&self) -> Result<Vec<Movie>, ApiError> {
        let url = self.gateway.endpoint(&[MOVIES])?;
        let response = self.gateway.get(url).await?.error_for_status()?;

        let payload = match parse_body(&response)? {
            Some(value) => ListPayload::classify(value),
            None => ListPayload::Unrecognized,
        };
        let movies = payload.into_movies();
        debug!("Fetched {} movies", movies.len());
        Ok(movies)
    }

    /// Fetch one movie.
    pub async fn get(&self, id: &MovieId) -> Result<Movie, ApiError> {
        let key = id.to_string();
        let url = self.gateway.endpoint(&[MOVIES, key.as_str()])?;
        let response = self.gateway.get(url).await?.error_for_status()?;

        parse_body(&response)?
            .map(RecordPayload::classify)
            .and_then(RecordPayload::into_movie)
            .ok_or_else(|| ApiError::Malformed(format!("no movie record in response for id {id}")))
    }

    /// Create a movie. The server assigns the id; the created record is
    /// returned when the server echoes it back.
    pub async fn create(&self, movie: &MovieDraft) -> Result<Option<Movie>, ApiError> {
        let url = self.gateway.endpoint(&[MOVIES])?;
        let response = self.gateway.post_json(url, movie).await?.error_for_status()?;
        let created = echoed_record(&response);
        match &created {
            Some(m) => info!("Created movie {} ({})", m.id, m.title),
            None => info!("Created movie {}", movie.title),
        }
        Ok(created)
    }

    /// Replace a movie. Every field is sent; there are no partial updates.
    pub async fn update(&self, id: &MovieId, movie: &MovieDraft) -> Result<Option<Movie>, ApiError> {
        let key = id.to_string();
        let url = self.gateway.endpoint(&[MOVIES, key.as_str()])?;
        let response = self.gateway.put_json(url, movie).await?.error_for_status()?;
        info!("Updated movie {}", id);
        Ok(echoed_record(&response))
    }

    pub async fn delete(&self, id: &MovieId) -> Result<(), ApiError> {
        let key = id.to_string();
        let url = self.gateway.endpoint(&[MOVIES, key.as_str()])?;
        self.gateway.delete(url).await?.error_for_status()?;
        info!("Deleted movie {}", id);
        Ok(())
    }
}

/// JSON body of a 2xx response. Blank bodies are `None`; anything that is
/// not JSON at all is a malformed response.
fn parse_body(response: &ApiResponse) -> Result<Option<serde_json::Value>, ApiError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    response
        .json::<serde_json::Value>()
        .map(Some)
        .map_err(|e| ApiError::Malformed(format!("response is not JSON: {e}")))
}

fn echoed_record(response: &ApiResponse) -> Option<Movie> {
    response
        .json_value()
        .map(RecordPayload::classify)
        .and_then(RecordPayload::into_movie)
}
