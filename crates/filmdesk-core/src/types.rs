use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned movie identifier.
///
/// Backends in the wild hand these out as integers or as strings (UUIDs,
/// Mongo object ids), so both are accepted and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieId::Number(n) => write!(f, "{n}"),
            MovieId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl std::str::FromStr for MovieId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(n) => MovieId::Number(n),
            Err(_) => MovieId::Text(s.to_string()),
        })
    }
}

impl From<i64> for MovieId {
    fn from(n: i64) -> Self {
        MovieId::Number(n)
    }
}

impl From<&str> for MovieId {
    fn from(s: &str) -> Self {
        MovieId::Text(s.to_string())
    }
}

/// A movie record as stored by the server.
///
/// Field aliases cover the Indonesian-named backend this client was first
/// written against (`judul`, `tahun_rilis`, `sutradara`, `pemeran`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    #[serde(default, alias = "judul")]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, alias = "release_year", alias = "tahun_rilis", alias = "tahun")]
    pub release_year: i32,
    #[serde(default, alias = "sutradara")]
    pub director: String,
    #[serde(default, alias = "pemeran")]
    pub cast: Vec<String>,
}

impl Movie {
    /// The record without its server-assigned id.
    pub fn draft(&self) -> MovieDraft {
        MovieDraft {
            title: self.title.clone(),
            genre: self.genre.clone(),
            release_year: self.release_year,
            director: self.director.clone(),
            cast: self.cast.clone(),
        }
    }

    pub fn cast_display(&self) -> String {
        self.cast.join(", ")
    }
}

/// Payload for create and update. Updates are full replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDraft {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub director: String,
    pub cast: Vec<String>,
}

impl MovieDraft {
    pub fn with_id(self, id: MovieId) -> Movie {
        Movie {
            id,
            title: self.title,
            genre: self.genre,
            release_year: self.release_year,
            director: self.director,
            cast: self.cast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_id_accepts_number_and_string() {
        let n: MovieId = serde_json::from_str("7").unwrap();
        assert_eq!(n, MovieId::Number(7));
        let s: MovieId = serde_json::from_str("\"64f0c2\"").unwrap();
        assert_eq!(s, MovieId::Text("64f0c2".into()));
        assert_eq!(s.to_string(), "64f0c2");
    }

    #[test]
    fn test_movie_id_from_str() {
        assert_eq!("42".parse::<MovieId>().unwrap(), MovieId::Number(42));
        assert_eq!(" abc ".parse::<MovieId>().unwrap(), MovieId::Text("abc".into()));
    }

    #[test]
    fn test_movie_canonical_fields() {
        let json = r#"{
            "id": 1,
            "title": "Alien",
            "genre": "Horror",
            "releaseYear": 1979,
            "director": "Ridley Scott",
            "cast": ["Sigourney Weaver", "Tom Skerritt"]
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.title, "Alien");
        assert_eq!(movie.release_year, 1979);
        assert_eq!(movie.cast_display(), "Sigourney Weaver, Tom Skerritt");
    }

    #[test]
    fn test_movie_indonesian_aliases() {
        let json = r#"{
            "id": "a1",
            "judul": "Pengabdi Setan",
            "genre": "Horor",
            "tahun_rilis": 2017,
            "sutradara": "Joko Anwar",
            "pemeran": ["Tara Basro"]
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.title, "Pengabdi Setan");
        assert_eq!(movie.release_year, 2017);
        assert_eq!(movie.director, "Joko Anwar");
        assert_eq!(movie.cast, vec!["Tara Basro"]);
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let draft = MovieDraft {
            title: "Heat".into(),
            genre: "Crime".into(),
            release_year: 1995,
            director: "Michael Mann".into(),
            cast: vec!["Al Pacino".into()],
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["releaseYear"], 1995);
        assert!(v.get("id").is_none());

        let movie = draft.clone().with_id(MovieId::Number(3));
        assert_eq!(movie.draft(), draft);
    }
}
