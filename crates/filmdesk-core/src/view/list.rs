use crate::types::Movie;

/// The four mutually exclusive states of the movie list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListView {
    #[default]
    Loading,
    Populated(Vec<Movie>),
    Empty,
    Error(String),
}

impl ListView {
    /// State after a fetch finished with `movies`.
    pub fn loaded(movies: Vec<Movie>) -> Self {
        if movies.is_empty() {
            ListView::Empty
        } else {
            ListView::Populated(movies)
        }
    }

    pub fn movies(&self) -> &[Movie] {
        match self {
            ListView::Populated(movies) => movies,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListView::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovieId;

    #[test]
    fn test_loaded_picks_empty_or_populated() {
        assert_eq!(ListView::loaded(Vec::new()), ListView::Empty);

        let movie = Movie {
            id: MovieId::Number(1),
            title: "Up".into(),
            genre: "Animation".into(),
            release_year: 2009,
            director: "Pete Docter".into(),
            cast: vec!["Ed Asner".into()],
        };
        let view = ListView::loaded(vec![movie.clone()]);
        assert_eq!(view.movies(), &[movie]);
        assert!(!view.is_loading());
        assert!(ListView::default().is_loading());
    }
}
