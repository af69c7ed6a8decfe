use crate::error::ValidationError;
use crate::types::{Movie, MovieDraft, MovieId};
use crate::util::split_list;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2030;

/// Whether submitting the form creates a record or replaces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(MovieId),
}

/// The add/edit form, holding raw user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieForm {
    mode: FormMode,
    pub title: String,
    pub genre: String,
    pub year: String,
    pub director: String,
    /// Comma-separated names.
    pub cast: String,
}

impl MovieForm {
    /// Empty form for a new movie.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            genre: String::new(),
            year: String::new(),
            director: String::new(),
            cast: String::new(),
        }
    }

    /// Form prefilled from an existing record; the id rides along.
    pub fn edit(movie: &Movie) -> Self {
        Self {
            mode: FormMode::Edit(movie.id.clone()),
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            year: movie.release_year.to_string(),
            director: movie.director.clone(),
            cast: movie.cast_display(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Check the input and build the payload to send.
    pub fn validate(&self) -> Result<MovieDraft, ValidationError> {
        let title = required(&self.title, "Title")?;
        let genre = required(&self.genre, "Genre")?;
        let year = required(&self.year, "Release year")?;
        let director = required(&self.director, "Director")?;
        required(&self.cast, "Cast")?;

        let release_year = parse_year(year)?;
        let cast = parse_cast(&self.cast);
        if cast.is_empty() {
            return Err(ValidationError::EmptyCast);
        }

        Ok(MovieDraft {
            title: title.to_string(),
            genre: genre.to_string(),
            release_year,
            director: director.to_string(),
            cast,
        })
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Parse a release year and check it lies in [`MIN_YEAR`, `MAX_YEAR`].
pub fn parse_year(raw: &str) -> Result<i32, ValidationError> {
    let raw = raw.trim();
    let year: i32 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidYear(raw.to_string()))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange {
            year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        });
    }
    Ok(year)
}

/// Split the cast field on commas, dropping blank names.
pub fn parse_cast(raw: &str) -> Vec<String> {
    split_list(raw)
}
