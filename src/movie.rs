use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::collection::Keyed;
use crate::errors::BackendError;
use crate::label::Bands;
use crate::{dates, ids, normalization};

/// Movie IDs are millisecond timestamps unless the client supplies one.
pub type MovieId = i64;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// How strongly a movie is recommended, derived from its rating.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, PartialOrd, Ord, Serialize)]
pub enum Recommendation {
    Skip,
    Mediocre,
    #[serde(rename = "Worth Watching")]
    WorthWatching,
    #[serde(rename = "Highly Recommended")]
    HighlyRecommended,
    #[serde(rename = "Must Watch")]
    MustWatch,
}

pub static RECOMMENDATIONS: Bands<Recommendation> = Bands::new(
    &[
        (9.0, Recommendation::MustWatch),
        (7.5, Recommendation::HighlyRecommended),
        (6.0, Recommendation::WorthWatching),
        (4.0, Recommendation::Mediocre),
    ],
    Recommendation::Skip,
);

impl Recommendation {
    pub fn for_rating(rating: f64) -> Self {
        RECOMMENDATIONS.classify(rating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::MustWatch => "Must Watch",
            Recommendation::HighlyRecommended => "Highly Recommended",
            Recommendation::WorthWatching => "Worth Watching",
            Recommendation::Mediocre => "Mediocre",
            Recommendation::Skip => "Skip",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RECOMMENDATIONS
            .iter()
            .map(|(_, label)| label)
            .find(|label| label.as_str() == s)
            .ok_or_else(|| BackendError::invalid_field("recommendation", s))
    }
}

/// A single rated movie.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    id: MovieId,

    title: String,

    genre: String,

    /// Between `MIN_RATING` and `MAX_RATING` inclusive.
    rating: f64,

    /// The day the movie was first recorded, as `YYYY-MM-DD`.
    date_added: String,

    /// Always `Recommendation::for_rating(rating)`.
    recommendation: Recommendation,
}

impl Movie {
    pub fn new(id: MovieId, title: String, genre: String, rating: f64, date_added: String) -> Self {
        Movie {
            id,
            title,
            genre,
            rating,
            date_added,
            recommendation: Recommendation::for_rating(rating),
        }
    }

    pub fn id(&self) -> MovieId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn date_added(&self) -> &str {
        &self.date_added
    }

    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    /// Changes the rating and recomputes the recommendation.
    pub fn set_rating(&mut self, rating: f64) {
        self.rating = rating;
        self.recommendation = Recommendation::for_rating(rating);
    }

    pub fn set_date_added(&mut self, date_added: impl Into<String>) {
        self.date_added = date_added.into();
    }
}

impl Keyed for Movie {
    type Key = MovieId;

    fn key(&self) -> &MovieId {
        &self.id
    }
}

/// A movie as submitted through the form. Every field is optional
/// here so that missing ones produce a precise error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieSubmission {
    #[serde(default, deserialize_with = "normalization::deserialize_id")]
    pub(crate) id: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) title: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) genre: Option<String>,

    #[serde(default)]
    pub(crate) rating: Option<f64>,
}

impl MovieSubmission {
    /// Validates the submission, assigning an ID and today's date.
    pub fn into_movie(self) -> Result<Movie, BackendError> {
        let title = self.title.ok_or(BackendError::MissingField("title"))?;
        let genre = self.genre.ok_or(BackendError::MissingField("genre"))?;
        let rating = validate_rating(self.rating)?;

        let id = match self.id {
            Some(raw) => parse_movie_id(&raw)?,
            None => ids::next_id(),
        };

        Ok(Movie::new(id, title, genre, rating, dates::today()))
    }
}

/// The body of a rating update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RatingUpdate {
    #[serde(default)]
    pub(crate) rating: Option<f64>,
}

impl RatingUpdate {
    pub fn validate(self) -> Result<f64, BackendError> {
        validate_rating(self.rating)
    }
}

pub fn validate_rating(rating: Option<f64>) -> Result<f64, BackendError> {
    let rating = rating.ok_or(BackendError::MissingField("rating"))?;

    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(BackendError::invalid_field(
            "rating",
            format!("{} is not between {} and {}", rating, MIN_RATING, MAX_RATING),
        ))
    }
}

pub fn parse_movie_id(raw: &str) -> Result<MovieId, BackendError> {
    raw.trim()
        .parse()
        .map_err(|_| BackendError::InvalidId(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn recommendation_table() {
        assert!(RECOMMENDATIONS.is_well_formed());

        let cases = [
            (10.0, Recommendation::MustWatch),
            (9.0, Recommendation::MustWatch),
            (8.9, Recommendation::HighlyRecommended),
            (7.5, Recommendation::HighlyRecommended),
            (7.4, Recommendation::WorthWatching),
            (6.0, Recommendation::WorthWatching),
            (5.99, Recommendation::Mediocre),
            (4.0, Recommendation::Mediocre),
            (3.9, Recommendation::Skip),
            (0.0, Recommendation::Skip),
        ];

        for (rating, expected) in cases.iter() {
            assert_eq!(Recommendation::for_rating(*rating), *expected, "rating {}", rating);
        }
    }

    #[test]
    fn recommendations_serialize_as_labels() {
        let json = serde_json::to_string(&Recommendation::HighlyRecommended).unwrap();

        assert_eq!(json, "\"Highly Recommended\"");
        assert_eq!(
            "Must Watch".parse::<Recommendation>().unwrap(),
            Recommendation::MustWatch
        );
        assert!("Meh".parse::<Recommendation>().is_err());
    }

    #[test]
    fn movies_serialize_in_camel_case() {
        let movie = Movie::new(7, "Heat".into(), "Crime".into(), 8.3, "2024-01-02".into());
        let value = serde_json::to_value(&movie).unwrap();

        assert_eq!(value["dateAdded"], "2024-01-02");
        assert_eq!(value["recommendation"], "Highly Recommended");
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn rating_changes_recompute_the_label() {
        let mut movie = Movie::new(1, "Cats".into(), "Musical".into(), 9.5, "2024-01-02".into());

        movie.set_rating(2.0);

        assert_eq!(movie.rating(), 2.0);
        assert_eq!(movie.recommendation(), Recommendation::Skip);
    }

    #[test]
    fn submissions_are_validated() {
        let submission = |json: &str| -> Result<Movie, BackendError> {
            serde_json::from_str::<MovieSubmission>(json)
                .expect("parse submission")
                .into_movie()
        };

        let movie = submission(r#"{"title": " Alien ", "genre": "Horror", "rating": 8.5}"#)
            .expect("valid submission");
        assert_eq!(movie.title(), "Alien");
        assert_eq!(movie.recommendation(), Recommendation::HighlyRecommended);

        let movie = submission(r#"{"id": "42", "title": "Up", "genre": "Family", "rating": 7}"#)
            .expect("valid submission with ID");
        assert_eq!(movie.id(), 42);

        assert!(matches!(
            submission(r#"{"genre": "Horror", "rating": 8.5}"#),
            Err(BackendError::MissingField("title"))
        ));
        assert!(matches!(
            submission(r#"{"title": "Alien", "genre": " ", "rating": 8.5}"#),
            Err(BackendError::MissingField("genre"))
        ));
        assert!(matches!(
            submission(r#"{"title": "Alien", "genre": "Horror", "rating": 11}"#),
            Err(BackendError::InvalidField { field: "rating", .. })
        ));
        assert!(matches!(
            submission(r#"{"title": "Alien", "genre": "Horror"}"#),
            Err(BackendError::MissingField("rating"))
        ));
        assert!(matches!(
            submission(r#"{"id": "abc", "title": "Alien", "genre": "Horror", "rating": 1}"#),
            Err(BackendError::InvalidId(_))
        ));
    }

    proptest! {
        #[test]
        fn label_always_matches_rating(initial in 0.0f64..=10.0, updated in 0.0f64..=10.0) {
            let mut movie = Movie::new(1, "T".into(), "G".into(), initial, "2024-01-01".into());
            prop_assert_eq!(movie.recommendation(), RECOMMENDATIONS.classify(initial));

            movie.set_rating(updated);
            prop_assert_eq!(movie.recommendation(), RECOMMENDATIONS.classify(updated));
        }
    }
}
