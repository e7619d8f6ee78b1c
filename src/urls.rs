use url::Url;

use crate::errors::BackendError;
use crate::movie::MovieId;

/// Convenience wrapper for URL generation functions.
#[derive(Clone, Debug)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,
}

impl Urls {
    pub fn new(base: impl AsRef<str>) -> Result<Self, BackendError> {
        let base = Url::parse(base.as_ref())
            .map_err(|source| BackendError::FailedToGenerateUrl { source })?;

        Ok(Urls { base })
    }

    pub fn movies(&self) -> Result<Url, BackendError> {
        self.base
            .join("api/movies/")
            .map_err(|source| BackendError::FailedToGenerateUrl { source })
    }

    pub fn movie(&self, id: MovieId) -> Result<Url, BackendError> {
        self.movies()?
            .join(&id.to_string())
            .map_err(|source| BackendError::FailedToGenerateUrl { source })
    }
}

#[cfg(test)]
mod tests {
    use super::Urls;

    #[test]
    fn movie_urls_sit_under_the_base() {
        let urls = Urls::new("https://www.example.com/tracker/").expect("parse base URL");

        assert_eq!(
            urls.movie(1700000000000).unwrap().as_str(),
            "https://www.example.com/tracker/api/movies/1700000000000"
        );
    }

    #[test]
    fn bad_base_urls_are_rejected() {
        assert!(Urls::new("not a url").is_err());
    }
}
