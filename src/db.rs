use futures::future::BoxFuture;

use crate::assignment::Assignment;
use crate::collection::Upserted;
use crate::errors::BackendError;
use crate::movie::{Movie, MovieId};
use crate::user::{Credentials, Owner};

mod memory;

pub use self::memory::MemoryDb;
pub use self::postgres::*;

/// Storage for accounts and the records each owner keeps.
pub trait Db {
    /// Checks that the storage is reachable.
    fn ping(&self) -> BoxFuture<Result<(), BackendError>>;

    fn create_user(
        &self,
        username: &str,
        credentials: Credentials,
    ) -> BoxFuture<Result<(), BackendError>>;

    fn retrieve_credentials(
        &self,
        username: &str,
    ) -> BoxFuture<Result<Option<Credentials>, BackendError>>;

    fn list_movies(&self, owner: &Owner) -> BoxFuture<Result<Vec<Movie>, BackendError>>;

    /// Saves `movie`, replacing any movie with the same ID. A replaced
    /// movie keeps its original `date_added`.
    fn upsert_movie(
        &self,
        owner: &Owner,
        movie: Movie,
    ) -> BoxFuture<Result<(Movie, Upserted), BackendError>>;

    /// Changes a movie's rating and recommendation together.
    fn update_rating(
        &self,
        owner: &Owner,
        id: MovieId,
        rating: f64,
    ) -> BoxFuture<Result<Movie, BackendError>>;

    fn delete_movie(&self, owner: &Owner, id: MovieId) -> BoxFuture<Result<Movie, BackendError>>;

    fn list_assignments(&self, owner: &Owner)
        -> BoxFuture<Result<Vec<Assignment>, BackendError>>;

    fn upsert_assignment(
        &self,
        owner: &Owner,
        assignment: Assignment,
    ) -> BoxFuture<Result<Upserted, BackendError>>;

    fn delete_assignment(
        &self,
        owner: &Owner,
        id: &str,
    ) -> BoxFuture<Result<Assignment, BackendError>>;
}

mod postgres {
    use std::time::Duration;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };

    use crate::assignment::Assignment;
    use crate::collection::Upserted;
    use crate::errors::BackendError;
    use crate::movie::{Movie, MovieId, Recommendation};
    use crate::user::{Credentials, Owner};
    use log::{info, warn, Logger};

    const USERS_PRIMARY_KEY_CONSTRAINT: &str = "users_pkey";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    /// Connects to the database, retrying with a fixed delay between
    /// attempts.
    pub async fn connect_with_retry(
        logger: &Logger,
        connection_string: &str,
        attempts: u32,
        delay: Duration,
    ) -> Result<PgPool, BackendError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;

        loop {
            match PgPool::connect(connection_string).await {
                Ok(pool) => {
                    info!(logger, "Connected to database"; "attempt" => attempt);
                    return Ok(pool);
                }
                Err(source) if attempt >= attempts => {
                    return Err(BackendError::ConnectionFailed { attempts, source });
                }
                Err(e) => {
                    warn!(logger, "Failed to connect to database, retrying..."; "attempt" => attempt, "error" => %e, "delay_seconds" => delay.as_secs());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn ping(&self) -> BoxFuture<Result<(), BackendError>> {
            async move {
                let query = sqlx::query_as::<_, (i32,)>("SELECT 1");

                query.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn create_user(
            &self,
            username: &str,
            credentials: Credentials,
        ) -> BoxFuture<Result<(), BackendError>> {
            let username = username.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/create_user.sql"));

                query
                    .bind(username)
                    .bind(credentials.salt)
                    .bind(credentials.hash)
                    .bind(credentials.iterations as i32)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn retrieve_credentials(
            &self,
            username: &str,
        ) -> BoxFuture<Result<Option<Credentials>, BackendError>> {
            let username = username.to_owned();

            async move {
                let query = sqlx::query_as::<_, (String, String, i32)>(include_str!(
                    "queries/retrieve_credentials.sql"
                ));

                let credentials = query
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .map(|(salt, hash, iterations)| {
                        Credentials::from_parts(salt, hash, iterations.max(1) as u32)
                    });

                Ok(credentials)
            }
            .boxed()
        }

        fn list_movies(&self, owner: &Owner) -> BoxFuture<Result<Vec<Movie>, BackendError>> {
            let owner = owner.clone();

            async move {
                let query = sqlx::query(include_str!("queries/list_movies.sql"));

                let movies = query
                    .bind(owner.as_str())
                    .try_map(|row: PgRow| movie_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(movies)
            }
            .boxed()
        }

        fn upsert_movie(
            &self,
            owner: &Owner,
            movie: Movie,
        ) -> BoxFuture<Result<(Movie, Upserted), BackendError>> {
            let owner = owner.clone();

            async move {
                use sqlx::Row;

                let query = sqlx::query(include_str!("queries/upsert_movie.sql"));

                let (movie, created) = query
                    .bind(owner.as_str())
                    .bind(movie.id())
                    .bind(movie.title())
                    .bind(movie.genre())
                    .bind(movie.rating())
                    .bind(movie.date_added())
                    .bind(movie.recommendation().as_str())
                    .try_map(|row: PgRow| {
                        let created: bool = row.try_get("created")?;

                        Ok((movie_from_row(&row)?, created))
                    })
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                let upserted = if created {
                    Upserted::Created
                } else {
                    Upserted::Replaced
                };

                Ok((movie, upserted))
            }
            .boxed()
        }

        fn update_rating(
            &self,
            owner: &Owner,
            id: MovieId,
            rating: f64,
        ) -> BoxFuture<Result<Movie, BackendError>> {
            let owner = owner.clone();

            async move {
                let query = sqlx::query(include_str!("queries/update_rating.sql"));

                let movie = query
                    .bind(owner.as_str())
                    .bind(id)
                    .bind(rating)
                    .bind(Recommendation::for_rating(rating).as_str())
                    .try_map(|row: PgRow| movie_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                movie.ok_or_else(|| BackendError::NonExistentId(id.to_string()))
            }
            .boxed()
        }

        fn delete_movie(
            &self,
            owner: &Owner,
            id: MovieId,
        ) -> BoxFuture<Result<Movie, BackendError>> {
            let owner = owner.clone();

            async move {
                let query = sqlx::query(include_str!("queries/delete_movie.sql"));

                let movie = query
                    .bind(owner.as_str())
                    .bind(id)
                    .try_map(|row: PgRow| movie_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                movie.ok_or_else(|| BackendError::NonExistentId(id.to_string()))
            }
            .boxed()
        }

        fn list_assignments(
            &self,
            owner: &Owner,
        ) -> BoxFuture<Result<Vec<Assignment>, BackendError>> {
            let owner = owner.clone();

            async move {
                let query = sqlx::query(include_str!("queries/list_assignments.sql"));

                let assignments = query
                    .bind(owner.as_str())
                    .try_map(|row: PgRow| assignment_from_row(&row))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(assignments)
            }
            .boxed()
        }

        fn upsert_assignment(
            &self,
            owner: &Owner,
            assignment: Assignment,
        ) -> BoxFuture<Result<Upserted, BackendError>> {
            let owner = owner.clone();

            async move {
                let query = sqlx::query_as::<_, (bool,)>(include_str!(
                    "queries/upsert_assignment.sql"
                ));

                let (created,) = query
                    .bind(owner.as_str())
                    .bind(assignment.id())
                    .bind(assignment.subject())
                    .bind(assignment.hours())
                    .bind(assignment.due_date())
                    .bind(i16::from(assignment.stress()))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(if created {
                    Upserted::Created
                } else {
                    Upserted::Replaced
                })
            }
            .boxed()
        }

        fn delete_assignment(
            &self,
            owner: &Owner,
            id: &str,
        ) -> BoxFuture<Result<Assignment, BackendError>> {
            let owner = owner.clone();
            let id = id.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/delete_assignment.sql"));

                let assignment = query
                    .bind(owner.as_str())
                    .bind(&id)
                    .try_map(|row: PgRow| assignment_from_row(&row))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                assignment.ok_or(BackendError::NonExistentId(id))
            }
            .boxed()
        }
    }

    fn movie_from_row(row: &PgRow) -> Result<Movie, sqlx::Error> {
        use sqlx::Row;

        let id: MovieId = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let genre: String = row.try_get("genre")?;
        let rating: f64 = row.try_get("rating")?;
        let date_added: String = row.try_get("date_added")?;
        let recommendation: String = row.try_get("recommendation")?;

        let movie = Movie::new(id, title, genre, rating, date_added);

        // the stored label is written by this service, so a mismatch
        // means someone edited the table by hand
        let stored: Recommendation = recommendation
            .parse()
            .map_err(|e: BackendError| sqlx::Error::Decode(Box::new(e)))?;

        if stored != movie.recommendation() {
            return Err(sqlx::Error::Decode(Box::new(BackendError::invalid_field(
                "recommendation",
                format!("{} does not match rating {}", stored, rating),
            ))));
        }

        Ok(movie)
    }

    fn assignment_from_row(row: &PgRow) -> Result<Assignment, sqlx::Error> {
        use sqlx::Row;

        let id: String = row.try_get("id")?;
        let subject: String = row.try_get("subject")?;
        let hours: f64 = row.try_get("hours")?;
        let due_date: String = row.try_get("due_date")?;

        Ok(Assignment::new(id, subject, hours, due_date))
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(USERS_PRIMARY_KEY_CONSTRAINT) => {
                BackendError::UsernameTaken
            }
            _ => BackendError::Sqlx { source: error },
        }
    }

    #[cfg(test)]
    mod tests {
        use std::time::Duration;

        use super::connect_with_retry;
        use crate::errors::BackendError;

        #[tokio::test]
        async fn connecting_gives_up_after_the_last_attempt() {
            let result = connect_with_retry(
                &log::discard(),
                "not a connection string",
                2,
                Duration::from_secs(0),
            )
            .await;

            match result {
                Err(BackendError::ConnectionFailed { attempts, .. }) => assert_eq!(attempts, 2),
                Err(e) => panic!("expected connection failure, got {:?}", e),
                Ok(_) => panic!("connected to an invalid connection string"),
            }
        }

        #[tokio::test]
        async fn at_least_one_attempt_is_made() {
            let result =
                connect_with_retry(&log::discard(), "not a connection string", 0, Duration::from_secs(0))
                    .await;

            assert!(matches!(
                result,
                Err(BackendError::ConnectionFailed { attempts: 1, .. })
            ));
        }
    }
}
