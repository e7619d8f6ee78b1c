use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::assignment::Assignment;
use crate::collection::{Collection, Upserted};
use crate::errors::BackendError;
use crate::movie::{Movie, MovieId};
use crate::user::{Credentials, Owner};

/// Everything kept for one owner.
#[derive(Clone, Debug, Default)]
struct Document {
    credentials: Option<Credentials>,
    movies: Collection<Movie>,
    assignments: Collection<Assignment>,
}

/// A process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryDb {
    documents: RwLock<HashMap<Owner, Document>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::Db for MemoryDb {
    fn ping(&self) -> BoxFuture<Result<(), BackendError>> {
        async move { Ok(()) }.boxed()
    }

    fn create_user(
        &self,
        username: &str,
        credentials: Credentials,
    ) -> BoxFuture<Result<(), BackendError>> {
        let owner = Owner::user(username);

        async move {
            let mut documents = self.documents.write().await;
            let document = documents.entry(owner).or_default();

            if document.credentials.is_some() {
                return Err(BackendError::UsernameTaken);
            }

            document.credentials = Some(credentials);

            Ok(())
        }
        .boxed()
    }

    fn retrieve_credentials(
        &self,
        username: &str,
    ) -> BoxFuture<Result<Option<Credentials>, BackendError>> {
        let owner = Owner::user(username);

        async move {
            let documents = self.documents.read().await;

            Ok(documents
                .get(&owner)
                .and_then(|document| document.credentials.clone()))
        }
        .boxed()
    }

    fn list_movies(&self, owner: &Owner) -> BoxFuture<Result<Vec<Movie>, BackendError>> {
        let owner = owner.clone();

        async move {
            let documents = self.documents.read().await;

            Ok(documents
                .get(&owner)
                .map(|document| document.movies.to_vec())
                .unwrap_or_default())
        }
        .boxed()
    }

    fn upsert_movie(
        &self,
        owner: &Owner,
        mut movie: Movie,
    ) -> BoxFuture<Result<(Movie, Upserted), BackendError>> {
        let owner = owner.clone();

        async move {
            let mut documents = self.documents.write().await;
            let movies = &mut documents.entry(owner).or_default().movies;

            if let Some(existing) = movies.get(&movie.id()) {
                movie.set_date_added(existing.date_added());
            }

            let upserted = movies.upsert(movie.clone());

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
            let mut documents = self.documents.write().await;

            let movie = documents
                .get_mut(&owner)
                .and_then(|document| document.movies.get_mut(&id))
                .ok_or_else(|| BackendError::NonExistentId(id.to_string()))?;

            movie.set_rating(rating);

            Ok(movie.clone())
        }
        .boxed()
    }

    fn delete_movie(&self, owner: &Owner, id: MovieId) -> BoxFuture<Result<Movie, BackendError>> {
        let owner = owner.clone();

        async move {
            let mut documents = self.documents.write().await;

            documents
                .get_mut(&owner)
                .and_then(|document| document.movies.remove(&id))
                .ok_or_else(|| BackendError::NonExistentId(id.to_string()))
        }
        .boxed()
    }

    fn list_assignments(
        &self,
        owner: &Owner,
    ) -> BoxFuture<Result<Vec<Assignment>, BackendError>> {
        let owner = owner.clone();

        async move {
            let documents = self.documents.read().await;

            Ok(documents
                .get(&owner)
                .map(|document| document.assignments.to_vec())
                .unwrap_or_default())
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
            let mut documents = self.documents.write().await;

            Ok(documents
                .entry(owner)
                .or_default()
                .assignments
                .upsert(assignment))
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
            let mut documents = self.documents.write().await;

            documents
                .get_mut(&owner)
                .and_then(|document| document.assignments.remove(&id))
                .ok_or(BackendError::NonExistentId(id))
        }
        .boxed()
    }
}
