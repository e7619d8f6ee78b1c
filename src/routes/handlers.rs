use std::time::{Duration, Instant};

use log::{debug, info, o};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use warp::{
    http::{StatusCode, Uri},
    hyper::body::Bytes,
    redirect, reject,
    reply::{html, json, with_header, with_status, Reply},
};

use crate::assignment::{AssignmentDeletion, AssignmentSubmission};
use crate::collection::Upserted;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::movie::{parse_movie_id, MovieSubmission, RatingUpdate};
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::session::Sessions;
use crate::user::{Credentials, LoginRequest, Owner};

const SERVER_TIMING_HEADER: &str = "server-timing";
const SET_COOKIE_HEADER: &str = "set-cookie";

pub(super) type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

/// Runs the body, attaching how long it took as a `server-timing`
/// header. Errors short-circuit without the header.
macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn list_movies(environment: Environment, session: Option<String>) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list_movies(), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let movies = environment
            .db
            .list_movies(&owner)
            .await
            .map_err(error_handler)?;

        with_status(json(&movies), StatusCode::OK)
    }
}

pub async fn save_movie(
    environment: Environment,
    session: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::save_movie(None), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let submission: MovieSubmission = parse_body(&body).map_err(error_handler)?;
        let submitted_id = submission.id.clone();
        let error_handler = |e: BackendError| Rejection::new(Context::save_movie(submitted_id.clone()), e);

        let movie = submission.into_movie().map_err(error_handler)?;
        let logger = environment.logger.new(o!("owner" => owner.to_string(), "id" => movie.id()));

        debug!(logger, "Saving movie..."; "rating" => movie.rating(), "recommendation" => %movie.recommendation());
        let (movie, upserted) = environment
            .db
            .upsert_movie(&owner, movie)
            .await
            .map_err(error_handler)?;

        let reply: Box<dyn Reply> = match upserted {
            Upserted::Created => {
                let location = environment.urls.movie(movie.id()).map_err(error_handler)?;

                Box::new(with_header(
                    with_status(json(&movie), StatusCode::CREATED),
                    "location",
                    location.as_str(),
                ))
            }
            Upserted::Replaced => Box::new(with_status(json(&movie), StatusCode::OK)),
        };

        reply
    }
}

pub async fn update_rating(
    environment: Environment,
    id: String,
    session: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::update_rating(id.clone()), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let movie_id = parse_movie_id(&id).map_err(error_handler)?;
        let rating = parse_body::<RatingUpdate>(&body)
            .and_then(RatingUpdate::validate)
            .map_err(error_handler)?;

        debug!(environment.logger, "Updating rating..."; "owner" => %owner, "id" => movie_id, "rating" => rating);
        let movie = environment
            .db
            .update_rating(&owner, movie_id, rating)
            .await
            .map_err(error_handler)?;

        with_status(json(&movie), StatusCode::OK)
    }
}

pub async fn delete_movie(
    environment: Environment,
    id: String,
    session: Option<String>,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::delete_movie(id.clone()), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let movie_id = parse_movie_id(&id).map_err(error_handler)?;

        debug!(environment.logger, "Deleting movie..."; "owner" => %owner, "id" => movie_id);
        let movie = environment
            .db
            .delete_movie(&owner, movie_id)
            .await
            .map_err(error_handler)?;

        with_status(json(&movie), StatusCode::OK)
    }
}

pub async fn list_assignments(environment: Environment, session: Option<String>) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::list_assignments(), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        assignment_list(&environment, &owner)
            .await
            .map_err(error_handler)?
    }
}

pub async fn save_assignment(
    environment: Environment,
    session: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::save_assignment(None), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let submission: AssignmentSubmission = parse_body(&body).map_err(error_handler)?;
        let submitted_id = submission.id.clone();
        let error_handler = |e: BackendError| Rejection::new(Context::save_assignment(submitted_id.clone()), e);

        let assignment = submission.into_assignment().map_err(error_handler)?;

        debug!(environment.logger, "Saving assignment..."; "owner" => %owner, "id" => assignment.id(), "stress" => assignment.stress());
        environment
            .db
            .upsert_assignment(&owner, assignment)
            .await
            .map_err(error_handler)?;

        assignment_list(&environment, &owner)
            .await
            .map_err(error_handler)?
    }
}

pub async fn delete_assignment(
    environment: Environment,
    session: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::delete_assignment(None), e);

        let owner = environment
            .authenticate(session.as_deref())
            .await
            .map_err(error_handler)?;

        let id = parse_body::<AssignmentDeletion>(&body)
            .and_then(AssignmentDeletion::validate)
            .map_err(error_handler)?;
        let error_handler = |e: BackendError| Rejection::new(Context::delete_assignment(Some(id.clone())), e);

        debug!(environment.logger, "Deleting assignment..."; "owner" => %owner, "id" => &id);
        environment
            .db
            .delete_assignment(&owner, &id)
            .await
            .map_err(error_handler)?;

        assignment_list(&environment, &owner)
            .await
            .map_err(error_handler)?
    }
}

pub async fn register(environment: Environment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::register(None), e);

        let request: LoginRequest = parse_body(&body).map_err(error_handler)?;
        let requested = request.username.clone();
        let error_handler = |e: BackendError| Rejection::new(Context::register(requested.clone()), e);

        let (username, password) = request.into_registration().map_err(error_handler)?;

        debug!(environment.logger, "Registering user..."; "username" => &username);
        environment
            .db
            .create_user(&username, Credentials::new(&password))
            .await
            .map_err(error_handler)?;

        info!(environment.logger, "Registered user"; "username" => &username);
        start_session(&environment.sessions, username, StatusCode::CREATED).await
    }
}

pub async fn login(environment: Environment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::login(None), e);

        let request: LoginRequest = parse_body(&body).map_err(error_handler)?;
        let requested = request.username.clone();
        let error_handler = |e: BackendError| Rejection::new(Context::login(requested.clone()), e);

        let (username, password) = request.into_parts().map_err(error_handler)?;

        let credentials = environment
            .db
            .retrieve_credentials(&username)
            .await
            .map_err(error_handler)?;

        // unknown users and wrong passwords are indistinguishable
        match credentials {
            Some(credentials) if credentials.verify(&password) => {}
            _ => return Err(error_handler(BackendError::InvalidCredentials).into()),
        }

        debug!(environment.logger, "Logged in"; "username" => &username);
        start_session(&environment.sessions, username, StatusCode::OK).await
    }
}

pub async fn logout(environment: Environment, session: Option<String>) -> RouteResult {
    timed! {
        let id = session.as_deref().and_then(|s| Uuid::parse_str(s.trim()).ok());

        if let Some(id) = id {
            let revoked = environment.sessions.revoke(&id).await;
            debug!(environment.logger, "Logging out..."; "revoked" => revoked);
        }

        with_header(
            StatusCode::NO_CONTENT,
            SET_COOKIE_HEADER,
            Sessions::expired_cookie(),
        )
    }
}

pub async fn current_session(environment: Environment, session: Option<String>) -> RouteResult {
    timed! {
        let username = environment
            .current_user(session.as_deref())
            .await
            .ok_or_else(|| Rejection::new(Context::current_session(), BackendError::Unauthenticated))?;

        with_status(json(&SuccessResponse::Session { username }), StatusCode::OK)
    }
}

/// Who may see a page.
#[derive(Clone, Copy, Debug)]
pub enum Access {
    /// Requires a session when login is required.
    Protected,

    /// Sends logged-in users back to the main page.
    LoggedOutOnly,
}

#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub file: &'static str,
    pub access: Access,
}

pub async fn page(environment: Environment, session: Option<String>, page: Page) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::page(page.file), e);

        let user = environment.current_user(session.as_deref()).await;

        let redirect_to = match (page.access, user) {
            (Access::Protected, None) if environment.config.require_login() => Some("/login"),
            (Access::LoggedOutOnly, Some(_)) => Some("/"),
            _ => None,
        };

        let reply: Box<dyn Reply> = match redirect_to {
            Some(location) => {
                debug!(environment.logger, "Redirecting..."; "page" => page.file, "location" => location);
                Box::new(redirect::temporary(Uri::from_static(location)))
            }
            None => {
                let path = environment.config.public_dir().join(page.file);
                let contents = tokio::fs::read_to_string(path.clone())
                    .await
                    .map_err(|source| BackendError::PageUnavailable { path, source })
                    .map_err(error_handler)?;

                Box::new(html(contents))
            }
        };

        reply
    }
}

async fn assignment_list(
    environment: &Environment,
    owner: &Owner,
) -> Result<impl Reply, BackendError> {
    let data = environment.db.list_assignments(owner).await?;

    Ok(with_status(json(&SuccessResponse::Data { data }), StatusCode::OK))
}

async fn start_session(sessions: &Sessions, username: String, status: StatusCode) -> impl Reply {
    let id = sessions.create(username.clone()).await;

    with_header(
        with_status(json(&SuccessResponse::Session { username }), status),
        SET_COOKIE_HEADER,
        sessions.cookie_for(&id),
    )
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(BackendError::MalformedPayload)
}

pub(super) fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
