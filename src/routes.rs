use std::sync::Arc;

use log::{error, warn, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Reply};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod pages;
mod rejection;
mod response;

pub use internal::*;

/// The largest JSON body to accept. Payloads here are a handful of
/// short fields.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

/// The message sent instead of the details of an unexpected failure.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<Box<dyn Reply>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        let flattened = if status.is_server_error() {
            error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
            r.flatten_with_message(INTERNAL_ERROR_MESSAGE)
        } else {
            warn!(logger, "Rejected request"; "context" => ?r.context, "status" => %status, "message" => %r.error);
            r.flatten()
        };

        return Ok(Box::new(with_status(json(&flattened), status)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        MalformedPayload(..) | MissingField(..) | InvalidField { .. } | InvalidId(..) => {
            StatusCode::BAD_REQUEST
        }
        NonExistentId(..) => StatusCode::NOT_FOUND,
        InvalidCredentials | Unauthenticated => StatusCode::UNAUTHORIZED,
        UsernameTaken => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, patch, path as p, path::param as par, post};

    use super::{handlers, pages, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;
    use crate::session::SESSION_COOKIE;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $route_variable = warp::any()
                    .map(move || environment.clone())
                    .and(p("api"));

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    fn session() -> impl Filter<Extract = (Option<String>,), Error = std::convert::Infallible> + Clone {
        warp::cookie::optional(SESSION_COOKIE)
    }

    fn body(
    ) -> impl Filter<Extract = (warp::hyper::body::Bytes,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH).and(warp::body::bytes())
    }

    route!(make_list_movies_route => list_movies, rt; p("movies"), end(), g(), session());
    route!(make_save_movie_route => save_movie, rt; p("movies"), end(), post(), session(), body());
    route!(make_update_rating_route => update_rating, rt; p("movies"), par::<String>(), p("rating"), end(), patch(), session(), body());
    route!(make_delete_movie_route => delete_movie, rt; p("movies"), par::<String>(), end(), delete(), session());
    route!(make_list_assignments_route => list_assignments, rt; p("data"), end(), g(), session());
    route!(make_save_assignment_route => save_assignment, rt; p("add"), end(), post(), session(), body());
    route!(make_delete_assignment_route => delete_assignment, rt; p("delete"), end(), post(), session(), body());
    route!(make_register_route => register, rt; p("register"), end(), post(), body());
    route!(make_login_route => login, rt; p("login"), end(), post(), body());
    route!(make_logout_route => logout, rt; p("logout"), end(), post(), session());
    route!(make_session_route => current_session, rt; p("session"), end(), g(), session());

    /// Combines every route of the main server, formatting rejections
    /// as JSON.
    pub fn make_routes(environment: Environment) -> Route {
        let logger = environment.logger.clone();

        make_list_movies_route(environment.clone())
            .or(make_save_movie_route(environment.clone()))
            .unify()
            .or(make_update_rating_route(environment.clone()))
            .unify()
            .or(make_delete_movie_route(environment.clone()))
            .unify()
            .or(make_list_assignments_route(environment.clone()))
            .unify()
            .or(make_save_assignment_route(environment.clone()))
            .unify()
            .or(make_delete_assignment_route(environment.clone()))
            .unify()
            .or(make_register_route(environment.clone()))
            .unify()
            .or(make_login_route(environment.clone()))
            .unify()
            .or(make_logout_route(environment.clone()))
            .unify()
            .or(make_session_route(environment.clone()))
            .unify()
            .or(pages::make_pages_route(environment.clone()))
            .unify()
            .or(pages::make_static_route(environment))
            .unify()
            .recover(move |r| super::format_rejection(logger.clone(), r))
            .unify()
            .boxed()
    }
}
