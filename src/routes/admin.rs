use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::error;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

/// Reports the build and whether storage answers. Responds with 503
/// when it doesn't.
pub fn make_healthz_route(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let environment = environment.clone();

            async move {
                let (status, storage) = match environment.db.ping().await {
                    Ok(()) => (StatusCode::OK, "ok"),
                    Err(e) => {
                        error!(environment.logger, "Storage unavailable"; "error" => ?e);
                        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
                    }
                };

                let response = SuccessResponse::Healthz {
                    name: info::NAME,
                    revision: info::REVISION,
                    timestamp: info::BUILD_TIMESTAMP,
                    version: info::VERSION,
                    storage,
                };

                Ok::<_, std::convert::Infallible>(with_status(json(&response), status))
            }
        })
}

type TerminationFuture<'a> = BoxFuture<'a, ()>;

pub type TerminationFunctionWrapper<'a> =
    Arc<dyn Fn() -> TerminationFuture<'a> + Send + Sync + 'a>;

/// Shuts down both servers.
pub fn make_termination_route<'a>(
    terminate: TerminationFunctionWrapper<'a>,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let handler = move || -> BoxFuture<Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            terminate().await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate")
        .and(warp::path::end())
        .and(warp::post())
        .and_then(handler)
}
