use warp::filters::BoxedFilter;
use warp::path::end;
use warp::path as p;
use warp::{Filter, Reply};

use super::handlers::{self, Access, Page};
use crate::environment::Environment;
use crate::session::SESSION_COOKIE;

type Route = BoxedFilter<(Box<dyn Reply>,)>;

const PAGES: &[(&str, Page)] = &[
    ("results", Page { file: "results.html", access: Access::Protected }),
    ("assignments", Page { file: "assignments.html", access: Access::Protected }),
    ("login", Page { file: "login.html", access: Access::LoggedOutOnly }),
];

const INDEX: Page = Page {
    file: "index.html",
    access: Access::Protected,
};

/// Serves the HTML pages, redirecting according to the session.
pub fn make_pages_route(environment: Environment) -> Route {
    PAGES.iter().fold(
        make_page_route(environment.clone(), end().boxed(), INDEX),
        |routes, (segment, page)| {
            routes
                .or(make_page_route(
                    environment.clone(),
                    p(*segment).and(end()).boxed(),
                    *page,
                ))
                .unify()
                .boxed()
        },
    )
}

fn make_page_route(environment: Environment, path: BoxedFilter<()>, page: Page) -> Route {
    warp::any()
        .map(move || environment.clone())
        .and(path)
        .and(warp::get())
        .and(warp::cookie::optional(SESSION_COOKIE))
        .and(warp::any().map(move || page))
        .and_then(handlers::page)
        .boxed()
}

/// Serves the stylesheets and scripts under `static/`.
pub fn make_static_route(environment: Environment) -> Route {
    let directory = environment.config.public_dir().join("static");

    p("static")
        .and(warp::get())
        .and(warp::fs::dir(directory))
        .map(|file: warp::fs::File| Box::new(file) as Box<dyn Reply>)
        .boxed()
}
