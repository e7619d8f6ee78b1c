use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        self.flatten_with_message(self.error.to_string())
    }

    /// Flattens the rejection, replacing the error's own message.
    pub fn flatten_with_message(&self, message: impl Into<String>) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: message.into(),
        }
    }
}

// `From<Rejection> for reject::Rejection` is provided by warp's blanket
// `impl<T: Reject> From<T> for Rejection`, which calls `reject::custom`.
impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,

    #[serde(rename = "error")]
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Context {
    CurrentSession,
    DeleteAssignment {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    DeleteMovie { id: String },
    ListAssignments,
    ListMovies,
    Login {
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
    Page { page: String },
    Register {
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
    SaveAssignment {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    SaveMovie {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    UpdateRating { id: String },
}

impl Context {
    pub fn current_session() -> Context {
        Context::CurrentSession
    }

    pub fn delete_assignment(id: Option<String>) -> Context {
        Context::DeleteAssignment { id }
    }

    pub fn delete_movie(id: String) -> Context {
        Context::DeleteMovie { id }
    }

    pub fn list_assignments() -> Context {
        Context::ListAssignments
    }

    pub fn list_movies() -> Context {
        Context::ListMovies
    }

    pub fn login(username: Option<String>) -> Context {
        Context::Login { username }
    }

    pub fn page(page: impl Into<String>) -> Context {
        Context::Page { page: page.into() }
    }

    pub fn register(username: Option<String>) -> Context {
        Context::Register { username }
    }

    pub fn save_assignment(id: Option<String>) -> Context {
        Context::SaveAssignment { id }
    }

    pub fn save_movie(id: Option<String>) -> Context {
        Context::SaveMovie { id }
    }

    pub fn update_rating(id: String) -> Context {
        Context::UpdateRating { id }
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, Rejection};
    use crate::errors::BackendError;

    #[test]
    fn flattened_rejections_name_the_operation() {
        let rejection = Rejection::new(
            Context::delete_movie("12".to_owned()),
            BackendError::NonExistentId("12".to_owned()),
        );
        let value = serde_json::to_value(rejection.flatten()).unwrap();

        assert_eq!(value["operation"], "delete_movie");
        assert_eq!(value["id"], "12");
        assert_eq!(value["error"], "No record with ID 12");
    }

    #[test]
    fn unit_contexts_flatten_too() {
        let rejection = Rejection::new(Context::list_movies(), BackendError::Unauthenticated);
        let value = serde_json::to_value(rejection.flatten_with_message("nope")).unwrap();

        assert_eq!(value, serde_json::json!({"operation": "list_movies", "error": "nope"}));
    }
}
