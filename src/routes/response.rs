use serde::Serialize;

use crate::assignment::Assignment;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    /// The whole assignment list, in the shape the assignment page
    /// expects.
    Data { data: Vec<Assignment> },
    Healthz {
        name: &'a str,
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
        storage: &'a str,
    },
    Session {
        username: String,
    },
}
