use serde::{Deserialize, Serialize};

use crate::collection::Keyed;
use crate::errors::BackendError;
use crate::{dates, ids, normalization};

pub const MIN_STRESS: u8 = 1;
pub const MAX_STRESS: u8 = 10;

/// The stress score for an assignment needing `hours` of work: the
/// hours rounded up, clamped to `MIN_STRESS..=MAX_STRESS`.
pub fn stress_for(hours: f64) -> u8 {
    if !hours.is_finite() || hours <= f64::from(MIN_STRESS) {
        return MIN_STRESS;
    }

    hours.ceil().min(f64::from(MAX_STRESS)) as u8
}

/// A single tracked assignment.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    id: String,

    subject: String,

    /// Estimated hours of work, never negative.
    hours: f64,

    /// As `YYYY-MM-DD`.
    due_date: String,

    /// Always `stress_for(hours)`.
    stress: u8,
}

impl Assignment {
    pub fn new(id: String, subject: String, hours: f64, due_date: String) -> Self {
        Assignment {
            id,
            subject,
            hours,
            due_date,
            stress: stress_for(hours),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn due_date(&self) -> &str {
        &self.due_date
    }

    pub fn stress(&self) -> u8 {
        self.stress
    }
}

impl Keyed for Assignment {
    type Key = String;

    fn key(&self) -> &String {
        &self.id
    }
}

/// An assignment as submitted through the form. A blank ID asks for a
/// new one.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    #[serde(default, deserialize_with = "normalization::deserialize_id")]
    pub(crate) id: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) subject: Option<String>,

    #[serde(default)]
    pub(crate) hours: Option<f64>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) due_date: Option<String>,
}

impl AssignmentSubmission {
    pub fn into_assignment(self) -> Result<Assignment, BackendError> {
        let subject = self.subject.ok_or(BackendError::MissingField("subject"))?;
        let hours = self.hours.ok_or(BackendError::MissingField("hours"))?;

        if !hours.is_finite() || hours < 0.0 {
            return Err(BackendError::invalid_field(
                "hours",
                format!("{} is not a non-negative number", hours),
            ));
        }

        let due_date = self.due_date.ok_or(BackendError::MissingField("dueDate"))?;
        let due_date = dates::parse_date("dueDate", &due_date)?;

        let id = self
            .id
            .unwrap_or_else(|| ids::next_id().to_string());

        Ok(Assignment::new(id, subject, hours, due_date))
    }
}

/// The body of a deletion request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssignmentDeletion {
    #[serde(default, deserialize_with = "normalization::deserialize_id")]
    pub(crate) id: Option<String>,
}

impl AssignmentDeletion {
    pub fn validate(self) -> Result<String, BackendError> {
        self.id.ok_or(BackendError::MissingField("id"))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn stress_rounds_hours_up() {
        assert_eq!(stress_for(0.0), 1);
        assert_eq!(stress_for(1.0), 1);
        assert_eq!(stress_for(1.2), 2);
        assert_eq!(stress_for(6.0), 6);
        assert_eq!(stress_for(9.01), 10);
        assert_eq!(stress_for(40.0), 10);
        assert_eq!(stress_for(f64::NAN), 1);
    }

    #[test]
    fn submissions_are_validated() {
        let submission = |json: &str| -> Result<Assignment, BackendError> {
            serde_json::from_str::<AssignmentSubmission>(json)
                .expect("parse submission")
                .into_assignment()
        };

        let assignment =
            submission(r#"{"id": "", "subject": "Maths", "hours": 3.5, "dueDate": "2024-05-01"}"#)
                .expect("valid submission");
        assert!(!assignment.id().is_empty());
        assert_eq!(assignment.stress(), 4);
        assert_eq!(assignment.due_date(), "2024-05-01");

        let assignment =
            submission(r#"{"id": 17, "subject": "Art", "hours": 0, "dueDate": "2024-05-01"}"#)
                .expect("valid submission with numeric ID");
        assert_eq!(assignment.id(), "17");

        assert!(matches!(
            submission(r#"{"hours": 2, "dueDate": "2024-05-01"}"#),
            Err(BackendError::MissingField("subject"))
        ));
        assert!(matches!(
            submission(r#"{"subject": "Maths", "hours": -1, "dueDate": "2024-05-01"}"#),
            Err(BackendError::InvalidField { field: "hours", .. })
        ));
        assert!(matches!(
            submission(r#"{"subject": "Maths", "hours": 1}"#),
            Err(BackendError::MissingField("dueDate"))
        ));
        assert!(matches!(
            submission(r#"{"subject": "Maths", "hours": 1, "dueDate": "05/01/2024"}"#),
            Err(BackendError::InvalidField { field: "dueDate", .. })
        ));
    }

    #[test]
    fn assignments_serialize_in_camel_case() {
        let assignment = Assignment::new("a".into(), "History".into(), 2.0, "2024-01-09".into());
        let value = serde_json::to_value(&assignment).unwrap();

        assert_eq!(value["dueDate"], "2024-01-09");
        assert_eq!(value["stress"], 2);
    }

    proptest! {
        #[test]
        fn stress_is_bounded_and_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };

            prop_assert!((MIN_STRESS..=MAX_STRESS).contains(&stress_for(low)));
            prop_assert!(stress_for(low) <= stress_for(high));
        }
    }
}
