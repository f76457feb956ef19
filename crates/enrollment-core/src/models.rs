//! Domain models and strongly-typed identifiers.
//!
//! A submission moves through three shapes: the raw `StudentSubmission`
//! read off the wire, the validated `NewStudent`, and the persisted
//! `StudentRecord` carrying its identifier and timestamps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier of a stored student record.
///
/// Assigned once when a record is stored. Two submissions never share an
/// identifier, even when their payloads are identical.
///
/// ```
/// use enrollment_core::StudentId;
///
/// assert_ne!(StudentId::new(), StudentId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct StudentId(pub Uuid);

impl StudentId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for StudentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Raw enrollment submission as received over HTTP.
///
/// Every field is optional here; presence and format are checked by
/// [`crate::validation::validate`]. JSON numbers and booleans are read as
/// their textual form. `null`, arrays and objects read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmission {
    /// Student's full name
    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Postal address
    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Class the student is applying for
    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub class_appearing_for: Option<String>,
    /// School the student attended previously
    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub previous_school: Option<String>,
    /// Ten-digit contact number
    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => None,
    })
}

/// A validated submission ready to be stored.
///
/// All fields are trimmed and satisfy the field constraints. Obtained from
/// [`crate::validation::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    /// Student's full name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Class the student is applying for
    pub class_appearing_for: String,
    /// School the student attended previously
    pub previous_school: String,
    /// Ten-digit contact number
    pub mobile_number: String,
}

/// A persisted student record.
///
/// Created exactly once per successful submission and never modified, so
/// `updated_at` always equals `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Store-assigned identifier
    pub id: StudentId,
    /// Student's full name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Class the student is applying for
    pub class_appearing_for: String,
    /// School the student attended previously
    pub previous_school: String,
    /// Ten-digit contact number
    pub mobile_number: String,
    /// When the record was stored
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    /// Builds the record for `student` as stored at `now` under `id`.
    pub fn from_new(id: StudentId, student: NewStudent, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: student.name,
            address: student.address,
            class_appearing_for: student.class_appearing_for,
            previous_school: student.previous_school,
            mobile_number: student.mobile_number,
            created_at: now,
            updated_at: now,
        }
    }
}
