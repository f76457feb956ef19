//! Submission builders with sensible defaults.

use enrollment_core::StudentSubmission;
use serde_json::{json, Map, Value};

/// Builder for enrollment submissions.
///
/// Starts from a complete, valid submission; each setter replaces one field
/// and `without` removes it entirely.
#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    fields: Map<String, Value>,
}

impl SubmissionBuilder {
    /// Creates a builder holding a valid submission.
    pub fn with_defaults() -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("Asha Rao"));
        fields.insert("address".to_string(), json!("12 Lake Rd"));
        fields.insert("classAppearingFor".to_string(), json!("5"));
        fields.insert("previousSchool".to_string(), json!("Green Valley"));
        fields.insert("mobileNumber".to_string(), json!("9876543210"));
        Self { fields }
    }

    /// Creates a builder with no fields at all.
    pub fn empty() -> Self {
        Self { fields: Map::new() }
    }

    /// Sets the student name.
    #[must_use]
    pub fn name(self, value: impl Into<Value>) -> Self {
        self.field("name", value)
    }

    /// Sets the address.
    #[must_use]
    pub fn address(self, value: impl Into<Value>) -> Self {
        self.field("address", value)
    }

    /// Sets the class the student is applying for.
    #[must_use]
    pub fn class_appearing_for(self, value: impl Into<Value>) -> Self {
        self.field("classAppearingFor", value)
    }

    /// Sets the previous school.
    #[must_use]
    pub fn previous_school(self, value: impl Into<Value>) -> Self {
        self.field("previousSchool", value)
    }

    /// Sets the mobile number.
    #[must_use]
    pub fn mobile_number(self, value: impl Into<Value>) -> Self {
        self.field("mobileNumber", value)
    }

    /// Sets an arbitrary wire field, including unknown ones.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Removes a wire field.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    /// Builds the JSON request body.
    pub fn json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Builds the serialized request body.
    pub fn body(&self) -> String {
        self.json().to_string()
    }

    /// Builds the typed submission as the handler would decode it.
    ///
    /// # Panics
    ///
    /// Panics if a field holds a value the submission cannot decode.
    pub fn build(&self) -> StudentSubmission {
        serde_json::from_value(self.json()).expect("fixture submission should decode")
    }
}

impl Default for SubmissionBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}
