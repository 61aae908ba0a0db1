//! Form input for topics and entries.
//!
//! Validation is a separate phase from persistence: a handler calls
//! `validate_input` on the raw submission and only talks to the repository
//! once it has the cleaned value. A failed submission comes back as
//! [`FieldErrors`] and is re-rendered through [`BoundForm`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{Entry, Topic};

/// Field name -> messages, in a stable order for rendering.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// BoundForm
///
/// A form as the template sees it: the submitted (or prefilled) data plus any
/// errors attached to its fields. An empty `errors` map means the form has not
/// been rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundForm<T> {
    pub data: T,
    pub errors: FieldErrors,
}

impl<T> BoundForm<T> {
    pub fn unbound(data: T) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn rejected(data: T, errors: FieldErrors) -> Self {
        Self { data, errors }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// --- Topic ---

/// TopicForm
///
/// Raw `application/x-www-form-urlencoded` body for creating or editing a topic.
/// `public` is an HTML checkbox: absent means false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
pub struct TopicForm {
    #[serde(default)]
    #[validate(
        custom(function = not_blank),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub text: String,

    #[serde(default, deserialize_with = "checkbox")]
    pub public: bool,
}

/// Cleaned topic input, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicInput {
    pub text: String,
    pub public: bool,
}

impl TopicForm {
    /// Prefills the form from an existing topic (edit view).
    pub fn from_topic(topic: &Topic) -> Self {
        Self {
            text: topic.text.clone(),
            public: topic.public,
        }
    }

    pub fn validate_input(&self) -> Result<TopicInput, FieldErrors> {
        let cleaned = Self {
            text: self.text.trim().to_string(),
            public: self.public,
        };
        cleaned.validate().map_err(into_field_errors)?;

        Ok(TopicInput {
            text: cleaned.text,
            public: cleaned.public,
        })
    }
}

// --- Entry ---

/// EntryForm
///
/// Raw body for creating or editing an entry. Only `text` is read; the parent
/// topic always comes from the URL, so a submitted `topic` field is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
pub struct EntryForm {
    #[serde(default)]
    #[validate(
        custom(function = not_blank),
        length(max = 10000, message = "Ensure this value has at most 10000 characters.")
    )]
    pub text: String,
}

/// Cleaned entry input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput {
    pub text: String,
}

impl EntryForm {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            text: entry.text.clone(),
        }
    }

    pub fn validate_input(&self) -> Result<EntryInput, FieldErrors> {
        let cleaned = Self {
            text: self.text.trim().to_string(),
        };
        cleaned.validate().map_err(into_field_errors)?;

        Ok(EntryInput { text: cleaned.text })
    }
}

// --- Helpers ---

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Flattens validator output into per-field messages, falling back to the
/// error code when a rule carries no message.
fn into_field_errors(errors: ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Browsers send `on` for a ticked checkbox and omit the field otherwise.
/// A plain boolean is accepted too, so rendered form data reads back.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Flag(bool),
        Text(String),
    }

    Ok(match Option::<Checkbox>::deserialize(deserializer)? {
        Some(Checkbox::Flag(flag)) => flag,
        Some(Checkbox::Text(raw)) => matches!(raw.as_str(), "on" | "true" | "1"),
        None => false,
    })
}
