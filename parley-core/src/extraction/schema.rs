//! Extraction schema and the typed record it produces

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use tracing::debug;

use crate::error::{ParleyError, Result};
use crate::llm::FunctionDefinition;

/// Name of the function the model is forced to call
pub const EXTRACTION_FUNCTION_NAME: &str = "extract_user_information";

/// Fields the extractor knows about, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionField {
    Name,
    Email,
    Phone,
    Location,
    Age,
}

impl ExtractionField {
    pub const ALL: [ExtractionField; 5] = [
        ExtractionField::Name,
        ExtractionField::Email,
        ExtractionField::Phone,
        ExtractionField::Location,
        ExtractionField::Age,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionField::Name => "name",
            ExtractionField::Email => "email",
            ExtractionField::Phone => "phone",
            ExtractionField::Location => "location",
            ExtractionField::Age => "age",
        }
    }
}

impl fmt::Display for ExtractionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON schema for the extraction function parameters
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Full name of the person"
            },
            "email": {
                "type": "string",
                "description": "Email address"
            },
            "phone": {
                "type": "string",
                "description": "Phone number in any format"
            },
            "location": {
                "type": "string",
                "description": "Location, address, city, or geographic information"
            },
            "age": {
                "type": "integer",
                "description": "Age in years"
            }
        },
        "required": []
    })
}

/// Function definition sent alongside extraction requests
pub fn extraction_function() -> FunctionDefinition {
    FunctionDefinition {
        name: EXTRACTION_FUNCTION_NAME.to_string(),
        description: "Extract user information from chat conversation".to_string(),
        parameters: extraction_schema(),
    }
}

/// Personal-information fields found in a chat. Absent fields are omitted
/// when serialized rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl ExtractedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    /// Fields that hold a value, in canonical order
    pub fn fields(&self) -> Vec<ExtractionField> {
        ExtractionField::ALL
            .into_iter()
            .filter(|field| self.contains(*field))
            .collect()
    }

    pub fn contains(&self, field: ExtractionField) -> bool {
        match field {
            ExtractionField::Name => self.name.is_some(),
            ExtractionField::Email => self.email.is_some(),
            ExtractionField::Phone => self.phone.is_some(),
            ExtractionField::Location => self.location.is_some(),
            ExtractionField::Age => self.age.is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a record from the raw function-call payload.
    ///
    /// Nulls, empty strings and values of the wrong shape are dropped; unknown
    /// keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let map = match payload {
            Value::Object(map) => map,
            other => {
                return Err(ParleyError::MalformedResponse(format!(
                    "Expected a JSON object from extraction, got: {}",
                    other
                )));
            }
        };

        Ok(Self {
            name: text_field(&map, ExtractionField::Name),
            email: text_field(&map, ExtractionField::Email),
            phone: phone_field(&map),
            location: text_field(&map, ExtractionField::Location),
            age: age_field(&map),
        })
    }
}

fn text_field(map: &Map<String, Value>, field: ExtractionField) -> Option<String> {
    match map.get(field.as_str())? {
        Value::Null => None,
        Value::String(s) => non_empty(s),
        other => {
            debug!(field = %field, value = %other, "Dropping extracted field with unexpected type");
            None
        }
    }
}

fn phone_field(map: &Map<String, Value>) -> Option<String> {
    match map.get(ExtractionField::Phone.as_str())? {
        Value::Number(n) => Some(n.to_string()),
        _ => text_field(map, ExtractionField::Phone),
    }
}

fn age_field(map: &Map<String, Value>) -> Option<i64> {
    let value = map.get(ExtractionField::Age.as_str())?;
    let age = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    if age.is_none() && !matches!(value, Value::String(s) if s.trim().is_empty()) {
        debug!(value = %value, "Dropping extracted age that is not an integer");
    }
    age
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
