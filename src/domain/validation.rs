// src/domain/validation.rs

use crate::domain::lead::{
    Bhk, City, LeadFields, LeadStatus, LeadUpdate, NewLead, PropertyType, Purpose, Source,
    TextEnum, Timeline,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 80;
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const NOTES_MAX_CHARS: usize = 1000;
pub const TAG_MAX_CHARS: usize = 50;

pub const BHK_REQUIRED_MSG: &str = "BHK is required for Apartment and Villa properties";
pub const BUDGET_ORDER_MSG: &str =
    "Maximum budget must be greater than or equal to minimum budget";
pub const PHONE_LENGTH_MSG: &str = "Phone must be 10-15 digits";
pub const EMAIL_MSG: &str = "Invalid email address";

/// Raw, loosely-typed lead input as it arrives from a JSON body or from the
/// CSV coercer. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub bhk: Option<String>,
    pub purpose: Option<String>,
    pub budget_min: Option<Typed<i64>>,
    pub budget_max: Option<Typed<i64>>,
    pub timeline: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Typed<Vec<String>>>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
}

/// BHK is sent as `"2"` by forms but as `2` by some API clients.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// A JSON field that may have arrived with the wrong type. The mismatch is
/// reported against the field instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Typed<T> {
    Value(T),
    WrongType(&'static str),
}

impl<T> Typed<T> {
    fn check(&self, errors: &mut FieldErrors, field: &str) -> Option<&T> {
        match self {
            Typed::Value(v) => Some(v),
            Typed::WrongType(msg) => {
                errors.push(field, *msg);
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for Typed<i64> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_i64() {
                Some(v) => Typed::Value(v),
                None => Typed::WrongType("Expected a whole number"),
            },
            _ => Typed::WrongType("Expected number"),
        })
    }
}

impl<'de> Deserialize<'de> for Typed<Vec<String>> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Typed::WrongType("Expected array"));
        };
        let tags: Option<Vec<String>> = items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        Ok(tags.map_or(Typed::WrongType("Expected array of strings"), Typed::Value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One message per offending field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        // First failing rule wins for a given field.
        if self.get(field).is_none() {
            self.0.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Validates input for a new lead. Status always starts at New; asking for
/// anything else is an error.
pub fn validate_create(input: &LeadInput) -> Result<NewLead, FieldErrors> {
    let mut errors = FieldErrors::default();
    let fields = validate_fields(input, &mut errors);

    if let Some(status) = trimmed(&input.status) {
        if status != LeadStatus::New.as_str() {
            errors.push("status", "Status cannot be set when creating a lead");
        }
    }

    match fields {
        Some(fields) if errors.is_empty() => Ok(NewLead {
            fields,
            status: LeadStatus::New,
        }),
        _ => Err(errors),
    }
}

/// Validates input for an update: the creation rules, plus the `updatedAt`
/// version token and an optional status.
pub fn validate_update(input: &LeadInput) -> Result<LeadUpdate, FieldErrors> {
    let mut errors = FieldErrors::default();
    let fields = validate_fields(input, &mut errors);

    let status = trimmed(&input.status)
        .and_then(|s| parse_enum::<LeadStatus>(&mut errors, "status", "Status", s));

    let expected_updated_at = match trimmed(&input.updated_at) {
        None => {
            errors.push("updatedAt", "updatedAt is required");
            None
        }
        Some(raw) => match parse_token(raw) {
            Some(ts) => Some(ts),
            None => {
                errors.push("updatedAt", "updatedAt must be an RFC 3339 timestamp");
                None
            }
        },
    };

    match (fields, expected_updated_at) {
        (Some(fields), Some(expected_updated_at)) if errors.is_empty() => Ok(LeadUpdate {
            fields,
            status,
            expected_updated_at,
        }),
        _ => Err(errors),
    }
}

/// Checks an email address against the same pattern the lead form uses.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            Regex::new(
                r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$",
            )
            .expect("email pattern compiles")
        })
        .is_match(email)
}

/// Strips common separators and checks what is left is 10-15 digits.
pub fn normalize_phone(raw: &str) -> Result<String, &'static str> {
    let stripped = raw.strip_prefix('+').unwrap_or(raw);
    let mut digits = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err("Phone must contain only digits"),
        }
    }
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
        return Err(PHONE_LENGTH_MSG);
    }
    Ok(digits)
}

fn parse_token(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    let v = trimmed(value);
    if v.is_none() {
        errors.push(field, format!("{label} is required"));
    }
    v
}

fn parse_enum<T: TextEnum>(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
) -> Option<T> {
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            let expected: Vec<&str> = T::variants().iter().map(|v| v.text()).collect();
            errors.push(
                field,
                format!("Invalid {label}. Expected one of: {}", expected.join(", ")),
            );
            None
        }
    }
}

fn required_enum<T: TextEnum>(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: &Option<String>,
) -> Option<T> {
    required(errors, field, label, value).and_then(|raw| parse_enum(errors, field, label, raw))
}

/// Runs every per-field and cross-field rule. Returns `None` when a required
/// field is unusable; all problems found are recorded in `errors`.
fn validate_fields(input: &LeadInput, errors: &mut FieldErrors) -> Option<LeadFields> {
    let full_name = required(errors, "fullName", "Full name", &input.full_name).and_then(|name| {
        let len = name.chars().count();
        if len < NAME_MIN_CHARS {
            errors.push("fullName", "Full name must be at least 2 characters");
            None
        } else if len > NAME_MAX_CHARS {
            errors.push("fullName", "Full name must be at most 80 characters");
            None
        } else {
            Some(name.to_string())
        }
    });

    let email = match trimmed(&input.email) {
        Some(e) if !is_valid_email(e) => {
            errors.push("email", EMAIL_MSG);
            None
        }
        other => other.map(str::to_string),
    };

    let phone = required(errors, "phone", "Phone", &input.phone).and_then(|raw| {
        normalize_phone(raw)
            .map_err(|msg| errors.push("phone", msg))
            .ok()
    });

    let city = required_enum::<City>(errors, "city", "City", &input.city);
    let property_type =
        required_enum::<PropertyType>(errors, "propertyType", "Property type", &input.property_type);

    let bhk = match property_type {
        Some(pt) if pt.requires_bhk() => match trimmed(&input.bhk) {
            Some(raw) => parse_enum::<Bhk>(errors, "bhk", "BHK", raw),
            None => {
                errors.push("bhk", BHK_REQUIRED_MSG);
                None
            }
        },
        // Non-residential: whatever was sent is dropped.
        Some(_) => None,
        None => trimmed(&input.bhk).and_then(|raw| parse_enum::<Bhk>(errors, "bhk", "BHK", raw)),
    };

    let purpose = required_enum::<Purpose>(errors, "purpose", "Purpose", &input.purpose);

    let budget_min = budget(errors, "budgetMin", &input.budget_min);
    let budget_max = budget(errors, "budgetMax", &input.budget_max);
    if let (Some(min), Some(max)) = (budget_min, budget_max) {
        if max < min {
            errors.push("budgetMax", BUDGET_ORDER_MSG);
        }
    }

    let timeline = required_enum::<Timeline>(errors, "timeline", "Timeline", &input.timeline);
    let source = required_enum::<Source>(errors, "source", "Source", &input.source);

    let notes = trimmed(&input.notes).map(str::to_string);
    if let Some(n) = &notes {
        if n.chars().count() > NOTES_MAX_CHARS {
            errors.push("notes", "Notes must be at most 1000 characters");
        }
    }

    let tags = match &input.tags {
        Some(raw) => raw
            .check(errors, "tags")
            .map(|t| normalize_tags(t.as_slice()))
            .unwrap_or_default(),
        None => Vec::new(),
    };
    if tags.iter().any(|t| t.chars().count() > TAG_MAX_CHARS) {
        errors.push("tags", "Each tag must be at most 50 characters");
    }

    let property_type = property_type?;
    Some(LeadFields {
        full_name: full_name?,
        email,
        phone: phone?,
        city: city?,
        property_type,
        bhk: if property_type.requires_bhk() { bhk } else { None },
        purpose: purpose?,
        budget_min,
        budget_max,
        timeline: timeline?,
        source: source?,
        notes,
        tags,
    })
}

fn budget(errors: &mut FieldErrors, field: &str, value: &Option<Typed<i64>>) -> Option<i64> {
    match value.as_ref()?.check(errors, field).copied()? {
        v if v < 0 => {
            errors.push(field, "Budget must be a non-negative number");
            None
        }
        v => Some(v),
    }
}

/// Trims each tag and drops empty ones. Order and duplicates are kept.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
