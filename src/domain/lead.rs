// src/domain/lead.rs

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A closed set of text values, used by the validator to report what it expected.
pub trait TextEnum: FromStr + Copy + 'static {
    fn variants() -> &'static [Self];
    fn text(&self) -> &'static str;
}

/// Declares a closed set of text values stored as-is in SQLite and sent as-is
/// over JSON. Unknown text is rejected by `FromStr`.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl TextEnum for $name {
            fn variants() -> &'static [Self] {
                Self::ALL
            }

            fn text(&self) -> &'static str {
                self.as_str()
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(|_| {
                    serde::de::Error::custom(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        s
                    ))
                })
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                s.parse().map_err(|_| FromSqlError::Other(
                    format!("unknown {} '{}'", stringify!($name), s).into(),
                ))
            }
        }
    };
}

text_enum!(City {
    Chandigarh => "Chandigarh",
    Mohali => "Mohali",
    Zirakpur => "Zirakpur",
    Panchkula => "Panchkula",
    Other => "Other",
});

text_enum!(PropertyType {
    Apartment => "Apartment",
    Villa => "Villa",
    Plot => "Plot",
    Office => "Office",
    Retail => "Retail",
});

text_enum!(
    /// Bedroom-count classifier, only meaningful for residential types.
    Bhk {
        One => "1",
        Two => "2",
        Three => "3",
        Four => "4",
        Studio => "Studio",
    }
);

text_enum!(Purpose {
    Buy => "Buy",
    Rent => "Rent",
});

text_enum!(Timeline {
    ZeroToThreeMonths => "0-3m",
    ThreeToSixMonths => "3-6m",
    OverSixMonths => ">6m",
    Exploring => "Exploring",
});

text_enum!(Source {
    Website => "Website",
    Referral => "Referral",
    WalkIn => "Walk-in",
    Call => "Call",
    Other => "Other",
});

text_enum!(
    /// Pipeline stage. Any stage may move to any other.
    LeadStatus {
        New => "New",
        Qualified => "Qualified",
        Contacted => "Contacted",
        Visited => "Visited",
        Negotiation => "Negotiation",
        Converted => "Converted",
        Dropped => "Dropped",
    }
);

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

impl PropertyType {
    /// Residential types carry a BHK value; the others never do.
    pub fn requires_bhk(&self) -> bool {
        matches!(self, PropertyType::Apartment | PropertyType::Villa)
    }
}

/// The user-editable fields of a lead, already validated and normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFields {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: City,
    pub property_type: PropertyType,
    pub bhk: Option<Bhk>,
    pub purpose: Purpose,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: Timeline,
    pub source: Source,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// A validated lead ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub fields: LeadFields,
    pub status: LeadStatus,
}

/// A validated update. `expected_updated_at` is the version token the caller
/// last saw; `status: None` keeps the stored status.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadUpdate {
    pub fields: LeadFields,
    pub status: Option<LeadStatus>,
    pub expected_updated_at: DateTime<Utc>,
}

/// A stored buyer lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(flatten)]
    pub fields: LeadFields,
    pub status: LeadStatus,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
