use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::str::FromStr;

/// Error returned when an integer code or name does not map to a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Importance of a todo. Travels over the wire and sits in the database as its integer code.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Priority {
    #[sea_orm(num_value = 0)]
    Low,
    #[default]
    #[sea_orm(num_value = 1)]
    Medium,
    #[sea_orm(num_value = 2)]
    High,
}

impl Priority {
    /// Returns the integer code used on the wire.
    pub fn code(self) -> i32 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// How a recurring todo advances its next due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum RecurrenceType {
    #[sea_orm(num_value = 0)]
    Daily,
    #[sea_orm(num_value = 1)]
    Weekly,
    #[sea_orm(num_value = 2)]
    Monthly,
    #[sea_orm(num_value = 3)]
    Yearly,
}

impl RecurrenceType {
    /// Returns the integer code used on the wire.
    pub fn code(self) -> i32 {
        match self {
            RecurrenceType::Daily => 0,
            RecurrenceType::Weekly => 1,
            RecurrenceType::Monthly => 2,
            RecurrenceType::Yearly => 3,
        }
    }

    /// Maps a wire code to a recurrence kind. Unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RecurrenceType::Daily),
            1 => Some(RecurrenceType::Weekly),
            2 => Some(RecurrenceType::Monthly),
            3 => Some(RecurrenceType::Yearly),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
            RecurrenceType::Monthly => "Monthly",
            RecurrenceType::Yearly => "Yearly",
        }
    }
}

/// Parses either the integer code or the case-insensitive variant name.
fn parse_coded<T>(
    kind: &'static str,
    s: &str,
    from_code: fn(i32) -> Option<T>,
    name: fn(T) -> &'static str,
) -> Result<T, UnknownVariant>
where
    T: Copy + Iterable,
{
    let trimmed = s.trim();
    let found = match trimmed.parse::<i32>() {
        Ok(code) => from_code(code),
        Err(_) => T::iter().find(|variant| name(*variant).eq_ignore_ascii_case(trimmed)),
    };
    found.ok_or_else(|| UnknownVariant {
        kind,
        value: s.to_owned(),
    })
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coded("priority", s, Priority::from_code, Priority::name)
    }
}

impl FromStr for RecurrenceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coded(
            "recurrence type",
            s,
            RecurrenceType::from_code,
            RecurrenceType::name,
        )
    }
}

/// Wire representation accepted on input: `2` or `"High"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Coded {
    Code(i32),
    Name(String),
}

/// Decodes either wire form through the type's [`FromStr`], which accepts codes and names.
fn decode<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = UnknownVariant>,
{
    let text = match Coded::deserialize(deserializer)? {
        Coded::Code(code) => code.to_string(),
        Coded::Name(name) => name,
    };
    text.parse().map_err(de::Error::custom)
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode(deserializer)
    }
}

impl Serialize for RecurrenceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for RecurrenceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_order_priorities_from_low_to_high() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn can_parse_priority_from_code_or_name() {
        assert_eq!("2".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("low".parse::<Priority>(), Ok(Priority::Low));
        assert!("7".parse::<Priority>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn can_serialize_enums_as_integer_codes() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "2");
        assert_eq!(
            serde_json::to_string(&RecurrenceType::Monthly).unwrap(),
            "2"
        );
    }

    #[test]
    fn can_deserialize_enums_from_codes_and_names() {
        assert_eq!(
            serde_json::from_str::<Priority>("0").unwrap(),
            Priority::Low
        );
        assert_eq!(
            serde_json::from_str::<RecurrenceType>("\"weekly\"").unwrap(),
            RecurrenceType::Weekly
        );
        assert!(serde_json::from_str::<RecurrenceType>("9").is_err());
    }

    #[test]
    fn can_name_rejected_value_in_decode_error() {
        let by_code = serde_json::from_str::<Priority>("9").unwrap_err().to_string();
        let by_name = serde_json::from_str::<RecurrenceType>("\"hourly\"")
            .unwrap_err()
            .to_string();

        assert!(by_code.contains("unknown priority value '9'"));
        assert!(by_name.contains("unknown recurrence type value 'hourly'"));
    }
}
