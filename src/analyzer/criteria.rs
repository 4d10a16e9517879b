use crate::analyzer::fields::{FIELDS, Field, FieldKind, FieldValue};
use crate::model::{CanonicalOffer, ConfigError};
use crate::utils::split_list;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A typed predicate argument. An unset criterion is simply absent from the set.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Ids(Vec<u64>),
    /// Needles are stored lowercase.
    Contains(Vec<String>),
    AtMost(f64),
    AtLeast(i64),
    Required,
}

impl Criterion {
    pub fn contains<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Criterion::Contains(
            needles
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        )
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Criterion::Ids(_) => FieldKind::IdList,
            Criterion::Contains(_) => FieldKind::Text,
            Criterion::AtMost(_) => FieldKind::Maximum,
            Criterion::AtLeast(_) => FieldKind::Minimum,
            Criterion::Required => FieldKind::Flag,
        }
    }

    /// Whether the offer's field satisfies this criterion.
    pub fn holds(&self, field: Field, offer: &CanonicalOffer) -> bool {
        // Kinds are checked when the set is built; a mismatch here never holds.
        match (self, field.value(offer)) {
            (Criterion::Ids(ids), FieldValue::Id(id)) => ids.contains(&id),
            (Criterion::Contains(needles), FieldValue::Text(text)) => {
                let haystack = text.to_lowercase();
                needles.iter().any(|needle| haystack.contains(needle.as_str()))
            }
            (Criterion::AtMost(max), FieldValue::Float(value)) => value <= *max,
            (Criterion::AtLeast(min), FieldValue::Int(value)) => value >= *min,
            (Criterion::Required, FieldValue::Bool(value)) => value,
            _ => false,
        }
    }

    /// Reads a criterion for `field` from a JSON config value.
    /// `false` for a flag and `null` for anything mean "unset".
    pub fn from_json(field: Field, value: &Value) -> Result<Option<Self>, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: field.name().to_string(),
            reason: reason.to_string(),
        };
        if value.is_null() {
            return Ok(None);
        }
        let criterion = match field.kind() {
            FieldKind::IdList => match value {
                Value::String(list) => parse_ids(field, list)?,
                Value::Number(_) => Criterion::Ids(vec![
                    value.as_u64().ok_or_else(|| invalid("expected an id"))?,
                ]),
                Value::Array(items) => Criterion::Ids(
                    items
                        .iter()
                        .map(Value::as_u64)
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| invalid("expected a list of ids"))?,
                ),
                _ => return Err(invalid("expected ids")),
            },
            FieldKind::Text => match value {
                Value::String(list) => parse_contains(field, list)?,
                Value::Array(items) => {
                    let needles = items
                        .iter()
                        .map(Value::as_str)
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| invalid("expected a list of strings"))?;
                    let needles: Vec<&str> = needles
                        .into_iter()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .collect();
                    if needles.is_empty() {
                        return Err(invalid("empty list"));
                    }
                    Criterion::contains(needles)
                }
                _ => return Err(invalid("expected a string")),
            },
            FieldKind::Maximum => {
                Criterion::AtMost(value.as_f64().ok_or_else(|| invalid("expected a number"))?)
            }
            FieldKind::Minimum => {
                Criterion::AtLeast(value.as_i64().ok_or_else(|| invalid("expected an integer"))?)
            }
            FieldKind::Flag => match value.as_bool() {
                Some(true) => Criterion::Required,
                Some(false) => return Ok(None),
                None => return Err(invalid("expected a boolean")),
            },
        };
        Ok(Some(criterion))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Ids(ids) => {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                write!(f, "in [{}]", ids.join(","))
            }
            Criterion::Contains(needles) => write!(f, "~ [{}]", needles.join(",")),
            Criterion::AtMost(max) => write!(f, "<= {max}"),
            Criterion::AtLeast(min) => write!(f, ">= {min}"),
            Criterion::Required => f.write_str("required"),
        }
    }
}

/// Parses a comma-separated id list such as `"2001,2002"`.
pub fn parse_ids(field: Field, list: &str) -> Result<Criterion, ConfigError> {
    let ids = split_list(list)
        .into_iter()
        .map(|id| {
            id.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: field.name().to_string(),
                reason: format!("'{id}': {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.name().to_string(),
            reason: "empty list".into(),
        });
    }
    Ok(Criterion::Ids(ids))
}

/// Parses a comma-separated substring list such as `"ryzen,epyc"`.
pub fn parse_contains(field: Field, list: &str) -> Result<Criterion, ConfigError> {
    let needles = split_list(list);
    if needles.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.name().to_string(),
            reason: "empty list".into(),
        });
    }
    Ok(Criterion::contains(needles))
}

/// The match and exclude criteria of one run, keyed by registry field.
#[derive(Debug, Clone, Default)]
pub struct CriteriaSet {
    matches: HashMap<Field, Criterion>,
    excludes: HashMap<Field, Criterion>,
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_match(&mut self, field: Field, criterion: Criterion) -> Result<(), ConfigError> {
        check_kind(field, &criterion)?;
        self.matches.insert(field, criterion);
        Ok(())
    }

    pub fn set_exclude(&mut self, field: Field, criterion: Criterion) -> Result<(), ConfigError> {
        check_kind(field, &criterion)?;
        self.excludes.insert(field, criterion);
        Ok(())
    }

    /// Sets a match criterion when `criterion` is `Some`; `None` leaves the field untouched.
    pub fn match_opt(&mut self, field: Field, criterion: Option<Criterion>) -> Result<(), ConfigError> {
        match criterion {
            Some(c) => self.set_match(field, c),
            None => Ok(()),
        }
    }

    pub fn exclude_opt(&mut self, field: Field, criterion: Option<Criterion>) -> Result<(), ConfigError> {
        match criterion {
            Some(c) => self.set_exclude(field, c),
            None => Ok(()),
        }
    }

    /// Loads criteria keyed by field name, as found in the config file.
    pub fn extend_from_json(
        &mut self,
        matches: &serde_json::Map<String, Value>,
        excludes: &serde_json::Map<String, Value>,
    ) -> Result<(), ConfigError> {
        for (name, value) in matches {
            let field = lookup(name)?;
            self.match_opt(field, Criterion::from_json(field, value)?)?;
        }
        for (name, value) in excludes {
            let field = lookup(name)?;
            self.exclude_opt(field, Criterion::from_json(field, value)?)?;
        }
        Ok(())
    }

    pub fn match_criterion(&self, field: Field) -> Option<&Criterion> {
        self.matches.get(&field)
    }

    pub fn exclude_criterion(&self, field: Field) -> Option<&Criterion> {
        self.excludes.get(&field)
    }

    /// Number of criteria set, match and exclude together.
    pub fn count(&self) -> usize {
        self.matches.len() + self.excludes.len()
    }
}

fn lookup(name: &str) -> Result<Field, ConfigError> {
    Field::from_name(name).ok_or_else(|| ConfigError::UnknownField(name.to_string()))
}

fn check_kind(field: Field, criterion: &Criterion) -> Result<(), ConfigError> {
    if !FIELDS.iter().any(|(known, _)| *known == field) {
        return Err(ConfigError::UnknownField(format!("{field:?}")));
    }
    if field.kind() == criterion.kind() {
        Ok(())
    } else {
        Err(ConfigError::KindMismatch {
            field: field.name().to_string(),
            given: criterion.kind().describe().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiskClass;
    use serde_json::json;

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut set = CriteriaSet::new();
        let err = set.set_match(Field::Price, Criterion::AtLeast(10)).unwrap_err();
        assert!(matches!(err, ConfigError::KindMismatch { .. }));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_unregistered_field_is_rejected() {
        let mut set = CriteriaSet::new();
        let err = set
            .set_match(Field::DiskPresent(DiskClass::General), Criterion::Required)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField(_)));
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(
            parse_ids(Field::Id, "2001, 2002,,").unwrap(),
            Criterion::Ids(vec![2001, 2002])
        );
        assert!(parse_ids(Field::Id, "abc").is_err());
        assert!(parse_ids(Field::Id, " , ").is_err());
    }

    #[test]
    fn test_parse_contains_lowercases() {
        assert_eq!(
            parse_contains(Field::CpuDescription, "Ryzen,EPYC").unwrap(),
            Criterion::Contains(vec!["ryzen".into(), "epyc".into()])
        );
        assert!(parse_contains(Field::CpuDescription, "").is_err());
    }

    #[test]
    fn test_extend_from_json() {
        let mut set = CriteriaSet::new();
        let matches = json!({
            "ram_size": 64,
            "price": 55.5,
            "sp_ecc": true,
            "sp_gpu": false,
            "datacenter": ["FSN", "nbg"],
            "id": "1,2"
        });
        let excludes = json!({"cpu_description": "i7-920"});
        set.extend_from_json(matches.as_object().unwrap(), excludes.as_object().unwrap())
            .unwrap();

        assert_eq!(set.match_criterion(Field::RamSize), Some(&Criterion::AtLeast(64)));
        assert_eq!(set.match_criterion(Field::Price), Some(&Criterion::AtMost(55.5)));
        assert_eq!(set.match_criterion(Field::Ecc), Some(&Criterion::Required));
        assert_eq!(set.match_criterion(Field::Gpu), None);
        assert_eq!(
            set.match_criterion(Field::Datacenter),
            Some(&Criterion::Contains(vec!["fsn".into(), "nbg".into()]))
        );
        assert_eq!(set.match_criterion(Field::Id), Some(&Criterion::Ids(vec![1, 2])));
        assert_eq!(
            set.exclude_criterion(Field::CpuDescription),
            Some(&Criterion::Contains(vec!["i7-920".into()]))
        );
        assert_eq!(set.count(), 6);
    }

    #[test]
    fn test_unknown_field_is_configuration_error() {
        let mut set = CriteriaSet::new();
        let matches = json!({"disk_floppy_count": 1});
        let err = set
            .extend_from_json(matches.as_object().unwrap(), &serde_json::Map::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField(name) if name == "disk_floppy_count"));
    }

    #[test]
    fn test_bad_json_value_is_rejected() {
        assert!(Criterion::from_json(Field::RamSize, &json!("lots")).is_err());
        assert!(Criterion::from_json(Field::Ecc, &json!(1)).is_err());
        assert_eq!(
            Criterion::from_json(Field::DiskCount(DiskClass::Nvme), &json!(null)).unwrap(),
            None
        );
    }

    #[test]
    fn test_zero_is_a_real_value() {
        let mut set = CriteriaSet::new();
        set.set_match(Field::Price, Criterion::AtMost(0.0)).unwrap();
        assert_eq!(set.match_criterion(Field::Price), Some(&Criterion::AtMost(0.0)));
    }
}
