//! Literal, enum and native-enum builders.
use indexmap::IndexMap;

use crate::value::Literal;

use super::{Schema, SchemaKind};

pub fn literal(value: impl Into<Literal>) -> Schema {
    Schema::new(SchemaKind::Literal(value.into()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    def: EnumDef,
}

/// Fixed set of string values.
pub fn enumeration<I, S>(values: I) -> EnumSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    EnumSchema { def: EnumDef { values: values.into_iter().map(Into::into).collect() } }
}

impl EnumSchema {
    pub fn options(&self) -> &[String] {
        &self.def.values
    }

    /// Enum narrowed to `keep`, in this enum's order.
    pub fn extract(&self, keep: &[&str]) -> EnumSchema {
        let values = self.def.values.iter().filter(|v| keep.contains(&v.as_str())).cloned();
        enumeration(values)
    }

    pub fn exclude(&self, drop: &[&str]) -> EnumSchema {
        let values = self.def.values.iter().filter(|v| !drop.contains(&v.as_str())).cloned();
        enumeration(values)
    }
}

impl From<EnumSchema> for Schema {
    fn from(s: EnumSchema) -> Schema {
        Schema::new(SchemaKind::Enum(s.def))
    }
}

/// Named constants from a host enumeration. Membership is by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEnumDef {
    pub entries: IndexMap<String, Literal>,
}

impl NativeEnumDef {
    /// Distinct accepted values, first occurrence first.
    pub fn values(&self) -> Vec<Literal> {
        let mut out: Vec<Literal> = Vec::new();
        for v in self.entries.values() {
            if !out.contains(v) {
                out.push(v.clone());
            }
        }
        out
    }
}

pub fn native_enum<I, K, V>(entries: I) -> Schema
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Literal>,
{
    let entries = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    Schema::new(SchemaKind::NativeEnum(NativeEnumDef { entries }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_and_exclude_keep_order() {
        let e = enumeration(["a", "b", "c"]);
        assert_eq!(e.extract(&["c", "a"]).options(), &["a", "c"]);
        assert_eq!(e.exclude(&["b"]).options(), &["a", "c"]);
    }

    #[test]
    fn native_values_are_distinct() {
        let s = native_enum([("Up", 1), ("Down", 2), ("Alias", 1)]);
        match s.kind() {
            SchemaKind::NativeEnum(def) => {
                assert_eq!(def.values(), vec![Literal::from(1), Literal::from(2)]);
            }
            _ => unreachable!(),
        }
    }
}
