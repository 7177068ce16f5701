//! Object builder and its shape-level derivations.
use indexmap::IndexMap;

use super::{enumeration, optional, EnumSchema, Schema, SchemaKind};

/// What happens to input keys the shape does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report one `unrecognized_keys` issue listing them.
    Strict,
    /// Copy them to the output unvalidated.
    Passthrough,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectDef {
    pub shape: IndexMap<String, Schema>,
    pub unknown_keys: UnknownKeys,
    /// Validates every undeclared key; overrides `unknown_keys`.
    pub catchall: Option<Schema>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    def: ObjectDef,
}

pub fn object<I, K>(shape: I) -> ObjectSchema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let shape = shape.into_iter().map(|(k, s)| (k.into(), s)).collect();
    ObjectSchema { def: ObjectDef { shape, ..ObjectDef::default() } }
}

impl ObjectSchema {
    pub fn shape(&self) -> &IndexMap<String, Schema> {
        &self.def.shape
    }

    pub fn def(&self) -> &ObjectDef {
        &self.def
    }

    pub fn strict(mut self) -> Self {
        self.def.unknown_keys = UnknownKeys::Strict;
        self
    }

    pub fn strip(mut self) -> Self {
        self.def.unknown_keys = UnknownKeys::Strip;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.def.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn catchall(mut self, schema: impl Into<Schema>) -> Self {
        self.def.catchall = Some(schema.into());
        self
    }

    /// Add or replace members. Replaced keys keep their position.
    pub fn extend<I, K>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        for (k, s) in members {
            self.def.shape.insert(k.into(), s);
        }
        self
    }

    /// Combine shapes; `other` wins on shared keys and supplies the
    /// unknown-key policy and catchall.
    pub fn merge(mut self, other: ObjectSchema) -> Self {
        for (k, s) in other.def.shape {
            self.def.shape.insert(k, s);
        }
        self.def.unknown_keys = other.def.unknown_keys;
        self.def.catchall = other.def.catchall;
        self
    }

    pub fn pick(mut self, keys: &[&str]) -> Self {
        self.def.shape.retain(|k, _| keys.contains(&k.as_str()));
        self
    }

    pub fn omit(mut self, keys: &[&str]) -> Self {
        self.def.shape.retain(|k, _| !keys.contains(&k.as_str()));
        self
    }

    /// Every member becomes optional.
    pub fn partial(mut self) -> Self {
        for s in self.def.shape.values_mut() {
            *s = optional(s.clone());
        }
        self
    }

    pub fn partial_keys(mut self, keys: &[&str]) -> Self {
        for (k, s) in self.def.shape.iter_mut() {
            if keys.contains(&k.as_str()) {
                *s = optional(s.clone());
            }
        }
        self
    }

    /// `partial` applied recursively through objects, arrays, tuples and
    /// optional/nullable wrappers.
    pub fn deep_partial(mut self) -> Self {
        for s in self.def.shape.values_mut() {
            *s = optional(deep_partial(s));
        }
        self
    }

    /// Strip optional wrappers from every member.
    pub fn required(mut self) -> Self {
        for s in self.def.shape.values_mut() {
            *s = s.unwrap_optional().clone();
        }
        self
    }

    pub fn required_keys(mut self, keys: &[&str]) -> Self {
        for (k, s) in self.def.shape.iter_mut() {
            if keys.contains(&k.as_str()) {
                *s = s.unwrap_optional().clone();
            }
        }
        self
    }

    /// Enum of the declared keys, in declaration order.
    pub fn keyof(&self) -> EnumSchema {
        enumeration(self.def.shape.keys().cloned())
    }
}

impl From<ObjectSchema> for Schema {
    fn from(s: ObjectSchema) -> Schema {
        Schema::new(SchemaKind::Object(s.def))
    }
}

fn deep_partial(schema: &Schema) -> Schema {
    let params = schema.params().clone();
    let kind = match schema.kind() {
        SchemaKind::Object(def) => {
            let inner = ObjectSchema { def: def.clone() }.deep_partial();
            SchemaKind::Object(inner.def)
        }
        SchemaKind::Array(def) => {
            let mut def = def.clone();
            def.element = deep_partial(&def.element);
            SchemaKind::Array(def)
        }
        SchemaKind::Tuple(def) => {
            let mut def = def.clone();
            def.items = def.items.iter().map(deep_partial).collect();
            SchemaKind::Tuple(def)
        }
        SchemaKind::Optional(inner) => SchemaKind::Optional(deep_partial(inner)),
        SchemaKind::Nullable(inner) => SchemaKind::Nullable(deep_partial(inner)),
        _ => return schema.clone(),
    };
    Schema::with_params(kind, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{number, string, SchemaExt, SchemaTag};

    fn user() -> ObjectSchema {
        object([
            ("name", Schema::from(string())),
            ("age", number().optional()),
            ("tags", string().array().into()),
        ])
    }

    #[test]
    fn pick_and_omit_keep_declaration_order() {
        let picked = user().pick(&["tags", "name"]);
        assert_eq!(picked.shape().keys().collect::<Vec<_>>(), vec!["name", "tags"]);
        let omitted = user().omit(&["name"]);
        assert_eq!(omitted.shape().keys().collect::<Vec<_>>(), vec!["age", "tags"]);
    }

    #[test]
    fn partial_then_required_round_trips_tags() {
        let partial = user().partial();
        assert!(partial.shape().values().all(|s| s.tag() == SchemaTag::Optional));
        let required = partial.required();
        assert_eq!(required.shape()["name"].tag(), SchemaTag::String);
        assert_eq!(required.shape()["age"].tag(), SchemaTag::Number);
    }

    #[test]
    fn merge_prefers_the_argument() {
        let other = object([("name", Schema::from(number()))]).strict();
        let merged = user().merge(other);
        assert_eq!(merged.shape()["name"].tag(), SchemaTag::Number);
        assert_eq!(merged.def().unknown_keys, UnknownKeys::Strict);
        assert_eq!(merged.shape().len(), 3);
    }

    #[test]
    fn deep_partial_reaches_nested_objects() {
        let nested = object([("inner", Schema::from(user()))]).deep_partial();
        let inner = nested.shape()["inner"].unwrap_optional();
        match inner.kind() {
            SchemaKind::Object(def) => {
                assert!(def.shape.values().all(|s| s.tag() == SchemaTag::Optional));
            }
            other => panic!("expected object, got {}", other.tag()),
        }
    }

    #[test]
    fn keyof_lists_keys() {
        let keys = user().keyof();
        assert_eq!(keys.options(), &["name".to_string(), "age".into(), "tags".into()]);
    }
}
