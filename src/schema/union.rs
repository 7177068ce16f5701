//! Union, discriminated union and intersection builders.
use indexmap::IndexMap;
use tracing::debug;

use crate::error::SchemaError;
use crate::value::Literal;

use super::{Schema, SchemaKind};

#[derive(Debug, Clone)]
pub struct UnionDef {
    pub options: Vec<Schema>,
}

pub fn union(options: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(SchemaKind::Union(UnionDef { options: options.into_iter().collect() }))
}

#[derive(Debug, Clone)]
pub struct DiscriminatedUnionDef {
    pub discriminator: String,
    pub options: Vec<Schema>,
    /// Discriminator value to index into `options`.
    pub lookup: IndexMap<Literal, usize>,
}

impl DiscriminatedUnionDef {
    pub fn option_for(&self, value: &Literal) -> Option<&Schema> {
        self.lookup.get(value).map(|&i| &self.options[i])
    }

    pub fn discriminator_values(&self) -> Vec<Literal> {
        self.lookup.keys().cloned().collect()
    }
}

/// Union dispatched on the literal value of one key. Every option must be an
/// object schema whose `discriminator` member resolves to a fixed set of
/// literals, and no literal may select more than one option.
pub fn discriminated_union(
    discriminator: impl Into<String>,
    options: impl IntoIterator<Item = Schema>,
) -> Result<Schema, SchemaError> {
    let discriminator = discriminator.into();
    let options: Vec<Schema> = options.into_iter().collect();
    let mut lookup = IndexMap::new();

    for (index, option) in options.iter().enumerate() {
        let SchemaKind::Object(def) = option.kind() else {
            return Err(SchemaError::NotAnObject { index });
        };
        let values = def.shape.get(&discriminator).map(discriminator_values).unwrap_or_default();
        if values.is_empty() {
            return Err(SchemaError::MissingDiscriminator { discriminator, index });
        }
        for value in values {
            if lookup.insert(value.clone(), index).is_some() {
                return Err(SchemaError::DuplicateDiscriminator { discriminator, value });
            }
        }
    }

    debug!(%discriminator, options = options.len(), values = lookup.len(), "built discriminated union");
    Ok(Schema::new(SchemaKind::DiscriminatedUnion(DiscriminatedUnionDef {
        discriminator,
        options,
        lookup,
    })))
}

/// Literal values a member schema can take, looking through wrappers that
/// preserve them. Empty when the schema admits non-literal values.
fn discriminator_values(schema: &Schema) -> Vec<Literal> {
    match schema.kind() {
        SchemaKind::Lazy(def) => discriminator_values(def.schema()),
        SchemaKind::Effects(def) => discriminator_values(&def.schema),
        SchemaKind::Literal(lit) => vec![lit.clone()],
        SchemaKind::Enum(def) => def.values.iter().cloned().map(Literal::String).collect(),
        SchemaKind::NativeEnum(def) => def.values(),
        SchemaKind::Default(def) => discriminator_values(&def.inner),
        SchemaKind::Catch(def) => discriminator_values(&def.inner),
        SchemaKind::Undefined => vec![Literal::Undefined],
        SchemaKind::Null => vec![Literal::Null],
        SchemaKind::Optional(inner) => {
            let mut out = vec![Literal::Undefined];
            out.extend(discriminator_values(inner));
            out
        }
        SchemaKind::Nullable(inner) => {
            let mut out = vec![Literal::Null];
            out.extend(discriminator_values(inner));
            out
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct IntersectionDef {
    pub left: Schema,
    pub right: Schema,
}

pub fn intersection(left: impl Into<Schema>, right: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Intersection(IntersectionDef { left: left.into(), right: right.into() }))
}
