//! Array, tuple, set, record and map builders.
use super::{Schema, SchemaKind};

/// Size bound with an optional message override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCheck {
    pub value: usize,
    pub message: Option<String>,
}

impl SizeCheck {
    fn new(value: usize, message: Option<String>) -> Self {
        Self { value, message }
    }
}

// ------------------------------- Array ------------------------------------ //

#[derive(Debug, Clone)]
pub struct ArrayDef {
    pub element: Schema,
    pub min: Option<SizeCheck>,
    pub max: Option<SizeCheck>,
    pub exact: Option<SizeCheck>,
}

#[derive(Debug, Clone)]
pub struct ArraySchema {
    def: ArrayDef,
}

pub fn array(element: impl Into<Schema>) -> ArraySchema {
    ArraySchema { def: ArrayDef { element: element.into(), min: None, max: None, exact: None } }
}

impl ArraySchema {
    pub fn min(mut self, n: usize) -> Self {
        self.def.min = Some(SizeCheck::new(n, None));
        self
    }

    pub fn min_with(mut self, n: usize, message: impl Into<String>) -> Self {
        self.def.min = Some(SizeCheck::new(n, Some(message.into())));
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.def.max = Some(SizeCheck::new(n, None));
        self
    }

    pub fn max_with(mut self, n: usize, message: impl Into<String>) -> Self {
        self.def.max = Some(SizeCheck::new(n, Some(message.into())));
        self
    }

    pub fn length(mut self, n: usize) -> Self {
        self.def.exact = Some(SizeCheck::new(n, None));
        self
    }

    pub fn length_with(mut self, n: usize, message: impl Into<String>) -> Self {
        self.def.exact = Some(SizeCheck::new(n, Some(message.into())));
        self
    }

    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    pub fn element(&self) -> &Schema {
        &self.def.element
    }

    pub fn def(&self) -> &ArrayDef {
        &self.def
    }
}

impl From<ArraySchema> for Schema {
    fn from(s: ArraySchema) -> Schema {
        Schema::new(SchemaKind::Array(s.def))
    }
}

// ------------------------------- Tuple ------------------------------------ //

#[derive(Debug, Clone)]
pub struct TupleDef {
    pub items: Vec<Schema>,
    pub rest: Option<Schema>,
}

#[derive(Debug, Clone)]
pub struct TupleSchema {
    def: TupleDef,
}

pub fn tuple(items: impl IntoIterator<Item = Schema>) -> TupleSchema {
    TupleSchema { def: TupleDef { items: items.into_iter().collect(), rest: None } }
}

impl TupleSchema {
    /// Schema for elements past the fixed items.
    pub fn rest(mut self, rest: impl Into<Schema>) -> Self {
        self.def.rest = Some(rest.into());
        self
    }

    pub fn items(&self) -> &[Schema] {
        &self.def.items
    }
}

impl From<TupleSchema> for Schema {
    fn from(s: TupleSchema) -> Schema {
        Schema::new(SchemaKind::Tuple(s.def))
    }
}

// -------------------------------- Set ------------------------------------- //

#[derive(Debug, Clone)]
pub struct SetDef {
    pub value: Schema,
    pub min: Option<SizeCheck>,
    pub max: Option<SizeCheck>,
}

#[derive(Debug, Clone)]
pub struct SetSchema {
    def: SetDef,
}

pub fn set(value: impl Into<Schema>) -> SetSchema {
    SetSchema { def: SetDef { value: value.into(), min: None, max: None } }
}

impl SetSchema {
    pub fn min(mut self, n: usize) -> Self {
        self.def.min = Some(SizeCheck::new(n, None));
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.def.max = Some(SizeCheck::new(n, None));
        self
    }

    pub fn size(self, n: usize) -> Self {
        self.min(n).max(n)
    }

    pub fn nonempty(self) -> Self {
        self.min(1)
    }
}

impl From<SetSchema> for Schema {
    fn from(s: SetSchema) -> Schema {
        Schema::new(SchemaKind::Set(s.def))
    }
}

// --------------------------- Record and Map ------------------------------- //

#[derive(Debug, Clone)]
pub struct RecordDef {
    pub key: Schema,
    pub value: Schema,
}

#[derive(Debug, Clone)]
pub struct MapDef {
    pub key: Schema,
    pub value: Schema,
}

/// Object with arbitrary keys, each validated by `key`, and values by `value`.
pub fn record(key: impl Into<Schema>, value: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Record(RecordDef { key: key.into(), value: value.into() }))
}

pub fn map(key: impl Into<Schema>, value: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Map(MapDef { key: key.into(), value: value.into() }))
}
