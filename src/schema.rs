//! Schema node model.
//!
//! A [`Schema`] is an immutable, reference-counted node. Every builder returns
//! a new node that wraps or copies its receiver, so a schema can be shared
//! across threads and reused across calls without coordination.
//!
//! The node kind is a closed sum type ([`SchemaKind`]); the validator, the
//! JSON-Schema emitter and any other walker match on it exhaustively.
pub mod collections;
pub mod effects;
pub mod enums;
pub mod function;
pub mod number;
pub mod object;
pub mod string;
pub mod union;
pub mod wrappers;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use crate::context::RefinementCtx;
use crate::error_map::{ErrorMap, SchemaMessages};
use crate::value::{Literal, Value};

pub use collections::{
    array, map, record, set, tuple, ArrayDef, ArraySchema, MapDef, RecordDef, SetDef, SetSchema, SizeCheck,
    TupleDef, TupleSchema,
};
pub use effects::{
    preprocess, preprocess_async, Effect, EffectsDef, Predicate, RefineParams, Refinement, Transformer,
};
pub use enums::{enumeration, literal, native_enum, EnumDef, EnumSchema, NativeEnumDef};
pub use function::{function, FunctionDef, FunctionSchema};
pub use number::{
    bigint, date, number, BigIntCheck, BigIntCheckKind, BigIntDef, BigIntSchema, DateCheck, DateCheckKind,
    DateDef, DateSchema, NumberCheck, NumberCheckKind, NumberDef, NumberSchema,
};
pub use object::{object, ObjectDef, ObjectSchema, UnknownKeys};
pub use string::{string, DatetimeOptions, IpVersion, StringCheck, StringCheckKind, StringDef, StringSchema};
pub use union::{discriminated_union, intersection, union, DiscriminatedUnionDef, IntersectionDef, UnionDef};
pub use wrappers::{lazy, CatchCtx, CatchDef, CatchValue, DefaultDef, DefaultValue, LazyDef, PipelineDef};

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub enum SchemaKind {
    String(StringDef),
    Number(NumberDef),
    BigInt(BigIntDef),
    Boolean { coerce: bool },
    Date(DateDef),
    NaN,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Void,
    Array(ArrayDef),
    Object(ObjectDef),
    Union(UnionDef),
    DiscriminatedUnion(DiscriminatedUnionDef),
    Intersection(IntersectionDef),
    Tuple(TupleDef),
    Record(RecordDef),
    Map(MapDef),
    Set(SetDef),
    Function(FunctionDef),
    Promise(Schema),
    Lazy(LazyDef),
    Literal(Literal),
    Enum(EnumDef),
    NativeEnum(NativeEnumDef),
    Effects(EffectsDef),
    Optional(Schema),
    Nullable(Schema),
    Default(DefaultDef),
    Catch(CatchDef),
    Pipeline(PipelineDef),
}

/// Payload-free mirror of [`SchemaKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTag {
    String,
    Number,
    BigInt,
    Boolean,
    Date,
    NaN,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Void,
    Array,
    Object,
    Union,
    DiscriminatedUnion,
    Intersection,
    Tuple,
    Record,
    Map,
    Set,
    Function,
    Promise,
    Lazy,
    Literal,
    Enum,
    NativeEnum,
    Effects,
    Optional,
    Nullable,
    Default,
    Catch,
    Pipeline,
}

impl SchemaTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaTag::String => "string",
            SchemaTag::Number => "number",
            SchemaTag::BigInt => "bigint",
            SchemaTag::Boolean => "boolean",
            SchemaTag::Date => "date",
            SchemaTag::NaN => "nan",
            SchemaTag::Null => "null",
            SchemaTag::Undefined => "undefined",
            SchemaTag::Any => "any",
            SchemaTag::Unknown => "unknown",
            SchemaTag::Never => "never",
            SchemaTag::Void => "void",
            SchemaTag::Array => "array",
            SchemaTag::Object => "object",
            SchemaTag::Union => "union",
            SchemaTag::DiscriminatedUnion => "discriminated_union",
            SchemaTag::Intersection => "intersection",
            SchemaTag::Tuple => "tuple",
            SchemaTag::Record => "record",
            SchemaTag::Map => "map",
            SchemaTag::Set => "set",
            SchemaTag::Function => "function",
            SchemaTag::Promise => "promise",
            SchemaTag::Lazy => "lazy",
            SchemaTag::Literal => "literal",
            SchemaTag::Enum => "enum",
            SchemaTag::NativeEnum => "native_enum",
            SchemaTag::Effects => "effects",
            SchemaTag::Optional => "optional",
            SchemaTag::Nullable => "nullable",
            SchemaTag::Default => "default",
            SchemaTag::Catch => "catch",
            SchemaTag::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SchemaKind {
    pub fn tag(&self) -> SchemaTag {
        match self {
            SchemaKind::String(_) => SchemaTag::String,
            SchemaKind::Number(_) => SchemaTag::Number,
            SchemaKind::BigInt(_) => SchemaTag::BigInt,
            SchemaKind::Boolean { .. } => SchemaTag::Boolean,
            SchemaKind::Date(_) => SchemaTag::Date,
            SchemaKind::NaN => SchemaTag::NaN,
            SchemaKind::Null => SchemaTag::Null,
            SchemaKind::Undefined => SchemaTag::Undefined,
            SchemaKind::Any => SchemaTag::Any,
            SchemaKind::Unknown => SchemaTag::Unknown,
            SchemaKind::Never => SchemaTag::Never,
            SchemaKind::Void => SchemaTag::Void,
            SchemaKind::Array(_) => SchemaTag::Array,
            SchemaKind::Object(_) => SchemaTag::Object,
            SchemaKind::Union(_) => SchemaTag::Union,
            SchemaKind::DiscriminatedUnion(_) => SchemaTag::DiscriminatedUnion,
            SchemaKind::Intersection(_) => SchemaTag::Intersection,
            SchemaKind::Tuple(_) => SchemaTag::Tuple,
            SchemaKind::Record(_) => SchemaTag::Record,
            SchemaKind::Map(_) => SchemaTag::Map,
            SchemaKind::Set(_) => SchemaTag::Set,
            SchemaKind::Function(_) => SchemaTag::Function,
            SchemaKind::Promise(_) => SchemaTag::Promise,
            SchemaKind::Lazy(_) => SchemaTag::Lazy,
            SchemaKind::Literal(_) => SchemaTag::Literal,
            SchemaKind::Enum(_) => SchemaTag::Enum,
            SchemaKind::NativeEnum(_) => SchemaTag::NativeEnum,
            SchemaKind::Effects(_) => SchemaTag::Effects,
            SchemaKind::Optional(_) => SchemaTag::Optional,
            SchemaKind::Nullable(_) => SchemaTag::Nullable,
            SchemaKind::Default(_) => SchemaTag::Default,
            SchemaKind::Catch(_) => SchemaTag::Catch,
            SchemaKind::Pipeline(_) => SchemaTag::Pipeline,
        }
    }
}

/// One entry in a string, number, bigint or date check list.
#[derive(Debug, Clone)]
pub struct Check<K> {
    pub kind: K,
    pub message: Option<String>,
    pub fatal: bool,
}

impl<K> Check<K> {
    pub fn new(kind: K) -> Self {
        Self { kind, message: None, fatal: false }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// A failing fatal check aborts the node and skips the remaining checks.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

impl<K> From<K> for Check<K> {
    fn from(kind: K) -> Self {
        Check::new(kind)
    }
}

/// Node-level configuration shared by every kind.
#[derive(Debug, Clone, Default)]
pub struct SchemaParams {
    pub messages: SchemaMessages,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) params: SchemaParams,
}

#[derive(Debug, Clone)]
pub struct Schema(Arc<SchemaNode>);

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self::with_params(kind, SchemaParams::default())
    }

    pub fn with_params(kind: SchemaKind, params: SchemaParams) -> Self {
        Schema(Arc::new(SchemaNode { kind, params }))
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.0.kind
    }

    pub fn tag(&self) -> SchemaTag {
        self.0.kind.tag()
    }

    pub fn params(&self) -> &SchemaParams {
        &self.0.params
    }

    pub fn description(&self) -> Option<&str> {
        self.0.params.description.as_deref()
    }

    pub(crate) fn messages(&self) -> &SchemaMessages {
        &self.0.params.messages
    }

    /// Same node, different params. The kind payload is shared, not rebuilt.
    fn map_params(self, f: impl FnOnce(&mut SchemaParams)) -> Schema {
        let mut params = self.0.params.clone();
        f(&mut params);
        Schema::with_params(self.0.kind.clone(), params)
    }

    /// Direct children in declaration order. A lazy node reports the schema
    /// its getter produces (resolving it on first call).
    pub fn children(&self) -> Vec<Schema> {
        match self.kind() {
            SchemaKind::String(_)
            | SchemaKind::Number(_)
            | SchemaKind::BigInt(_)
            | SchemaKind::Boolean { .. }
            | SchemaKind::Date(_)
            | SchemaKind::NaN
            | SchemaKind::Null
            | SchemaKind::Undefined
            | SchemaKind::Any
            | SchemaKind::Unknown
            | SchemaKind::Never
            | SchemaKind::Void
            | SchemaKind::Literal(_)
            | SchemaKind::Enum(_)
            | SchemaKind::NativeEnum(_) => Vec::new(),
            SchemaKind::Array(def) => vec![def.element.clone()],
            SchemaKind::Object(def) => {
                let mut out: Vec<Schema> = def.shape.values().cloned().collect();
                out.extend(def.catchall.clone());
                out
            }
            SchemaKind::Union(def) => def.options.clone(),
            SchemaKind::DiscriminatedUnion(def) => def.options.clone(),
            SchemaKind::Intersection(def) => vec![def.left.clone(), def.right.clone()],
            SchemaKind::Tuple(def) => {
                let mut out = def.items.clone();
                out.extend(def.rest.clone());
                out
            }
            SchemaKind::Record(def) => vec![def.key.clone(), def.value.clone()],
            SchemaKind::Map(def) => vec![def.key.clone(), def.value.clone()],
            SchemaKind::Set(def) => vec![def.value.clone()],
            SchemaKind::Function(def) => vec![def.args.clone(), def.returns.clone()],
            SchemaKind::Lazy(def) => vec![def.schema().clone()],
            SchemaKind::Effects(def) => vec![def.schema.clone()],
            SchemaKind::Default(def) => vec![def.inner.clone()],
            SchemaKind::Catch(def) => vec![def.inner.clone()],
            SchemaKind::Pipeline(def) => vec![def.input.clone(), def.output.clone()],
            SchemaKind::Promise(inner) | SchemaKind::Optional(inner) | SchemaKind::Nullable(inner) => {
                vec![inner.clone()]
            }
        }
    }

    /// Whether an object member declared with this schema may be left out of
    /// the output when its value is undefined.
    pub(crate) fn accepts_omission(&self) -> bool {
        match self.kind() {
            SchemaKind::Optional(_) => true,
            SchemaKind::Nullable(inner) => inner.accepts_omission(),
            SchemaKind::Effects(def) => def.schema.accepts_omission(),
            SchemaKind::Lazy(def) => def.schema().accepts_omission(),
            _ => false,
        }
    }

    /// Unwrap optional layers.
    pub fn unwrap_optional(&self) -> &Schema {
        match self.kind() {
            SchemaKind::Optional(inner) => inner.unwrap_optional(),
            _ => self,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LEAF CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

pub fn boolean() -> Schema {
    Schema::new(SchemaKind::Boolean { coerce: false })
}

pub fn nan() -> Schema {
    Schema::new(SchemaKind::NaN)
}

pub fn null() -> Schema {
    Schema::new(SchemaKind::Null)
}

pub fn undefined() -> Schema {
    Schema::new(SchemaKind::Undefined)
}

pub fn any() -> Schema {
    Schema::new(SchemaKind::Any)
}

pub fn unknown() -> Schema {
    Schema::new(SchemaKind::Unknown)
}

pub fn never() -> Schema {
    Schema::new(SchemaKind::Never)
}

pub fn void() -> Schema {
    Schema::new(SchemaKind::Void)
}

pub fn optional(inner: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Optional(inner.into()))
}

pub fn nullable(inner: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Nullable(inner.into()))
}

pub fn promise(inner: impl Into<Schema>) -> Schema {
    Schema::new(SchemaKind::Promise(inner.into()))
}

/// Schemas that convert their input before validating it.
pub mod coerce {
    use super::*;

    pub fn string() -> StringSchema {
        super::string().coerce()
    }

    pub fn number() -> NumberSchema {
        super::number().coerce()
    }

    pub fn bigint() -> BigIntSchema {
        super::bigint().coerce()
    }

    pub fn date() -> DateSchema {
        super::date().coerce()
    }

    pub fn boolean() -> Schema {
        Schema::new(SchemaKind::Boolean { coerce: true })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERIC BUILDERS
// ————————————————————————————————————————————————————————————————————————————

/// Builders available on every schema and typed schema builder.
pub trait SchemaExt: Into<Schema> + Sized {
    fn optional(self) -> Schema {
        optional(self)
    }

    fn nullable(self) -> Schema {
        nullable(self)
    }

    fn nullish(self) -> Schema {
        optional(nullable(self))
    }

    fn array(self) -> ArraySchema {
        array(self)
    }

    fn promise(self) -> Schema {
        promise(self)
    }

    fn or(self, other: impl Into<Schema>) -> Schema {
        union([self.into(), other.into()])
    }

    fn and(self, other: impl Into<Schema>) -> Schema {
        intersection(self, other)
    }

    /// Substitute `value` for undefined input.
    fn default(self, value: impl Into<Value>) -> Schema {
        Schema::new(SchemaKind::Default(DefaultDef {
            inner: self.into(),
            value: DefaultValue::Fixed(value.into()),
        }))
    }

    fn default_with<F>(self, f: F) -> Schema
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Schema::new(SchemaKind::Default(DefaultDef {
            inner: self.into(),
            value: DefaultValue::Computed(Arc::new(f)),
        }))
    }

    /// Replace any failure with `value`.
    fn catch(self, value: impl Into<Value>) -> Schema {
        Schema::new(SchemaKind::Catch(CatchDef {
            inner: self.into(),
            value: CatchValue::Fixed(value.into()),
        }))
    }

    fn catch_with<F>(self, f: F) -> Schema
    where
        F: Fn(&CatchCtx) -> Value + Send + Sync + 'static,
    {
        Schema::new(SchemaKind::Catch(CatchDef {
            inner: self.into(),
            value: CatchValue::Computed(Arc::new(f)),
        }))
    }

    fn refine<F>(self, check: F) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_with(check, RefineParams::default())
    }

    fn refine_with<F>(self, check: F, params: RefineParams) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let refinement = Refinement::sync(move |v: &Value, _: &RefinementCtx| check(v), params);
        effects::append(self.into(), Effect::Refinement(refinement))
    }

    /// Refinement that raises its own issues through the context.
    fn super_refine<F>(self, check: F) -> Schema
    where
        F: Fn(&Value, &RefinementCtx) + Send + Sync + 'static,
    {
        let refinement = Refinement::sync(
            move |v: &Value, ctx: &RefinementCtx| {
                check(v, ctx);
                true
            },
            RefineParams::default(),
        );
        effects::append(self.into(), Effect::Refinement(refinement))
    }

    fn refine_async<F, Fut>(self, check: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.refine_async_with(check, RefineParams::default())
    }

    fn refine_async_with<F, Fut>(self, check: F, params: RefineParams) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let refinement = Refinement::asynchronous(move |v: Value, _: RefinementCtx| check(v).boxed(), params);
        effects::append(self.into(), Effect::Refinement(refinement))
    }

    fn super_refine_async<F, Fut>(self, check: F) -> Schema
    where
        F: Fn(Value, RefinementCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let refinement = Refinement::asynchronous(
            move |v: Value, ctx: RefinementCtx| check(v, ctx).map(|_| true).boxed(),
            RefineParams::default(),
        );
        effects::append(self.into(), Effect::Refinement(refinement))
    }

    fn transform<F>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        effects::append(self.into(), Effect::Transform(Transformer::Sync(Arc::new(f))))
    }

    fn transform_async<F, Fut>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let f = Arc::new(move |v: Value| f(v).boxed());
        effects::append(self.into(), Effect::Transform(Transformer::Async(f)))
    }

    /// Feed this schema's output into `next`.
    fn pipe(self, next: impl Into<Schema>) -> Schema {
        Schema::new(SchemaKind::Pipeline(PipelineDef { input: self.into(), output: next.into() }))
    }

    fn describe(self, description: impl Into<String>) -> Schema {
        let description = description.into();
        self.into().map_params(|p| p.description = Some(description))
    }

    fn error_map(self, map: ErrorMap) -> Schema {
        self.into().map_params(|p| p.messages.error_map = Some(map))
    }

    /// Message for an `invalid_type` issue raised on undefined input.
    fn required_error(self, message: impl Into<String>) -> Schema {
        let message = message.into();
        self.into().map_params(|p| p.messages.required_error = Some(message))
    }

    fn invalid_type_error(self, message: impl Into<String>) -> Schema {
        let message = message.into();
        self.into().map_params(|p| p.messages.invalid_type_error = Some(message))
    }
}

impl<T: Into<Schema>> SchemaExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_never_mutate_the_receiver() {
        let base = string().min(2);
        let base: Schema = base.into();
        let described = base.clone().describe("name");
        assert!(base.description().is_none());
        assert_eq!(described.description(), Some("name"));
        assert_eq!(described.tag(), SchemaTag::String);
    }

    #[test]
    fn children_follow_declaration_order() {
        let s: Schema = object([("a", Schema::from(string())), ("b", number().into())]).into();
        let tags: Vec<_> = s.children().iter().map(Schema::tag).collect();
        assert_eq!(tags, vec![SchemaTag::String, SchemaTag::Number]);

        let t: Schema = tuple([boolean(), null()]).rest(any()).into();
        assert_eq!(t.children().len(), 3);
    }

    #[test]
    fn omission_follows_optional_layers() {
        assert!(string().optional().accepts_omission());
        assert!(string().optional().nullable().accepts_omission());
        assert!(!any().accepts_omission());
        assert!(!string().default("x").accepts_omission());
    }

    #[test]
    fn refinements_on_effects_extend_the_same_node() {
        let s = string().refine(|_| true).refine(|_| true);
        match s.kind() {
            SchemaKind::Effects(def) => {
                assert_eq!(def.effects.len(), 2);
                assert_eq!(def.schema.tag(), SchemaTag::String);
            }
            other => panic!("expected effects, got {:?}", other.tag()),
        }
    }
}
