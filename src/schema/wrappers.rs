//! Single-child wrappers: lazy, default, catch and pipeline.
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::issue::ValidationError;
use crate::value::Value;

use super::{Schema, SchemaKind};

type Getter = Arc<dyn Fn() -> Schema + Send + Sync>;

/// Deferred child, built on first use and then cached. Clones share the
/// cache, so a recursive schema is constructed once.
#[derive(Clone)]
pub struct LazyDef {
    getter: Getter,
    resolved: Arc<OnceLock<Schema>>,
}

impl LazyDef {
    pub fn schema(&self) -> &Schema {
        self.resolved.get_or_init(|| (self.getter)())
    }
}

impl fmt::Debug for LazyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(s) => write!(f, "Lazy({})", s.tag()),
            None => f.write_str("Lazy(<unresolved>)"),
        }
    }
}

pub fn lazy<F>(getter: F) -> Schema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    Schema::new(SchemaKind::Lazy(LazyDef { getter: Arc::new(getter), resolved: Arc::new(OnceLock::new()) }))
}

#[derive(Clone)]
pub enum DefaultValue {
    Fixed(Value),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn get(&self) -> Value {
        match self {
            DefaultValue::Fixed(v) => v.clone(),
            DefaultValue::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefaultDef {
    pub inner: Schema,
    pub value: DefaultValue,
}

/// What a catch fallback sees about the failure it replaces.
#[derive(Debug, Clone)]
pub struct CatchCtx {
    pub error: ValidationError,
    pub input: Value,
}

#[derive(Clone)]
pub enum CatchValue {
    Fixed(Value),
    Computed(Arc<dyn Fn(&CatchCtx) -> Value + Send + Sync>),
}

impl CatchValue {
    pub fn get(&self, ctx: &CatchCtx) -> Value {
        match self {
            CatchValue::Fixed(v) => v.clone(),
            CatchValue::Computed(f) => f(ctx),
        }
    }
}

impl fmt::Debug for CatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatchValue::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            CatchValue::Computed(_) => f.write_str("Computed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatchDef {
    pub inner: Schema,
    pub value: CatchValue,
}

#[derive(Debug, Clone)]
pub struct PipelineDef {
    pub input: Schema,
    pub output: Schema,
}
