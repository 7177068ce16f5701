//! Effects: preprocessors, refinements and transforms layered on a schema.
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::RefinementCtx;
use crate::issue::PathSegment;
use crate::value::Value;

use super::{Schema, SchemaKind};

pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type AsyncTransformFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Value> + Send + Sync>;
pub type RefineFn = Arc<dyn Fn(&Value, &RefinementCtx) -> bool + Send + Sync>;
pub type AsyncRefineFn = Arc<dyn Fn(Value, RefinementCtx) -> BoxFuture<'static, bool> + Send + Sync>;

#[derive(Clone)]
pub enum Transformer {
    Sync(TransformFn),
    Async(AsyncTransformFn),
}

impl Transformer {
    pub fn is_async(&self) -> bool {
        matches!(self, Transformer::Async(_))
    }
}

/// Issue shape raised when a refinement returns `false` without adding issues
/// of its own.
#[derive(Debug, Clone, Default)]
pub struct RefineParams {
    pub message: Option<String>,
    pub path: Vec<PathSegment>,
    pub params: Option<serde_json::Value>,
    pub fatal: bool,
}

impl RefineParams {
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), ..Self::default() }
    }

    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

#[derive(Clone)]
pub enum Predicate {
    Sync(RefineFn),
    Async(AsyncRefineFn),
}

#[derive(Clone)]
pub struct Refinement {
    pub predicate: Predicate,
    pub params: RefineParams,
}

impl Refinement {
    pub fn sync<F>(f: F, params: RefineParams) -> Self
    where
        F: Fn(&Value, &RefinementCtx) -> bool + Send + Sync + 'static,
    {
        Self { predicate: Predicate::Sync(Arc::new(f)), params }
    }

    pub fn asynchronous<F>(f: F, params: RefineParams) -> Self
    where
        F: Fn(Value, RefinementCtx) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        Self { predicate: Predicate::Async(Arc::new(f)), params }
    }

    pub fn is_async(&self) -> bool {
        matches!(self.predicate, Predicate::Async(_))
    }
}

#[derive(Clone)]
pub enum Effect {
    /// Runs on the raw input before the inner schema.
    Preprocess(Transformer),
    Refinement(Refinement),
    Transform(Transformer),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Preprocess(_) => "preprocess",
            Effect::Refinement(_) => "refinement",
            Effect::Transform(_) => "transform",
        }
    }

    pub fn is_async(&self) -> bool {
        match self {
            Effect::Preprocess(t) | Effect::Transform(t) => t.is_async(),
            Effect::Refinement(r) => r.is_async(),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_async() { "async" } else { "sync" };
        write!(f, "Effect({} {mode})", self.name())
    }
}

/// Inner schema plus its effects in execution order. Preprocessors always
/// sit at the front of the list.
#[derive(Debug, Clone)]
pub struct EffectsDef {
    pub schema: Schema,
    pub effects: Vec<Effect>,
}

/// Add a post-validation effect. Effects nodes without node-level params are
/// extended in place so chained refinements share one node.
pub(crate) fn append(schema: Schema, effect: Effect) -> Schema {
    if let SchemaKind::Effects(def) = schema.kind() {
        if schema.params().messages.is_empty() && schema.description().is_none() {
            let mut def = def.clone();
            def.effects.push(effect);
            return Schema::new(SchemaKind::Effects(def));
        }
    }
    Schema::new(SchemaKind::Effects(EffectsDef { schema, effects: vec![effect] }))
}

fn prepend(schema: Schema, effect: Effect) -> Schema {
    if let SchemaKind::Effects(def) = schema.kind() {
        if schema.params().messages.is_empty() && schema.description().is_none() {
            let mut def = def.clone();
            def.effects.insert(0, effect);
            return Schema::new(SchemaKind::Effects(def));
        }
    }
    Schema::new(SchemaKind::Effects(EffectsDef { schema, effects: vec![effect] }))
}

/// Run `f` on the raw input, then validate the result with `schema`.
pub fn preprocess<F>(f: F, schema: impl Into<Schema>) -> Schema
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    prepend(schema.into(), Effect::Preprocess(Transformer::Sync(Arc::new(f))))
}

pub fn preprocess_async<F, Fut>(f: F, schema: impl Into<Schema>) -> Schema
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send + 'static,
{
    let f = Arc::new(move |v: Value| f(v).boxed());
    prepend(schema.into(), Effect::Preprocess(Transformer::Async(f)))
}
