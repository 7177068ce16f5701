//! Effect execution.
//!
//! Preprocessors run on the raw input, then the inner schema validates, then
//! refinements and transforms run in declaration order. An aborted inner
//! result stops the pipeline; a dirty one does not.
use crate::context::{ParseContext, RefinementCtx};
use crate::error::{AsyncFeature, UsageError};
use crate::error_map::SchemaMessages;
use crate::issue::{IssueData, IssueKind};
use crate::schema::{Effect, EffectsDef, Predicate, RefineParams, Transformer};
use crate::status::{ParseStatus, Parsed};
use crate::value::Value;

use super::{parse_async, parse_sync};

fn split(def: &EffectsDef) -> (&[Effect], &[Effect]) {
    let at = def
        .effects
        .iter()
        .position(|e| !matches!(e, Effect::Preprocess(_)))
        .unwrap_or(def.effects.len());
    def.effects.split_at(at)
}

fn transform_sync(t: &Transformer, value: Value, feature: AsyncFeature) -> Result<Value, UsageError> {
    match t {
        Transformer::Sync(f) => Ok(f(value)),
        Transformer::Async(_) => Err(UsageError::AsyncInSync(feature)),
    }
}

async fn transform_async(t: &Transformer, value: Value) -> Value {
    match t {
        Transformer::Sync(f) => f(value),
        Transformer::Async(f) => f(value).await,
    }
}

/// Fold what a refinement reported into the node's status.
fn settle(
    passed: bool,
    refine_ctx: &RefinementCtx,
    params: &RefineParams,
    messages: &SchemaMessages,
    value: &Value,
    status: &mut ParseStatus,
    ctx: &mut ParseContext,
) {
    let raised = refine_ctx.take_issues();
    let mut any = false;
    for data in raised {
        any = true;
        raise(data, messages, value, status, ctx);
    }
    if !passed && !any {
        let data = IssueData {
            kind: IssueKind::Custom { params: params.params.clone() },
            path: params.path.clone(),
            message: params.message.clone(),
            fatal: params.fatal,
        };
        raise(data, messages, value, status, ctx);
    }
}

fn raise(data: IssueData, messages: &SchemaMessages, value: &Value, status: &mut ParseStatus, ctx: &mut ParseContext) {
    if data.fatal {
        status.abort();
    } else {
        status.dirty();
    }
    ctx.add_issue(messages, data, value);
}

pub(super) fn effects_sync(
    def: &EffectsDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let (pre, post) = split(def);
    let mut value = input;
    for effect in pre {
        if let Effect::Preprocess(t) = effect {
            value = transform_sync(t, value, AsyncFeature::Preprocess)?;
        }
    }

    let mut status = ParseStatus::Valid;
    let Some(mut value) = parse_sync(&def.schema, value, ctx)?.fold_into(&mut status) else {
        return Ok(Parsed::Aborted);
    };

    for effect in post {
        match effect {
            Effect::Refinement(r) => {
                let refine_ctx = RefinementCtx::new(ctx.path());
                let passed = match &r.predicate {
                    Predicate::Sync(f) => f(&value, &refine_ctx),
                    Predicate::Async(_) => return Err(UsageError::AsyncInSync(AsyncFeature::Refinement)),
                };
                settle(passed, &refine_ctx, &r.params, messages, &value, &mut status, ctx);
            }
            Effect::Transform(t) | Effect::Preprocess(t) => {
                value = transform_sync(t, value, AsyncFeature::Transform)?;
            }
        }
        if status.is_aborted() {
            return Ok(Parsed::Aborted);
        }
    }
    Ok(Parsed::new(status, value))
}

pub(super) async fn effects_async(
    def: &EffectsDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let (pre, post) = split(def);
    let mut value = input;
    for effect in pre {
        if let Effect::Preprocess(t) = effect {
            value = transform_async(t, value).await;
        }
    }

    let mut status = ParseStatus::Valid;
    let Some(mut value) = parse_async(&def.schema, value, ctx).await?.fold_into(&mut status) else {
        return Ok(Parsed::Aborted);
    };

    for effect in post {
        match effect {
            Effect::Refinement(r) => {
                let refine_ctx = RefinementCtx::new(ctx.path());
                let passed = match &r.predicate {
                    Predicate::Sync(f) => f(&value, &refine_ctx),
                    Predicate::Async(f) => f(value.clone(), refine_ctx.clone()).await,
                };
                settle(passed, &refine_ctx, &r.params, messages, &value, &mut status, ctx);
            }
            Effect::Transform(t) | Effect::Preprocess(t) => {
                value = transform_async(t, value).await;
            }
        }
        if status.is_aborted() {
            return Ok(Parsed::Aborted);
        }
    }
    Ok(Parsed::new(status, value))
}
