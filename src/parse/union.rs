//! Unions, discriminated unions and intersections.
use futures::future::join_all;
use tracing::trace;

use crate::context::ParseContext;
use crate::error::UsageError;
use crate::error_map::SchemaMessages;
use crate::issue::{IssueData, IssueKind, PathSegment, ValidationError};
use crate::schema::{DiscriminatedUnionDef, IntersectionDef, Schema, UnionDef};
use crate::status::{ParseStatus, Parsed};
use crate::value::{Literal, Object, Value, ValueType};

use super::{parse_async, parse_sync, reject_type};

// -------------------------------- Union ----------------------------------- //

/// Pick the union's result from per-option outcomes, each run against its own
/// fork. First valid wins, then first dirty (whose issues are kept), else a
/// single `invalid_union` carrying every option's issues in option order.
fn resolve_union(
    mut outcomes: Vec<(Parsed, ParseContext)>,
    messages: &SchemaMessages,
    input: &Value,
    ctx: &mut ParseContext,
) -> Parsed {
    if let Some(i) = outcomes.iter().position(|(r, _)| r.status() == ParseStatus::Valid) {
        let (result, fork) = outcomes.swap_remove(i);
        ctx.absorb(fork);
        return result;
    }
    if let Some(i) = outcomes.iter().position(|(r, _)| r.status() == ParseStatus::Dirty) {
        trace!(option = i, "union fell back to a dirty option");
        let (result, fork) = outcomes.swap_remove(i);
        ctx.absorb(fork);
        return result;
    }

    trace!(options = outcomes.len(), "no union option matched");
    let union_errors = outcomes
        .into_iter()
        .map(|(_, fork)| ValidationError::new(fork.into_issues()))
        .collect();
    ctx.add_issue(messages, IssueData::new(IssueKind::InvalidUnion { union_errors }), input);
    Parsed::Aborted
}

pub(super) fn union_sync(
    def: &UnionDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let mut outcomes = Vec::with_capacity(def.options.len());
    for option in &def.options {
        let mut fork = ctx.fork();
        let result = parse_sync(option, input.clone(), &mut fork)?;
        if result.status() == ParseStatus::Valid {
            ctx.absorb(fork);
            return Ok(result);
        }
        outcomes.push((result, fork));
    }
    Ok(resolve_union(outcomes, messages, &input, ctx))
}

pub(super) async fn union_async(
    def: &UnionDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let mut forks: Vec<ParseContext> = def.options.iter().map(|_| ctx.fork()).collect();
    let results = join_all(
        def.options
            .iter()
            .zip(forks.iter_mut())
            .map(|(option, fork)| parse_async(option, input.clone(), fork)),
    )
    .await;

    let mut outcomes = Vec::with_capacity(results.len());
    for (result, fork) in results.into_iter().zip(forks) {
        outcomes.push((result?, fork));
    }
    Ok(resolve_union(outcomes, messages, &input, ctx))
}

// ------------------------- Discriminated union ---------------------------- //

/// Option selected by the input's discriminator value, or `None` once the
/// rejection has been recorded.
pub(super) fn select_option<'d>(
    def: &'d DiscriminatedUnionDef,
    messages: &SchemaMessages,
    input: &Value,
    ctx: &mut ParseContext,
) -> Option<&'d Schema> {
    let Value::Object(fields) = input else {
        reject_type(ctx, messages, ValueType::Object, input);
        return None;
    };
    let value = fields.get(&def.discriminator).unwrap_or(&Value::Undefined);
    let selected = Literal::from_value(value).and_then(|lit| def.option_for(&lit));
    if selected.is_none() {
        let kind = IssueKind::InvalidUnionDiscriminator { options: def.discriminator_values() };
        let data = IssueData::new(kind).at([PathSegment::from(def.discriminator.as_str())]);
        ctx.add_issue(messages, data, input);
    }
    selected
}

// ----------------------------- Intersection ------------------------------- //

/// Deep merge of both sides' outputs. On conflict returns the path, relative
/// to the intersection, where the two sides disagree.
pub(crate) fn merge_values(a: Value, b: Value) -> Result<Value, Vec<PathSegment>> {
    match (a, b) {
        (Value::Object(a), Value::Object(mut b)) => {
            let mut out = Object::new();
            for (key, left) in a {
                match b.shift_remove(&key) {
                    Some(right) => {
                        let merged = merge_values(left, right).map_err(|mut path| {
                            path.insert(0, PathSegment::Key(key.clone()));
                            path
                        })?;
                        out.insert(key, merged);
                    }
                    None => {
                        out.insert(key, left);
                    }
                }
            }
            out.extend(b);
            Ok(Value::Object(out))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(Vec::new());
            }
            let mut out = Vec::with_capacity(a.len());
            for (i, (left, right)) in a.into_iter().zip(b).enumerate() {
                let merged = merge_values(left, right).map_err(|mut path| {
                    path.insert(0, PathSegment::Index(i));
                    path
                })?;
                out.push(merged);
            }
            Ok(Value::Array(out))
        }
        (a, b) if a == b => Ok(a),
        _ => Err(Vec::new()),
    }
}

fn lookup<'v>(value: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(value, |at, segment| match (at, segment) {
        (Value::Object(members), PathSegment::Key(key)) => members.get(key),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    })
}

/// Paths (relative to `base`) where the rejecting side only complained about
/// the type of a value the accepting side produced. `None` when any of its
/// issues is something else, so a genuine input error is never masked.
fn type_conflicts(rejected: &ParseContext, accepted: &Value, base: &[PathSegment]) -> Option<Vec<Vec<PathSegment>>> {
    if rejected.issues.is_empty() {
        return None;
    }
    let mut paths: Vec<Vec<PathSegment>> = Vec::new();
    for issue in &rejected.issues {
        let IssueKind::InvalidType { received, .. } = &issue.kind else {
            return None;
        };
        if *received == ValueType::Undefined {
            return None;
        }
        let relative = issue.path.strip_prefix(base)?;
        if relative.is_empty() || lookup(accepted, relative).is_none_or(Value::is_undefined) {
            return None;
        }
        if !paths.iter().any(|p| p.as_slice() == relative) {
            paths.push(relative.to_vec());
        }
    }
    Some(paths)
}

/// Merge both sides' outcomes, each carrying the fork it ran in. A member one
/// side accepts and the other rejects by type is reported as a conflict at
/// that member instead of as the rejecting side's issue.
pub(super) fn combine(
    (left, left_ctx): (Parsed, ParseContext),
    (right, right_ctx): (Parsed, ParseContext),
    messages: &SchemaMessages,
    input: &Value,
    ctx: &mut ParseContext,
) -> Parsed {
    let conflicts = match (left.value(), right.value()) {
        (Some(accepted), None) => type_conflicts(&right_ctx, accepted, &ctx.path),
        (None, Some(accepted)) => type_conflicts(&left_ctx, accepted, &ctx.path),
        _ => None,
    };
    if let Some(paths) = conflicts {
        trace!(conflicts = paths.len(), "intersection sides disagree on member types");
        let accepting = if left.value().is_some() { left_ctx } else { right_ctx };
        ctx.absorb(accepting);
        for path in paths {
            ctx.add_issue(messages, IssueData::new(IssueKind::InvalidIntersectionTypes).at(path), input);
        }
        return Parsed::Aborted;
    }

    ctx.absorb(left_ctx);
    ctx.absorb(right_ctx);
    let status = left.status().merge(right.status());
    let (Some(a), Some(b)) = (left.into_value(), right.into_value()) else {
        return Parsed::Aborted;
    };
    match merge_values(a, b) {
        Ok(merged) => Parsed::new(status, merged),
        Err(path) => {
            ctx.add_issue(messages, IssueData::new(IssueKind::InvalidIntersectionTypes).at(path), input);
            Parsed::Aborted
        }
    }
}

pub(super) fn intersection_sync(
    def: &IntersectionDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let mut left_ctx = ctx.fork();
    let left = parse_sync(&def.left, input.clone(), &mut left_ctx)?;
    let mut right_ctx = ctx.fork();
    let right = parse_sync(&def.right, input.clone(), &mut right_ctx)?;
    Ok(combine((left, left_ctx), (right, right_ctx), messages, &input, ctx))
}

pub(super) async fn intersection_async(
    def: &IntersectionDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Result<Parsed, UsageError> {
    let mut left_ctx = ctx.fork();
    let mut right_ctx = ctx.fork();
    let (left, right) = futures::join!(
        parse_async(&def.left, input.clone(), &mut left_ctx),
        parse_async(&def.right, input.clone(), &mut right_ctx),
    );
    Ok(combine((left?, left_ctx), (right?, right_ctx), messages, &input, ctx))
}
