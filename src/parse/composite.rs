//! Structural kinds: objects, arrays, tuples, sets, maps and records.
//!
//! Each kind first inspects its input and either rejects it outright or
//! produces a [`Plan`]: the child validations to run, in declaration order,
//! plus how to assemble their results. Running the plan is left to the caller
//! so the same plan serves the synchronous and asynchronous paths.
use crate::context::ParseContext;
use crate::error_map::SchemaMessages;
use crate::issue::{Bound, IssueData, IssueKind, PathSegment, SizeOrigin};
use crate::schema::{ArrayDef, MapDef, ObjectDef, RecordDef, Schema, SetDef, SizeCheck, TupleDef, UnknownKeys};
use crate::status::{ParseStatus, Parsed};
use crate::value::{Object, Value, ValueType};

use super::reject_type;

/// One child validation. `segments` is relative to the parent's path.
pub(super) struct Job {
    pub segments: Vec<PathSegment>,
    pub schema: Schema,
    pub input: Value,
}

impl Job {
    fn new(segments: Vec<PathSegment>, schema: &Schema, input: Value) -> Self {
        Self { segments, schema: schema.clone(), input }
    }
}

pub(super) struct Member {
    key: String,
    /// Keep the key even when its output is undefined.
    keep_undefined: bool,
}

pub(super) enum Finish {
    Object {
        members: Vec<Member>,
        passthrough: Vec<(String, Value)>,
        unrecognized: Option<(Vec<String>, Value)>,
    },
    Array,
    Set,
    /// Results alternate key, value.
    Map,
    /// Results alternate key, value.
    Record { keep_undefined: bool },
}

pub(super) struct Plan {
    /// Status contributed by the parent itself (size checks and the like).
    pub status: ParseStatus,
    pub jobs: Vec<Job>,
    pub finish: Finish,
    pub messages: SchemaMessages,
}

pub(super) enum Step {
    Done(Parsed),
    Run(Plan),
}

impl Plan {
    fn new(status: ParseStatus, jobs: Vec<Job>, finish: Finish, messages: &SchemaMessages) -> Step {
        Step::Run(Plan { status, jobs, finish, messages: messages.clone() })
    }

    /// Fold child results into the parent's value. Child issues must already
    /// have been absorbed into `ctx`.
    pub(super) fn complete(self, results: Vec<Parsed>, ctx: &mut ParseContext) -> Parsed {
        let mut status = self.status;
        match self.finish {
            Finish::Object { members, passthrough, unrecognized } => {
                let mut out = Object::new();
                for (member, result) in members.into_iter().zip(results) {
                    if let Some(v) = result.fold_into(&mut status) {
                        if !v.is_undefined() || member.keep_undefined {
                            out.insert(member.key, v);
                        }
                    }
                }
                out.extend(passthrough);
                if let Some((keys, input)) = unrecognized {
                    ctx.add_issue(&self.messages, IssueData::new(IssueKind::UnrecognizedKeys { keys }), &input);
                    status.dirty();
                }
                Parsed::new(status, Value::Object(out))
            }
            Finish::Array => {
                let items = collect(results, &mut status);
                Parsed::new(status, Value::Array(items))
            }
            Finish::Set => {
                let items = collect(results, &mut status);
                Parsed::new(status, Value::Set(items))
            }
            Finish::Map => {
                let pairs = pairs(results, &mut status);
                Parsed::new(status, Value::Map(pairs))
            }
            Finish::Record { keep_undefined } => {
                let mut out = Object::new();
                for (k, v) in pairs(results, &mut status) {
                    if v.is_undefined() && !keep_undefined {
                        continue;
                    }
                    let key = match k {
                        Value::String(s) => s,
                        other => other.coerce_to_string(),
                    };
                    out.insert(key, v);
                }
                Parsed::new(status, Value::Object(out))
            }
        }
    }
}

fn collect(results: Vec<Parsed>, status: &mut ParseStatus) -> Vec<Value> {
    results.into_iter().filter_map(|r| r.fold_into(status)).collect()
}

fn pairs(results: Vec<Parsed>, status: &mut ParseStatus) -> Vec<(Value, Value)> {
    let mut out = Vec::with_capacity(results.len() / 2);
    let mut it = results.into_iter();
    while let (Some(k), Some(v)) = (it.next(), it.next()) {
        if let (Some(k), Some(v)) = (k.fold_into(status), v.fold_into(status)) {
            out.push((k, v));
        }
    }
    out
}

fn size_issue(
    check: &SizeCheck,
    kind: IssueKind,
    messages: &SchemaMessages,
    input: &Value,
    status: &mut ParseStatus,
    ctx: &mut ParseContext,
) {
    let mut data = IssueData::new(kind);
    data.message = check.message.clone();
    ctx.add_issue(messages, data, input);
    status.dirty();
}

// ------------------------------- Object ----------------------------------- //

pub(super) fn object(def: &ObjectDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Object(mut data) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Object, &input));
    };

    let mut jobs = Vec::with_capacity(def.shape.len());
    let mut members = Vec::with_capacity(def.shape.len());
    for (key, schema) in &def.shape {
        let (present, value) = match data.shift_remove(key) {
            Some(v) => (true, v),
            None => (false, Value::Undefined),
        };
        members.push(Member { key: key.clone(), keep_undefined: present && !schema.accepts_omission() });
        jobs.push(Job::new(vec![PathSegment::from(key.as_str())], schema, value));
    }

    // Whatever is left in `data` is undeclared.
    let mut passthrough = Vec::new();
    let mut unrecognized = None;
    match (&def.catchall, def.unknown_keys) {
        (Some(catchall), _) => {
            for (key, value) in data {
                members.push(Member { key: key.clone(), keep_undefined: !catchall.accepts_omission() });
                jobs.push(Job::new(vec![PathSegment::Key(key)], catchall, value));
            }
        }
        (None, UnknownKeys::Passthrough) => passthrough.extend(data),
        (None, UnknownKeys::Strict) if !data.is_empty() => {
            let keys = data.keys().cloned().collect();
            unrecognized = Some((keys, Value::Object(data)));
        }
        (None, UnknownKeys::Strict | UnknownKeys::Strip) => {}
    }

    Plan::new(ParseStatus::Valid, jobs, Finish::Object { members, passthrough, unrecognized }, messages)
}

// ------------------------------ Sequences --------------------------------- //

pub(super) fn array(def: &ArrayDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Array(items) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Array, &input));
    };

    let mut status = ParseStatus::Valid;
    let len = items.len();
    let mut failed = Vec::new();
    if let Some(check) = &def.exact {
        if len > check.value {
            failed.push((check, IssueKind::TooBig {
                maximum: Bound::from(check.value),
                inclusive: true,
                exact: true,
                origin: SizeOrigin::Array,
            }));
        } else if len < check.value {
            failed.push((check, IssueKind::TooSmall {
                minimum: Bound::from(check.value),
                inclusive: true,
                exact: true,
                origin: SizeOrigin::Array,
            }));
        }
    }
    if let Some(check) = def.min.as_ref().filter(|c| len < c.value) {
        failed.push((check, IssueKind::TooSmall {
            minimum: Bound::from(check.value),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Array,
        }));
    }
    if let Some(check) = def.max.as_ref().filter(|c| len > c.value) {
        failed.push((check, IssueKind::TooBig {
            maximum: Bound::from(check.value),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Array,
        }));
    }
    if !failed.is_empty() {
        let shown = Value::Array(items.clone());
        for (check, kind) in failed {
            size_issue(check, kind, messages, &shown, &mut status, ctx);
        }
    }

    let jobs = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| Job::new(vec![PathSegment::Index(i)], &def.element, item))
        .collect();
    Plan::new(status, jobs, Finish::Array, messages)
}

pub(super) fn tuple(def: &TupleDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Array(items) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Array, &input));
    };

    let arity = def.items.len();
    if items.len() < arity {
        let kind = IssueKind::TooSmall {
            minimum: Bound::from(arity),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Array,
        };
        ctx.add_issue(messages, IssueData::new(kind), &Value::Array(items));
        return Step::Done(Parsed::Aborted);
    }
    let mut status = ParseStatus::Valid;
    if def.rest.is_none() && items.len() > arity {
        let kind = IssueKind::TooBig {
            maximum: Bound::from(arity),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Array,
        };
        ctx.add_issue(messages, IssueData::new(kind), &Value::Array(items.clone()));
        status.dirty();
    }

    let jobs = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let schema = def.items.get(i).or(def.rest.as_ref())?;
            Some(Job::new(vec![PathSegment::Index(i)], schema, item))
        })
        .collect();
    Plan::new(status, jobs, Finish::Array, messages)
}

pub(super) fn set(def: &SetDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Set(items) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Set, &input));
    };

    let mut status = ParseStatus::Valid;
    let mut failed = Vec::new();
    if let Some(check) = def.min.as_ref().filter(|c| items.len() < c.value) {
        failed.push((check, IssueKind::TooSmall {
            minimum: Bound::from(check.value),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Set,
        }));
    }
    if let Some(check) = def.max.as_ref().filter(|c| items.len() > c.value) {
        failed.push((check, IssueKind::TooBig {
            maximum: Bound::from(check.value),
            inclusive: true,
            exact: false,
            origin: SizeOrigin::Set,
        }));
    }
    if !failed.is_empty() {
        let shown = Value::Set(items.clone());
        for (check, kind) in failed {
            size_issue(check, kind, messages, &shown, &mut status, ctx);
        }
    }

    let jobs = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| Job::new(vec![PathSegment::Index(i)], &def.value, item))
        .collect();
    Plan::new(status, jobs, Finish::Set, messages)
}

// --------------------------- Keyed collections ---------------------------- //

pub(super) fn map(def: &MapDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Map(entries) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Map, &input));
    };

    let mut jobs = Vec::with_capacity(entries.len() * 2);
    for (i, (k, v)) in entries.into_iter().enumerate() {
        jobs.push(Job::new(vec![PathSegment::Index(i), PathSegment::from("key")], &def.key, k));
        jobs.push(Job::new(vec![PathSegment::Index(i), PathSegment::from("value")], &def.value, v));
    }
    Plan::new(ParseStatus::Valid, jobs, Finish::Map, messages)
}

pub(super) fn record(def: &RecordDef, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Step {
    let Value::Object(entries) = input else {
        return Step::Done(reject_type(ctx, messages, ValueType::Object, &input));
    };

    let mut jobs = Vec::with_capacity(entries.len() * 2);
    for (k, v) in entries {
        let at = vec![PathSegment::from(k.as_str())];
        jobs.push(Job::new(at.clone(), &def.key, Value::String(k)));
        jobs.push(Job::new(at, &def.value, v));
    }
    let keep_undefined = !def.value.accepts_omission();
    Plan::new(ParseStatus::Valid, jobs, Finish::Record { keep_undefined }, messages)
}
