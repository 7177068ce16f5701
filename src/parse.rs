//! The validation engine.
//!
//! [`parse_sync`] and [`parse_async`] walk a schema against an input and
//! return a [`Parsed`] per node, recording issues on the [`ParseContext`].
//! Both share every per-kind routine; they differ only in how children are
//! scheduled. Each child runs against its own forked context and the parent
//! absorbs the forks in declaration order, so the issue list comes out the same
//! no matter which child finishes first.
mod composite;
mod effects;
mod formats;
mod function;
mod primitive;
mod union;

use std::mem;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, trace};

use crate::context::{ParseContext, ParseMode, ParseOptions};
use crate::error::{Error, UsageError};
use crate::error_map::SchemaMessages;
use crate::issue::{IssueData, IssueKind, ValidationError};
use crate::schema::{CatchCtx, CatchDef, Schema, SchemaKind};
use crate::status::Parsed;
use crate::value::{Value, ValueType};

use composite::Step;

pub(crate) use function::wrap_function;

/// Record an `invalid_type` issue for `input` and abort the node.
pub(super) fn reject_type(ctx: &mut ParseContext, messages: &SchemaMessages, expected: ValueType, input: &Value) -> Parsed {
    let kind = IssueKind::invalid_type(expected, input.value_type());
    ctx.add_issue(messages, IssueData::new(kind), input);
    Parsed::Aborted
}

/// A failed inner result is swapped for the fallback; its issues are dropped.
fn recover(def: &CatchDef, result: Parsed, fork: ParseContext, input: Value, ctx: &mut ParseContext) -> Parsed {
    if let Parsed::Valid(_) = result {
        ctx.absorb(fork);
        return result;
    }
    let error = ValidationError::new(fork.into_issues());
    trace!(issues = error.len(), "catch replaced a failed result");
    Parsed::Valid(def.value.get(&CatchCtx { error, input }))
}

// -------------------------------- Sync ------------------------------------ //

fn run_sync(step: Step, ctx: &mut ParseContext) -> Result<Parsed, UsageError> {
    let mut plan = match step {
        Step::Done(parsed) => return Ok(parsed),
        Step::Run(plan) => plan,
    };
    let jobs = mem::take(&mut plan.jobs);
    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let mut child = ctx.child(&job.segments);
        results.push(parse_sync(&job.schema, job.input, &mut child)?);
        ctx.absorb(child);
    }
    Ok(plan.complete(results, ctx))
}

pub(crate) fn parse_sync(schema: &Schema, input: Value, ctx: &mut ParseContext) -> Result<Parsed, UsageError> {
    let messages = schema.messages();
    let parsed = match schema.kind() {
        SchemaKind::String(def) => primitive::string(def, messages, input, ctx),
        SchemaKind::Number(def) => primitive::number(def, messages, input, ctx),
        SchemaKind::BigInt(def) => primitive::bigint(def, messages, input, ctx),
        SchemaKind::Boolean { coerce } => primitive::boolean(*coerce, messages, input, ctx),
        SchemaKind::Date(def) => primitive::date(def, messages, input, ctx),
        SchemaKind::NaN => primitive::tagged(ValueType::Nan, messages, input, ctx),
        SchemaKind::Null => primitive::tagged(ValueType::Null, messages, input, ctx),
        SchemaKind::Undefined => primitive::tagged(ValueType::Undefined, messages, input, ctx),
        SchemaKind::Void => primitive::tagged(ValueType::Void, messages, input, ctx),
        SchemaKind::Never => primitive::tagged(ValueType::Never, messages, input, ctx),
        SchemaKind::Any | SchemaKind::Unknown => Parsed::Valid(input),
        SchemaKind::Literal(expected) => primitive::literal(expected, messages, input, ctx),
        SchemaKind::Enum(def) => primitive::enumeration(def, messages, input, ctx),
        SchemaKind::NativeEnum(def) => primitive::native_enum(def, messages, input, ctx),
        SchemaKind::Function(def) => function::function(def, messages, input, ctx),
        SchemaKind::Promise(inner) => function::promise(inner, messages, input, ctx),

        SchemaKind::Object(def) => return run_sync(composite::object(def, messages, input, ctx), ctx),
        SchemaKind::Array(def) => return run_sync(composite::array(def, messages, input, ctx), ctx),
        SchemaKind::Tuple(def) => return run_sync(composite::tuple(def, messages, input, ctx), ctx),
        SchemaKind::Set(def) => return run_sync(composite::set(def, messages, input, ctx), ctx),
        SchemaKind::Map(def) => return run_sync(composite::map(def, messages, input, ctx), ctx),
        SchemaKind::Record(def) => return run_sync(composite::record(def, messages, input, ctx), ctx),

        SchemaKind::Union(def) => return union::union_sync(def, messages, input, ctx),
        SchemaKind::DiscriminatedUnion(def) => match union::select_option(def, messages, &input, ctx) {
            Some(option) => return parse_sync(option, input, ctx),
            None => Parsed::Aborted,
        },
        SchemaKind::Intersection(def) => return union::intersection_sync(def, messages, input, ctx),
        SchemaKind::Effects(def) => return effects::effects_sync(def, messages, input, ctx),
        SchemaKind::Lazy(def) => return parse_sync(def.schema(), input, ctx),

        SchemaKind::Optional(inner) => match input {
            Value::Undefined => Parsed::Valid(Value::Undefined),
            other => return parse_sync(inner, other, ctx),
        },
        SchemaKind::Nullable(inner) => match input {
            Value::Null => Parsed::Valid(Value::Null),
            other => return parse_sync(inner, other, ctx),
        },
        SchemaKind::Default(def) => {
            let input = if input.is_undefined() { def.value.get() } else { input };
            return parse_sync(&def.inner, input, ctx);
        }
        SchemaKind::Catch(def) => {
            let mut fork = ctx.fork();
            let result = parse_sync(&def.inner, input.clone(), &mut fork)?;
            recover(def, result, fork, input, ctx)
        }
        SchemaKind::Pipeline(def) => match parse_sync(&def.input, input, ctx)? {
            Parsed::Valid(v) => return parse_sync(&def.output, v, ctx),
            other => other,
        },
    };
    Ok(parsed)
}

// -------------------------------- Async ----------------------------------- //

async fn run_async(step: Step, ctx: &mut ParseContext) -> Result<Parsed, UsageError> {
    let mut plan = match step {
        Step::Done(parsed) => return Ok(parsed),
        Step::Run(plan) => plan,
    };
    let jobs = mem::take(&mut plan.jobs);
    let mut children: Vec<ParseContext> = jobs.iter().map(|job| ctx.child(&job.segments)).collect();
    let outcomes = join_all(
        jobs.into_iter()
            .zip(children.iter_mut())
            .map(|(job, child)| async move { parse_async(&job.schema, job.input, child).await }),
    )
    .await;

    let mut results = Vec::with_capacity(outcomes.len());
    for (outcome, child) in outcomes.into_iter().zip(children) {
        results.push(outcome?);
        ctx.absorb(child);
    }
    Ok(plan.complete(results, ctx))
}

pub(crate) fn parse_async<'a>(
    schema: &'a Schema,
    input: Value,
    ctx: &'a mut ParseContext,
) -> BoxFuture<'a, Result<Parsed, UsageError>> {
    async move {
        let messages = schema.messages();
        let parsed = match schema.kind() {
            SchemaKind::String(_)
            | SchemaKind::Number(_)
            | SchemaKind::BigInt(_)
            | SchemaKind::Boolean { .. }
            | SchemaKind::Date(_)
            | SchemaKind::NaN
            | SchemaKind::Null
            | SchemaKind::Undefined
            | SchemaKind::Void
            | SchemaKind::Never
            | SchemaKind::Any
            | SchemaKind::Unknown
            | SchemaKind::Literal(_)
            | SchemaKind::Enum(_)
            | SchemaKind::NativeEnum(_)
            | SchemaKind::Function(_)
            | SchemaKind::Promise(_) => return parse_sync(schema, input, ctx),

            SchemaKind::Object(def) => return run_async(composite::object(def, messages, input, ctx), ctx).await,
            SchemaKind::Array(def) => return run_async(composite::array(def, messages, input, ctx), ctx).await,
            SchemaKind::Tuple(def) => return run_async(composite::tuple(def, messages, input, ctx), ctx).await,
            SchemaKind::Set(def) => return run_async(composite::set(def, messages, input, ctx), ctx).await,
            SchemaKind::Map(def) => return run_async(composite::map(def, messages, input, ctx), ctx).await,
            SchemaKind::Record(def) => return run_async(composite::record(def, messages, input, ctx), ctx).await,

            SchemaKind::Union(def) => return union::union_async(def, messages, input, ctx).await,
            SchemaKind::DiscriminatedUnion(def) => match union::select_option(def, messages, &input, ctx) {
                Some(option) => return parse_async(option, input, ctx).await,
                None => Parsed::Aborted,
            },
            SchemaKind::Intersection(def) => return union::intersection_async(def, messages, input, ctx).await,
            SchemaKind::Effects(def) => return effects::effects_async(def, messages, input, ctx).await,
            SchemaKind::Lazy(def) => return parse_async(def.schema(), input, ctx).await,

            SchemaKind::Optional(inner) => match input {
                Value::Undefined => Parsed::Valid(Value::Undefined),
                other => return parse_async(inner, other, ctx).await,
            },
            SchemaKind::Nullable(inner) => match input {
                Value::Null => Parsed::Valid(Value::Null),
                other => return parse_async(inner, other, ctx).await,
            },
            SchemaKind::Default(def) => {
                let input = if input.is_undefined() { def.value.get() } else { input };
                return parse_async(&def.inner, input, ctx).await;
            }
            SchemaKind::Catch(def) => {
                let mut fork = ctx.fork();
                let result = parse_async(&def.inner, input.clone(), &mut fork).await?;
                recover(def, result, fork, input, ctx)
            }
            SchemaKind::Pipeline(def) => match parse_async(&def.input, input, ctx).await? {
                Parsed::Valid(v) => return parse_async(&def.output, v, ctx).await,
                other => other,
            },
        };
        Ok(parsed)
    }
    .boxed()
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Outcome of a `safe_parse*` call. Data problems never surface as `Err`.
#[derive(Debug, Clone)]
pub enum SafeParseResult {
    Success(Value),
    Failure(ValidationError),
}

impl SafeParseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SafeParseResult::Success(_))
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            SafeParseResult::Success(v) => Some(v),
            SafeParseResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            SafeParseResult::Success(_) => None,
            SafeParseResult::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<Value, ValidationError> {
        match self {
            SafeParseResult::Success(v) => Ok(v),
            SafeParseResult::Failure(err) => Err(err),
        }
    }
}

fn settle(schema: &Schema, parsed: Parsed, ctx: ParseContext) -> SafeParseResult {
    match parsed {
        Parsed::Valid(v) => {
            debug!(schema = %schema.tag(), "parse succeeded");
            SafeParseResult::Success(v)
        }
        other => {
            let error = ValidationError::new(ctx.into_issues());
            debug!(schema = %schema.tag(), status = ?other.status(), issues = error.len(), "parse failed");
            SafeParseResult::Failure(error)
        }
    }
}

impl Schema {
    /// Validate `input`, returning the output value or every issue found.
    pub fn parse(&self, input: impl Into<Value>) -> Result<Value, Error> {
        self.parse_with(input, &ParseOptions::default())
    }

    pub fn parse_with(&self, input: impl Into<Value>, options: &ParseOptions) -> Result<Value, Error> {
        Ok(self.safe_parse_with(input, options)?.into_result()?)
    }

    /// Like [`Schema::parse`], but validation failures come back as data. The
    /// `Err` side is reserved for misuse, such as an asynchronous effect in a
    /// synchronous parse.
    pub fn safe_parse(&self, input: impl Into<Value>) -> Result<SafeParseResult, UsageError> {
        self.safe_parse_with(input, &ParseOptions::default())
    }

    pub fn safe_parse_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<SafeParseResult, UsageError> {
        let mut ctx = ParseContext::new(options, ParseMode::Sync);
        let parsed = parse_sync(self, input.into(), &mut ctx)?;
        Ok(settle(self, parsed, ctx))
    }

    pub async fn parse_async(&self, input: impl Into<Value>) -> Result<Value, Error> {
        self.parse_async_with(input, &ParseOptions::default()).await
    }

    pub async fn parse_async_with(&self, input: impl Into<Value>, options: &ParseOptions) -> Result<Value, Error> {
        Ok(self.safe_parse_async_with(input, options).await?.into_result()?)
    }

    pub async fn safe_parse_async(&self, input: impl Into<Value>) -> Result<SafeParseResult, UsageError> {
        self.safe_parse_async_with(input, &ParseOptions::default()).await
    }

    pub async fn safe_parse_async_with(
        &self,
        input: impl Into<Value>,
        options: &ParseOptions,
    ) -> Result<SafeParseResult, UsageError> {
        let input = input.into();
        let mut ctx = ParseContext::new(options, ParseMode::Async);
        let parsed = parse_async(self, input, &mut ctx).await?;
        Ok(settle(self, parsed, ctx))
    }

    /// Whether undefined passes this schema.
    pub fn is_optional(&self) -> bool {
        matches!(self.safe_parse(Value::Undefined), Ok(SafeParseResult::Success(_)))
    }

    /// Whether null passes this schema.
    pub fn is_nullable(&self) -> bool {
        matches!(self.safe_parse(Value::Null), Ok(SafeParseResult::Success(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueCode, PathSegment};
    use crate::schema::{array, number, object, string, SchemaExt};

    fn codes(err: &ValidationError) -> Vec<IssueCode> {
        err.issues().iter().map(|i| i.code()).collect()
    }

    #[test]
    fn nested_issue_paths_are_absolute() {
        let s: Schema = object([("tags", Schema::from(array(string())))]).into();
        let input = Value::object([("tags", Value::from(vec![Value::from("a"), Value::from(1)]))]);
        let err = s.safe_parse(input).unwrap().error().cloned().unwrap();
        assert_eq!(err.issues()[0].path, vec![PathSegment::from("tags"), PathSegment::from(1usize)]);
    }

    #[test]
    fn options_path_prefixes_every_issue() {
        let options = ParseOptions::new().with_path(["root"]);
        let err = Schema::from(string()).safe_parse_with(Value::from(1), &options).unwrap();
        assert_eq!(err.error().unwrap().issues()[0].path, vec![PathSegment::from("root")]);
    }

    #[test]
    fn catch_swallows_issues() {
        let s = number().catch(0);
        assert_eq!(s.parse("nope").unwrap(), Value::from(0));
        let seen = number().catch_with(|ctx| Value::from(ctx.error.len() as i64));
        assert_eq!(seen.parse("x").unwrap(), Value::from(1));
    }

    #[test]
    fn pipeline_stops_when_the_first_stage_fails() {
        let s = string().transform(|v| Value::from(v.coerce_to_number())).pipe(number().int());
        assert_eq!(s.parse("12").unwrap(), Value::from(12));
        let err = s.safe_parse(Value::from(3)).unwrap();
        assert_eq!(codes(err.error().unwrap()), vec![IssueCode::InvalidType]);
    }

    #[test]
    fn default_fills_only_undefined() {
        let s = string().default("anon");
        assert_eq!(s.parse(Value::Undefined).unwrap(), Value::from("anon"));
        assert!(s.safe_parse(Value::Null).unwrap().error().is_some());
    }

    #[test]
    fn optionality_is_observed_through_parsing() {
        assert!(string().optional().is_optional());
        assert!(!Schema::from(string()).is_optional());
        assert!(string().nullish().is_nullable());
        assert!(string().default("x").is_optional());
    }

    #[tokio::test]
    async fn async_entry_points_lift_promises() {
        let s = crate::schema::promise(number());
        let out = s.parse_async(Value::from(5)).await.unwrap();
        let Value::Promise(p) = out else { panic!("expected a promise") };
        assert_eq!(p.resolve().await.unwrap(), Value::from(5));
    }
}
