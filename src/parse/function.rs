//! Function and promise kinds. Both validate lazily: the node itself only
//! checks the runtime tag and hands back a wrapper that validates when the
//! function is called or the promise resolved.
use crate::context::{ParseContext, ParseMode, ParseOptions};
use crate::error::Error;
use crate::error_map::SchemaMessages;
use crate::issue::{IssueData, IssueKind, ValidationError};
use crate::schema::{FunctionDef, Schema, SchemaKind};
use crate::status::Parsed;
use crate::value::{FunctionValue, PromiseValue, Value, ValueType};

use super::{reject_type, SafeParseResult};

pub(super) fn function(
    def: &FunctionDef,
    messages: &SchemaMessages,
    input: Value,
    ctx: &mut ParseContext,
) -> Parsed {
    match input {
        Value::Function(target) => Parsed::Valid(Value::Function(wrap_function(def, messages, ctx.options(), target))),
        other => reject_type(ctx, messages, ValueType::Function, &other),
    }
}

/// One-issue error raised at the wrapper's own path.
fn call_error(kind: IssueKind, messages: &SchemaMessages, options: &ParseOptions, input: &Value) -> Error {
    let mut ctx = ParseContext::new(options, ParseMode::Sync);
    ctx.add_issue(messages, IssueData::new(kind), input);
    Error::Invalid(ValidationError::new(ctx.into_issues()))
}

fn into_args(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Wrap `target` so arguments are validated before the call and the result
/// after it. When the declared return schema is a promise, the wrapper returns
/// a promise and validates asynchronously.
pub(crate) fn wrap_function(
    def: &FunctionDef,
    messages: &SchemaMessages,
    options: ParseOptions,
    target: FunctionValue,
) -> FunctionValue {
    let args = def.args.clone();
    let messages = messages.clone();
    // Nested validations report paths relative to the arguments and result.
    let inner = ParseOptions { path: Vec::new(), ..options.clone() };

    if let SchemaKind::Promise(returns) = def.returns.kind() {
        let returns = returns.clone();
        return FunctionValue::new(move |call_args| {
            let (args, returns, target) = (args.clone(), returns.clone(), target.clone());
            let (messages, options, inner) = (messages.clone(), options.clone(), inner.clone());
            let pending = async move {
                let input = Value::Array(call_args);
                let parsed = match args.safe_parse_async_with(input.clone(), &inner).await? {
                    SafeParseResult::Success(v) => v,
                    SafeParseResult::Failure(arguments_error) => {
                        let kind = IssueKind::InvalidArguments { arguments_error };
                        return Err(call_error(kind, &messages, &options, &input));
                    }
                };
                let result = match target.call(into_args(parsed))? {
                    Value::Promise(p) => p.resolve().await?,
                    other => other,
                };
                match returns.safe_parse_async_with(result.clone(), &inner).await? {
                    SafeParseResult::Success(v) => Ok(v),
                    SafeParseResult::Failure(return_type_error) => {
                        let kind = IssueKind::InvalidReturnType { return_type_error };
                        Err(call_error(kind, &messages, &options, &result))
                    }
                }
            };
            Ok(Value::Promise(PromiseValue::new(pending)))
        });
    }

    let returns = def.returns.clone();
    FunctionValue::new(move |call_args| {
        let input = Value::Array(call_args);
        let parsed = match args.safe_parse_with(input.clone(), &inner)? {
            SafeParseResult::Success(v) => v,
            SafeParseResult::Failure(arguments_error) => {
                let kind = IssueKind::InvalidArguments { arguments_error };
                return Err(call_error(kind, &messages, &options, &input));
            }
        };
        let result = target.call(into_args(parsed))?;
        match returns.safe_parse_with(result.clone(), &inner)? {
            SafeParseResult::Success(v) => Ok(v),
            SafeParseResult::Failure(return_type_error) => {
                let kind = IssueKind::InvalidReturnType { return_type_error };
                Err(call_error(kind, &messages, &options, &result))
            }
        }
    })
}

/// Synchronous parses require an actual promise; asynchronous ones lift plain
/// values. Either way the output is a promise of the validated value.
pub(super) fn promise(inner: &Schema, messages: &SchemaMessages, input: Value, ctx: &mut ParseContext) -> Parsed {
    let pending = match input {
        Value::Promise(p) => p,
        other if ctx.mode() == ParseMode::Async => PromiseValue::resolved(other),
        other => return reject_type(ctx, messages, ValueType::Promise, &other),
    };
    let inner = inner.clone();
    let options = ctx.options();
    Parsed::Valid(Value::Promise(PromiseValue::new(async move {
        let value = pending.resolve().await?;
        inner.parse_async_with(value, &options).await
    })))
}
