//! Message resolution.
//!
//! An issue's message is produced by folding resolvers over it: the built-in
//! English table first, then the per-call locale, then the schema's own map,
//! then the per-call contextual map. Each resolver sees the previous result as
//! `default_error`. An explicit message on the issue wins outright.
use std::fmt;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::issue::{Bound, Issue, IssueData, IssueKind, PathSegment, SizeOrigin, StringValidation};
use crate::value::{Literal, Value, ValueType};

pub struct ErrorMapCtx<'a> {
    pub default_error: &'a str,
    pub data: &'a Value,
}

type MapFn = dyn Fn(&Issue, &ErrorMapCtx<'_>) -> String + Send + Sync;

/// A replaceable message resolver.
#[derive(Clone)]
pub struct ErrorMap(Arc<MapFn>);

impl ErrorMap {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Issue, &ErrorMapCtx<'_>) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn resolve(&self, issue: &Issue, ctx: &ErrorMapCtx<'_>) -> String {
        (self.0)(issue, ctx)
    }
}

impl fmt::Debug for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorMap")
    }
}

/// Schema-local message configuration.
#[derive(Debug, Clone, Default)]
pub struct SchemaMessages {
    pub error_map: Option<ErrorMap>,
    pub required_error: Option<String>,
    pub invalid_type_error: Option<String>,
}

impl SchemaMessages {
    pub fn is_empty(&self) -> bool {
        self.error_map.is_none() && self.required_error.is_none() && self.invalid_type_error.is_none()
    }

    fn resolve(&self, issue: &Issue, ctx: &ErrorMapCtx<'_>) -> String {
        if let Some(map) = &self.error_map {
            return map.resolve(issue, ctx);
        }
        if !matches!(issue.kind, IssueKind::InvalidType { .. }) {
            return ctx.default_error.to_string();
        }
        let custom = if ctx.data.is_undefined() {
            self.required_error.as_ref()
        } else {
            self.invalid_type_error.as_ref()
        };
        custom.cloned().unwrap_or_else(|| ctx.default_error.to_string())
    }
}

/// Resolvers active for one issue, outermost last.
pub(crate) struct Resolvers<'a> {
    pub locale: Option<&'a ErrorMap>,
    pub schema: Option<&'a SchemaMessages>,
    pub contextual: Option<&'a ErrorMap>,
}

/// Attach an absolute path and a message to raw issue data.
pub(crate) fn make_issue(
    data: IssueData,
    base: &[PathSegment],
    input: &Value,
    resolvers: &Resolvers<'_>,
) -> Issue {
    let mut path = base.to_vec();
    path.extend(data.path);
    let mut issue = Issue { kind: data.kind, path, message: String::new() };
    if let Some(message) = data.message {
        issue.message = message;
        return issue;
    }

    let mut message = default_message(&issue);
    if let Some(map) = resolvers.locale {
        message = map.resolve(&issue, &ErrorMapCtx { default_error: &message, data: input });
    }
    if let Some(schema) = resolvers.schema {
        message = schema.resolve(&issue, &ErrorMapCtx { default_error: &message, data: input });
    }
    if let Some(map) = resolvers.contextual {
        message = map.resolve(&issue, &ErrorMapCtx { default_error: &message, data: input });
    }
    issue.message = message;
    issue
}

// ------------------------------- Defaults --------------------------------- //

fn join_values(values: &[Literal], separator: &str) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(separator)
}

fn date_bound(bound: &Bound) -> String {
    let millis = match bound {
        Bound::Number(n) => *n as i64,
        Bound::BigInt(i) => *i as i64,
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| bound.to_string())
}

/// Built-in English message for an issue.
pub fn default_message(issue: &Issue) -> String {
    match &issue.kind {
        IssueKind::InvalidType { expected, received } => {
            if *received == ValueType::Undefined {
                "Required".into()
            } else {
                format!("Expected {expected}, received {received}")
            }
        }
        IssueKind::InvalidLiteral { expected, .. } => {
            let shown = match expected {
                Literal::Undefined => "undefined".to_string(),
                Literal::BigInt(i) => i.to_string(),
                other => other.to_json().to_string(),
            };
            format!("Invalid literal value, expected {shown}")
        }
        IssueKind::UnrecognizedKeys { keys } => {
            let keys = keys.iter().map(|k| format!("'{k}'")).collect::<Vec<_>>().join(", ");
            format!("Unrecognized key(s) in object: {keys}")
        }
        IssueKind::InvalidUnion { .. } => "Invalid input".into(),
        IssueKind::InvalidUnionDiscriminator { options } => {
            format!("Invalid discriminator value. Expected {}", join_values(options, " | "))
        }
        IssueKind::InvalidEnumValue { options, received } => format!(
            "Invalid enum value. Expected {}, received '{}'",
            join_values(options, " | "),
            received
        ),
        IssueKind::InvalidArguments { .. } => "Invalid function arguments".into(),
        IssueKind::InvalidReturnType { .. } => "Invalid function return type".into(),
        IssueKind::InvalidDate => "Invalid date".into(),
        IssueKind::InvalidString { validation } => match validation {
            StringValidation::Includes { includes, position } => {
                let mut m = format!("Invalid input: must include \"{includes}\"");
                if let Some(p) = position {
                    m.push_str(&format!(" at one or more positions greater than or equal to {p}"));
                }
                m
            }
            StringValidation::StartsWith(s) => format!("Invalid input: must start with \"{s}\""),
            StringValidation::EndsWith(s) => format!("Invalid input: must end with \"{s}\""),
            StringValidation::Regex => "Invalid".into(),
            other => format!("Invalid {}", other.name()),
        },
        IssueKind::TooSmall { minimum, inclusive, exact, origin } => match origin {
            SizeOrigin::Array => format!(
                "Array must contain {} {minimum} element(s)",
                if *exact { "exactly" } else if *inclusive { "at least" } else { "more than" }
            ),
            SizeOrigin::String => format!(
                "String must contain {} {minimum} character(s)",
                if *exact { "exactly" } else if *inclusive { "at least" } else { "over" }
            ),
            SizeOrigin::Number | SizeOrigin::BigInt => format!(
                "Number must be {}{minimum}",
                if *exact {
                    "exactly equal to "
                } else if *inclusive {
                    "greater than or equal to "
                } else {
                    "greater than "
                }
            ),
            SizeOrigin::Set => format!(
                "Set must contain {} {minimum} element(s)",
                if *exact { "exactly" } else if *inclusive { "at least" } else { "more than" }
            ),
            SizeOrigin::Date => format!(
                "Date must be {}{}",
                if *exact {
                    "exactly equal to "
                } else if *inclusive {
                    "greater than or equal to "
                } else {
                    "greater than "
                },
                date_bound(minimum)
            ),
        },
        IssueKind::TooBig { maximum, inclusive, exact, origin } => match origin {
            SizeOrigin::Array => format!(
                "Array must contain {} {maximum} element(s)",
                if *exact { "exactly" } else if *inclusive { "at most" } else { "less than" }
            ),
            SizeOrigin::String => format!(
                "String must contain {} {maximum} character(s)",
                if *exact { "exactly" } else if *inclusive { "at most" } else { "under" }
            ),
            SizeOrigin::Number => format!(
                "Number must be {} {maximum}",
                if *exact { "exactly" } else if *inclusive { "less than or equal to" } else { "less than" }
            ),
            SizeOrigin::BigInt => format!(
                "BigInt must be {} {maximum}",
                if *exact { "exactly" } else if *inclusive { "less than or equal to" } else { "less than" }
            ),
            SizeOrigin::Set => format!(
                "Set must contain {} {maximum} element(s)",
                if *exact { "exactly" } else if *inclusive { "at most" } else { "less than" }
            ),
            SizeOrigin::Date => format!(
                "Date must be {} {}",
                if *exact { "exactly" } else if *inclusive { "smaller than or equal to" } else { "smaller than" },
                date_bound(maximum)
            ),
        },
        IssueKind::Custom { .. } => "Invalid input".into(),
        IssueKind::InvalidIntersectionTypes => "Intersection results could not be merged".into(),
        IssueKind::NotMultipleOf { multiple_of } => format!("Number must be a multiple of {multiple_of}"),
        IssueKind::NotFinite => "Number must be finite".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: IssueKind) -> IssueData {
        IssueData::new(kind)
    }

    #[test]
    fn undefined_input_reads_as_required() {
        let issue = make_issue(
            raw(IssueKind::invalid_type(ValueType::String, ValueType::Undefined)),
            &[],
            &Value::Undefined,
            &Resolvers { locale: None, schema: None, contextual: None },
        );
        assert_eq!(issue.message, "Required");
    }

    #[test]
    fn resolvers_fold_outward() {
        let locale = ErrorMap::new(|_, ctx| format!("[locale] {}", ctx.default_error));
        let contextual = ErrorMap::new(|_, ctx| format!("[ctx] {}", ctx.default_error));
        let schema = SchemaMessages {
            invalid_type_error: Some("not a string".into()),
            ..SchemaMessages::default()
        };
        let issue = make_issue(
            raw(IssueKind::invalid_type(ValueType::String, ValueType::Number)),
            &[PathSegment::from("a")],
            &Value::from(1),
            &Resolvers { locale: Some(&locale), schema: Some(&schema), contextual: Some(&contextual) },
        );
        assert_eq!(issue.message, "[ctx] not a string");
        assert_eq!(issue.path, vec![PathSegment::from("a")]);
    }

    #[test]
    fn explicit_message_wins() {
        let contextual = ErrorMap::new(|_, _| "ignored".into());
        let issue = make_issue(
            IssueData::custom("mine").at(["x"]),
            &[PathSegment::from("root")],
            &Value::Null,
            &Resolvers { locale: None, schema: None, contextual: Some(&contextual) },
        );
        assert_eq!(issue.message, "mine");
        assert_eq!(issue.path, vec![PathSegment::from("root"), PathSegment::from("x")]);
    }

    #[test]
    fn size_messages() {
        let small = Issue {
            kind: IssueKind::TooSmall {
                minimum: Bound::from(4usize),
                inclusive: true,
                exact: false,
                origin: SizeOrigin::Array,
            },
            path: vec![],
            message: String::new(),
        };
        assert_eq!(default_message(&small), "Array must contain at least 4 element(s)");
        let big = Issue {
            kind: IssueKind::TooBig {
                maximum: Bound::Number(10.0),
                inclusive: false,
                exact: false,
                origin: SizeOrigin::Number,
            },
            path: vec![],
            message: String::new(),
        };
        assert_eq!(default_message(&big), "Number must be less than 10");
    }

    #[test]
    fn enum_message_lists_options() {
        let issue = Issue {
            kind: IssueKind::InvalidEnumValue {
                options: vec![Literal::from("a"), Literal::from("b")],
                received: Value::from("c"),
            },
            path: vec![],
            message: String::new(),
        };
        assert_eq!(default_message(&issue), "Invalid enum value. Expected 'a' | 'b', received 'c'");
    }
}
