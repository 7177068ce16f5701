//! Issue records and the aggregate [`ValidationError`].
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Map};

use crate::value::{format_number, Literal, Value, ValueType};

// ————————————————————————————————————————————————————————————————————————————
// PATHS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PathSegment::Key(k) => json!(k),
            PathSegment::Index(i) => json!(i),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self {
        PathSegment::Key(k)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// Dotted rendering used in human-readable output: `a.b.0`.
pub fn display_path(path: &[PathSegment]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

// ————————————————————————————————————————————————————————————————————————————
// PAYLOADS
// ————————————————————————————————————————————————————————————————————————————

/// What a size issue was measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOrigin {
    Array,
    String,
    Number,
    BigInt,
    Set,
    Date,
}

impl SizeOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeOrigin::Array => "array",
            SizeOrigin::String => "string",
            SizeOrigin::Number => "number",
            SizeOrigin::BigInt => "bigint",
            SizeOrigin::Set => "set",
            SizeOrigin::Date => "date",
        }
    }
}

/// Numeric bound of a size issue. Date bounds are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Number(f64),
    BigInt(i128),
}

impl Bound {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Bound::Number(n) => Value::Number(*n).to_json(),
            Bound::BigInt(i) => Value::BigInt(*i).to_json(),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => f.write_str(&format_number(*n)),
            Bound::BigInt(i) => write!(f, "{i}"),
        }
    }
}

impl From<usize> for Bound {
    fn from(n: usize) -> Self {
        Bound::Number(n as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringValidation {
    Email,
    Url,
    Emoji,
    Uuid,
    Cuid,
    Cuid2,
    Ulid,
    Regex,
    Datetime,
    Ip,
    Includes { includes: String, position: Option<usize> },
    StartsWith(String),
    EndsWith(String),
}

impl StringValidation {
    pub fn name(&self) -> &'static str {
        match self {
            StringValidation::Email => "email",
            StringValidation::Url => "url",
            StringValidation::Emoji => "emoji",
            StringValidation::Uuid => "uuid",
            StringValidation::Cuid => "cuid",
            StringValidation::Cuid2 => "cuid2",
            StringValidation::Ulid => "ulid",
            StringValidation::Regex => "regex",
            StringValidation::Datetime => "datetime",
            StringValidation::Ip => "ip",
            StringValidation::Includes { .. } => "includes",
            StringValidation::StartsWith(_) => "startsWith",
            StringValidation::EndsWith(_) => "endsWith",
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            StringValidation::Includes { includes, position } => match position {
                Some(p) => json!({ "includes": includes, "position": p }),
                None => json!({ "includes": includes }),
            },
            StringValidation::StartsWith(s) => json!({ "startsWith": s }),
            StringValidation::EndsWith(s) => json!({ "endsWith": s }),
            other => json!(other.name()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ISSUES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidLiteral,
    Custom,
    InvalidUnion,
    InvalidUnionDiscriminator,
    InvalidEnumValue,
    UnrecognizedKeys,
    InvalidArguments,
    InvalidReturnType,
    InvalidDate,
    InvalidString,
    TooSmall,
    TooBig,
    InvalidIntersectionTypes,
    NotMultipleOf,
    NotFinite,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidLiteral => "invalid_literal",
            IssueCode::Custom => "custom",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidUnionDiscriminator => "invalid_union_discriminator",
            IssueCode::InvalidEnumValue => "invalid_enum_value",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::InvalidArguments => "invalid_arguments",
            IssueCode::InvalidReturnType => "invalid_return_type",
            IssueCode::InvalidDate => "invalid_date",
            IssueCode::InvalidString => "invalid_string",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::InvalidIntersectionTypes => "invalid_intersection_types",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::NotFinite => "not_finite",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code-specific payload of an issue.
#[derive(Debug, Clone)]
pub enum IssueKind {
    InvalidType { expected: ValueType, received: ValueType },
    InvalidLiteral { expected: Literal, received: Value },
    Custom { params: Option<serde_json::Value> },
    InvalidUnion { union_errors: Vec<ValidationError> },
    InvalidUnionDiscriminator { options: Vec<Literal> },
    InvalidEnumValue { options: Vec<Literal>, received: Value },
    UnrecognizedKeys { keys: Vec<String> },
    InvalidArguments { arguments_error: ValidationError },
    InvalidReturnType { return_type_error: ValidationError },
    InvalidDate,
    InvalidString { validation: StringValidation },
    TooSmall { minimum: Bound, inclusive: bool, exact: bool, origin: SizeOrigin },
    TooBig { maximum: Bound, inclusive: bool, exact: bool, origin: SizeOrigin },
    InvalidIntersectionTypes,
    NotMultipleOf { multiple_of: Bound },
    NotFinite,
}

impl IssueKind {
    pub fn code(&self) -> IssueCode {
        match self {
            IssueKind::InvalidType { .. } => IssueCode::InvalidType,
            IssueKind::InvalidLiteral { .. } => IssueCode::InvalidLiteral,
            IssueKind::Custom { .. } => IssueCode::Custom,
            IssueKind::InvalidUnion { .. } => IssueCode::InvalidUnion,
            IssueKind::InvalidUnionDiscriminator { .. } => IssueCode::InvalidUnionDiscriminator,
            IssueKind::InvalidEnumValue { .. } => IssueCode::InvalidEnumValue,
            IssueKind::UnrecognizedKeys { .. } => IssueCode::UnrecognizedKeys,
            IssueKind::InvalidArguments { .. } => IssueCode::InvalidArguments,
            IssueKind::InvalidReturnType { .. } => IssueCode::InvalidReturnType,
            IssueKind::InvalidDate => IssueCode::InvalidDate,
            IssueKind::InvalidString { .. } => IssueCode::InvalidString,
            IssueKind::TooSmall { .. } => IssueCode::TooSmall,
            IssueKind::TooBig { .. } => IssueCode::TooBig,
            IssueKind::InvalidIntersectionTypes => IssueCode::InvalidIntersectionTypes,
            IssueKind::NotMultipleOf { .. } => IssueCode::NotMultipleOf,
            IssueKind::NotFinite => IssueCode::NotFinite,
        }
    }

    pub fn invalid_type(expected: ValueType, received: ValueType) -> Self {
        IssueKind::InvalidType { expected, received }
    }

    pub fn custom() -> Self {
        IssueKind::Custom { params: None }
    }

    fn payload_into(&self, out: &mut Map<String, serde_json::Value>) {
        match self {
            IssueKind::InvalidType { expected, received } => {
                out.insert("expected".into(), json!(expected.as_str()));
                out.insert("received".into(), json!(received.as_str()));
            }
            IssueKind::InvalidLiteral { expected, received } => {
                out.insert("expected".into(), expected.to_json());
                out.insert("received".into(), received.to_json());
            }
            IssueKind::Custom { params } => {
                if let Some(p) = params {
                    out.insert("params".into(), p.clone());
                }
            }
            IssueKind::InvalidUnion { union_errors } => {
                out.insert(
                    "unionErrors".into(),
                    union_errors.iter().map(ValidationError::to_json).collect(),
                );
            }
            IssueKind::InvalidUnionDiscriminator { options } => {
                out.insert("options".into(), options.iter().map(Literal::to_json).collect());
            }
            IssueKind::InvalidEnumValue { options, received } => {
                out.insert("options".into(), options.iter().map(Literal::to_json).collect());
                out.insert("received".into(), received.to_json());
            }
            IssueKind::UnrecognizedKeys { keys } => {
                out.insert("keys".into(), json!(keys));
            }
            IssueKind::InvalidArguments { arguments_error } => {
                out.insert("argumentsError".into(), arguments_error.to_json());
            }
            IssueKind::InvalidReturnType { return_type_error } => {
                out.insert("returnTypeError".into(), return_type_error.to_json());
            }
            IssueKind::InvalidString { validation } => {
                out.insert("validation".into(), validation.to_json());
            }
            IssueKind::TooSmall { minimum, inclusive, exact, origin } => {
                out.insert("minimum".into(), minimum.to_json());
                out.insert("inclusive".into(), json!(inclusive));
                out.insert("exact".into(), json!(exact));
                out.insert("type".into(), json!(origin.as_str()));
            }
            IssueKind::TooBig { maximum, inclusive, exact, origin } => {
                out.insert("maximum".into(), maximum.to_json());
                out.insert("inclusive".into(), json!(inclusive));
                out.insert("exact".into(), json!(exact));
                out.insert("type".into(), json!(origin.as_str()));
            }
            IssueKind::NotMultipleOf { multiple_of } => {
                out.insert("multipleOf".into(), multiple_of.to_json());
            }
            IssueKind::InvalidDate | IssueKind::InvalidIntersectionTypes | IssueKind::NotFinite => {}
        }
    }
}

/// An issue as raised by validation logic, before a message is attached.
/// `path` is relative to the node that raised it.
#[derive(Debug, Clone)]
pub struct IssueData {
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    pub message: Option<String>,
    pub fatal: bool,
}

impl IssueData {
    pub fn new(kind: IssueKind) -> Self {
        Self { kind, path: Vec::new(), message: None, fatal: false }
    }

    /// A `custom` issue with an explicit message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(IssueKind::custom()).message(message)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the issue fatal: raising it aborts the node.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

impl From<IssueKind> for IssueData {
    fn from(kind: IssueKind) -> Self {
        IssueData::new(kind)
    }
}

/// A fully resolved issue: absolute path and human-readable message.
#[derive(Debug, Clone)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn code(&self) -> IssueCode {
        self.kind.code()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut out = Map::new();
        out.insert("code".into(), json!(self.code().as_str()));
        self.kind.payload_into(&mut out);
        out.insert(
            "path".into(),
            serde_json::Value::Array(self.path.iter().map(PathSegment::to_json).collect()),
        );
        out.insert("message".into(), json!(self.message));
        serde_json::Value::Object(out)
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code())
        } else {
            write!(f, "{}: {} ({})", display_path(&self.path), self.message, self.code())
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// AGGREGATE ERROR
// ————————————————————————————————————————————————————————————————————————————

/// Every issue raised by one top-level call, in report order.
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

/// Issues bucketed by the first path segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedErrors<T> {
    pub form_errors: Vec<T>,
    pub field_errors: IndexMap<String, Vec<T>>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn add_issues(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    /// Append another error's issues after this one's.
    pub fn merge(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    pub fn flatten(&self) -> FlattenedErrors<String> {
        self.flatten_with(|issue| issue.message.clone())
    }

    pub fn flatten_with<T>(&self, mut mapper: impl FnMut(&Issue) -> T) -> FlattenedErrors<T> {
        let mut out = FlattenedErrors { form_errors: Vec::new(), field_errors: IndexMap::new() };
        for issue in &self.issues {
            match issue.path.first() {
                Some(first) => out
                    .field_errors
                    .entry(first.to_string())
                    .or_default()
                    .push(mapper(issue)),
                None => out.form_errors.push(mapper(issue)),
            }
        }
        out
    }

    /// Nested `{ "_errors": [...], "<key>": { ... } }` tree mirroring the
    /// shape of the input. Union sub-errors are folded into the same tree.
    pub fn format(&self) -> serde_json::Value {
        let mut root = json!({ "_errors": [] });
        self.format_into(&mut root);
        root
    }

    fn format_into(&self, root: &mut serde_json::Value) {
        for issue in &self.issues {
            match &issue.kind {
                IssueKind::InvalidUnion { union_errors } => {
                    for e in union_errors {
                        e.format_into(root);
                    }
                }
                IssueKind::InvalidArguments { arguments_error } => arguments_error.format_into(root),
                IssueKind::InvalidReturnType { return_type_error } => {
                    return_type_error.format_into(root)
                }
                _ => {}
            }
            let mut cursor = &mut *root;
            for seg in &issue.path {
                let key = seg.to_string();
                if cursor.get(&key).is_none() {
                    cursor[key.as_str()] = json!({ "_errors": [] });
                }
                cursor = &mut cursor[key.as_str()];
            }
            if let Some(errors) = cursor["_errors"].as_array_mut() {
                errors.push(json!(issue.message));
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.issues.iter().map(Issue::to_json).collect())
    }
}

impl From<Vec<Issue>> for ValidationError {
    fn from(issues: Vec<Issue>) -> Self {
        Self::new(issues)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.issues.serialize(serializer)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.len() {
            0 => f.write_str("validation failed"),
            1 => write!(f, "validation failed: {}", self.issues[0]),
            n => {
                write!(f, "validation failed with {n} issues:")?;
                for issue in &self.issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}
