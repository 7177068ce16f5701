//! Schema-driven validation of untyped values.
//!
//! Build a [`Schema`] from the constructors in [`schema`], then hand it any
//! [`Value`]. Validation never stops at the first problem: every issue is
//! collected with the path where it was found, and the output may differ from
//! the input where coercions, defaults or transforms apply.
//!
//! ```
//! use json_vet::schema::{number, object, string, SchemaExt};
//! use json_vet::{Schema, Value};
//!
//! let user: Schema = object([
//!     ("name", Schema::from(string().min(1))),
//!     ("age", number().int().optional()),
//! ])
//! .into();
//!
//! let input = Value::object([("name", Value::from("ada"))]);
//! assert!(user.parse(input).is_ok());
//! ```
pub mod context;
pub mod describe;
pub mod document;
pub mod error;
pub mod error_map;
pub mod issue;
mod parse;
pub mod schema;
pub mod status;
pub mod value;

pub use context::{ParseOptions, RefinementCtx};
pub use error::{AsyncFeature, Error, SchemaError, UsageError};
pub use error_map::{ErrorMap, ErrorMapCtx};
pub use issue::{Issue, IssueCode, IssueData, IssueKind, PathSegment, ValidationError};
pub use parse::SafeParseResult;
pub use schema::{Schema, SchemaExt, SchemaKind, SchemaTag};
pub use value::{FunctionValue, Literal, PromiseValue, Value, ValueType};
