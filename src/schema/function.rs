use crate::context::ParseOptions;
use crate::error::Error;
use crate::error_map::SchemaMessages;
use crate::parse::wrap_function;
use crate::value::{FunctionValue, Value};

use super::{tuple, unknown, Schema, SchemaKind};

/// Call contract: argument tuple and return schema.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub args: Schema,
    pub returns: Schema,
}

#[derive(Debug, Clone)]
pub struct FunctionSchema {
    def: FunctionDef,
}

/// Function accepting any arguments and returning anything.
pub fn function() -> FunctionSchema {
    FunctionSchema {
        def: FunctionDef { args: tuple(Vec::new()).rest(unknown()).into(), returns: unknown() },
    }
}

impl FunctionSchema {
    pub fn args(mut self, items: impl IntoIterator<Item = Schema>) -> Self {
        self.def.args = tuple(items).rest(unknown()).into();
        self
    }

    pub fn returns(mut self, returns: impl Into<Schema>) -> Self {
        self.def.returns = returns.into();
        self
    }

    pub fn parameters(&self) -> &Schema {
        &self.def.args
    }

    pub fn return_type(&self) -> &Schema {
        &self.def.returns
    }

    /// Wrap `f` so every call validates its arguments and its result.
    pub fn implement<F>(&self, f: F) -> FunctionValue
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        wrap_function(&self.def, &SchemaMessages::default(), ParseOptions::default(), FunctionValue::new(f))
    }
}

impl From<FunctionSchema> for Schema {
    fn from(s: FunctionSchema) -> Schema {
        Schema::new(SchemaKind::Function(s.def))
    }
}
