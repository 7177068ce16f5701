//! JSON-Schema view of a [`Schema`].
//!
//! Read-only walk over the node tree. Constraints that JSON Schema cannot
//! express (transforms, refinements, catch fallbacks) are left out; the
//! emitted document describes the input a schema accepts.
use serde_json::{json, Map, Value as Json};

use crate::schema::{
    BigIntCheckKind, DateCheckKind, IpVersion, NumberCheckKind, Schema, SchemaKind, SizeCheck, StringCheckKind,
    UnknownKeys,
};
use crate::value::Literal;

pub const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Emit a standalone JSON-Schema document for `schema`.
pub fn to_json_schema(schema: &Schema) -> Json {
    let mut out = emit(schema, 0);
    if let Json::Object(map) = &mut out {
        map.insert("$schema".into(), Json::from(DIALECT));
    }
    out
}

/// Schema for values no JSON document can hold.
fn nothing() -> Json {
    json!({ "not": {} })
}

fn obj_of(props: Map<String, Json>, required: Vec<String>) -> Json {
    let mut map = Map::new();
    map.insert("type".into(), Json::from("object"));
    map.insert("properties".into(), Json::Object(props));
    if !required.is_empty() {
        map.insert("required".into(), Json::Array(required.into_iter().map(Json::from).collect()));
    }
    Json::Object(map)
}

fn nullable(inner: Json) -> Json {
    if inner == json!({ "type": "null" }) {
        return inner;
    }
    json!({ "oneOf": [inner, { "type": "null" }] })
}

fn sizes(o: &mut Json, min_key: &str, max_key: &str, min: Option<&SizeCheck>, max: Option<&SizeCheck>) {
    if let Some(c) = min {
        o[min_key] = Json::from(c.value);
    }
    if let Some(c) = max {
        o[max_key] = Json::from(c.value);
    }
}

/// Whether the member may be left out of an object.
fn omittable(schema: &Schema) -> bool {
    match schema.kind() {
        SchemaKind::Optional(_)
        | SchemaKind::Default(_)
        | SchemaKind::Catch(_)
        | SchemaKind::Any
        | SchemaKind::Unknown
        | SchemaKind::Undefined
        | SchemaKind::Void => true,
        SchemaKind::Nullable(inner) => omittable(inner),
        SchemaKind::Effects(def) => omittable(&def.schema),
        SchemaKind::Lazy(def) => omittable(def.schema()),
        _ => false,
    }
}

fn literal(l: &Literal) -> Json {
    match l {
        Literal::Undefined => nothing(),
        other => json!({ "const": other.to_json() }),
    }
}

fn emit(schema: &Schema, lazy_depth: usize) -> Json {
    let mut out = match schema.kind() {
        SchemaKind::String(def) => {
            let mut o = json!({ "type": "string" });
            if let Some(n) = def.min_length() {
                o["minLength"] = Json::from(n);
            }
            if let Some(n) = def.max_length() {
                o["maxLength"] = Json::from(n);
            }
            for check in &def.checks {
                let format = match &check.kind {
                    StringCheckKind::Email => "email",
                    StringCheckKind::Url => "uri",
                    StringCheckKind::Uuid => "uuid",
                    StringCheckKind::Datetime(_) => "date-time",
                    StringCheckKind::Ip(Some(IpVersion::V4)) => "ipv4",
                    StringCheckKind::Ip(Some(IpVersion::V6)) => "ipv6",
                    StringCheckKind::Regex(rx) => {
                        o["pattern"] = Json::from(rx.as_str());
                        continue;
                    }
                    _ => continue,
                };
                o["format"] = Json::from(format);
            }
            o
        }
        SchemaKind::Number(def) => {
            let ty = if def.is_int() { "integer" } else { "number" };
            let mut o = json!({ "type": ty });
            for check in &def.checks {
                match check.kind {
                    NumberCheckKind::Min { value, inclusive: true } => o["minimum"] = Json::from(value),
                    NumberCheckKind::Min { value, inclusive: false } => o["exclusiveMinimum"] = Json::from(value),
                    NumberCheckKind::Max { value, inclusive: true } => o["maximum"] = Json::from(value),
                    NumberCheckKind::Max { value, inclusive: false } => o["exclusiveMaximum"] = Json::from(value),
                    NumberCheckKind::MultipleOf(step) => o["multipleOf"] = Json::from(step),
                    NumberCheckKind::Int | NumberCheckKind::Finite => {}
                }
            }
            o
        }
        SchemaKind::BigInt(def) => {
            let mut o = json!({ "type": "integer" });
            for check in &def.checks {
                // JSON numbers beyond i64 are not portable; such bounds are dropped.
                match check.kind {
                    BigIntCheckKind::Min { value, inclusive } => {
                        if let Ok(v) = i64::try_from(value) {
                            o[if inclusive { "minimum" } else { "exclusiveMinimum" }] = Json::from(v);
                        }
                    }
                    BigIntCheckKind::Max { value, inclusive } => {
                        if let Ok(v) = i64::try_from(value) {
                            o[if inclusive { "maximum" } else { "exclusiveMaximum" }] = Json::from(v);
                        }
                    }
                    BigIntCheckKind::MultipleOf(step) => {
                        if let Ok(v) = i64::try_from(step) {
                            o["multipleOf"] = Json::from(v);
                        }
                    }
                }
            }
            o
        }
        SchemaKind::Boolean { .. } => json!({ "type": "boolean" }),
        SchemaKind::Date(def) => {
            let mut o = json!({ "type": "string", "format": "date-time" });
            for check in &def.checks {
                match check.kind {
                    DateCheckKind::Min(at) => o["formatMinimum"] = Json::from(at.to_rfc3339()),
                    DateCheckKind::Max(at) => o["formatMaximum"] = Json::from(at.to_rfc3339()),
                }
            }
            o
        }
        SchemaKind::Null => json!({ "type": "null" }),
        SchemaKind::NaN | SchemaKind::Undefined | SchemaKind::Void | SchemaKind::Never => nothing(),
        SchemaKind::Function(_) => nothing(),
        SchemaKind::Any | SchemaKind::Unknown => json!({}),

        SchemaKind::Array(def) => {
            let mut o = json!({ "type": "array", "items": emit(&def.element, lazy_depth) });
            sizes(&mut o, "minItems", "maxItems", def.min.as_ref(), def.max.as_ref());
            if let Some(c) = &def.exact {
                o["minItems"] = Json::from(c.value);
                o["maxItems"] = Json::from(c.value);
            }
            o
        }
        SchemaKind::Set(def) => {
            let mut o = json!({ "type": "array", "uniqueItems": true, "items": emit(&def.value, lazy_depth) });
            sizes(&mut o, "minItems", "maxItems", def.min.as_ref(), def.max.as_ref());
            o
        }
        SchemaKind::Tuple(def) => {
            let mut o = json!({
                "type": "array",
                "prefixItems": def.items.iter().map(|s| emit(s, lazy_depth)).collect::<Vec<_>>(),
                "minItems": def.items.len(),
            });
            match &def.rest {
                Some(rest) => o["items"] = emit(rest, lazy_depth),
                None => o["maxItems"] = Json::from(def.items.len()),
            }
            o
        }
        SchemaKind::Map(def) => json!({
            "type": "array",
            "items": {
                "type": "array",
                "prefixItems": [emit(&def.key, lazy_depth), emit(&def.value, lazy_depth)],
                "minItems": 2,
                "maxItems": 2,
            },
        }),
        SchemaKind::Record(def) => json!({
            "type": "object",
            "propertyNames": emit(&def.key, lazy_depth),
            "additionalProperties": emit(&def.value, lazy_depth),
        }),
        SchemaKind::Object(def) => {
            let mut props = Map::new();
            let mut required = Vec::new();
            for (key, member) in &def.shape {
                props.insert(key.clone(), emit(member, lazy_depth));
                if !omittable(member) {
                    required.push(key.clone());
                }
            }
            let mut o = obj_of(props, required);
            match (&def.catchall, def.unknown_keys) {
                (Some(catchall), _) => o["additionalProperties"] = emit(catchall, lazy_depth),
                (None, UnknownKeys::Strict) => o["additionalProperties"] = Json::Bool(false),
                (None, UnknownKeys::Strip | UnknownKeys::Passthrough) => {}
            }
            o
        }

        SchemaKind::Union(def) => json!({ "anyOf": def.options.iter().map(|s| emit(s, lazy_depth)).collect::<Vec<_>>() }),
        SchemaKind::DiscriminatedUnion(def) => {
            json!({ "oneOf": def.options.iter().map(|s| emit(s, lazy_depth)).collect::<Vec<_>>() })
        }
        SchemaKind::Intersection(def) => {
            json!({ "allOf": [emit(&def.left, lazy_depth), emit(&def.right, lazy_depth)] })
        }

        SchemaKind::Literal(l) => literal(l),
        SchemaKind::Enum(def) => json!({ "type": "string", "enum": def.values }),
        SchemaKind::NativeEnum(def) => {
            json!({ "enum": def.values().iter().map(Literal::to_json).collect::<Vec<_>>() })
        }

        // Recursive schemas are cut after the first expansion.
        SchemaKind::Lazy(_) if lazy_depth > 0 => json!({}),
        SchemaKind::Lazy(def) => emit(def.schema(), lazy_depth + 1),

        SchemaKind::Promise(inner) | SchemaKind::Optional(inner) => emit(inner, lazy_depth),
        SchemaKind::Nullable(inner) => nullable(emit(inner, lazy_depth)),
        SchemaKind::Effects(def) => emit(&def.schema, lazy_depth),
        SchemaKind::Catch(def) => emit(&def.inner, lazy_depth),
        SchemaKind::Pipeline(def) => emit(&def.input, lazy_depth),
        SchemaKind::Default(def) => {
            let mut o = emit(&def.inner, lazy_depth);
            o["default"] = def.value.get().to_json();
            o
        }
    };
    if let (Some(text), Json::Object(map)) = (schema.description(), &mut out) {
        map.insert("description".into(), Json::from(text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, lazy, literal, number, object, string, tuple, SchemaExt};

    #[test]
    fn objects_list_required_members() {
        let s: Schema = object([
            ("id", Schema::from(string().uuid())),
            ("age", number().int().gte(0.0).optional()),
            ("tags", array(string()).max(3).into()),
        ])
        .strict()
        .into();
        let out = to_json_schema(&s);
        assert_eq!(out["$schema"], DIALECT);
        assert_eq!(out["required"], json!(["id", "tags"]));
        assert_eq!(out["properties"]["id"]["format"], "uuid");
        assert_eq!(out["properties"]["age"], json!({ "type": "integer", "minimum": 0.0 }));
        assert_eq!(out["properties"]["tags"]["maxItems"], 3);
        assert_eq!(out["additionalProperties"], false);
    }

    #[test]
    fn wrappers_map_to_combinators() {
        let out = emit(&string().nullable(), 0);
        assert_eq!(out, json!({ "oneOf": [{ "type": "string" }, { "type": "null" }] }));
        let out = emit(&literal("a").or(literal(1)), 0);
        assert_eq!(out, json!({ "anyOf": [{ "const": "a" }, { "const": 1 }] }));
        let out = emit(&number().default(3).describe("count"), 0);
        assert_eq!(out["default"], 3);
        assert_eq!(out["description"], "count");
    }

    #[test]
    fn tuples_close_without_rest() {
        let s: Schema = tuple([Schema::from(string()), number().into()]).into();
        let out = emit(&s, 0);
        assert_eq!(out["minItems"], 2);
        assert_eq!(out["maxItems"], 2);
    }

    #[test]
    fn recursive_schemas_terminate() {
        fn node() -> Schema {
            object([("children", Schema::from(array(lazy(node))))]).into()
        }
        let out = to_json_schema(&node());
        assert_eq!(out["properties"]["children"]["items"]["properties"]["children"]["items"], json!({}));
    }
}
