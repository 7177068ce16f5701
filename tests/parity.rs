use std::time::Duration;

use futures::executor::block_on;
use json_vet::schema::{
    array, boolean, discriminated_union, function, intersection, literal, nullable, number, object, promise, record,
    string, tuple, union, unknown,
};
use json_vet::{Error, IssueCode, IssueKind, PathSegment, PromiseValue, SafeParseResult, Schema, SchemaExt, Value};
use proptest::prelude::*;
use serde_json::json;

// ————————————————————————————————————————————————————————————————————————————
// FIXTURES
// ————————————————————————————————————————————————————————————————————————————

/// Schemas free of async effects and transforms.
fn schemas() -> Vec<Schema> {
    vec![
        object([
            ("name", Schema::from(string().min(2))),
            ("age", number().int().nonnegative().optional()),
            ("tags", array(string()).max(3).into()),
            ("kind", union([literal("a"), literal("b")])),
        ])
        .strict()
        .into(),
        union([Schema::from(string().email()), number().gt(0.0).into(), array(boolean()).into()]),
        intersection(object([("a", Schema::from(number()))]).passthrough(), record(string(), unknown())),
        tuple([Schema::from(string()), number().into()]).rest(boolean()).into(),
        record(string(), nullable(number().lt(10.0))),
        discriminated_union(
            "kind",
            [
                Schema::from(object([("kind", literal("a")), ("v", string().into())])),
                object([("kind", literal("b")), ("v", number().into())]).into(),
            ],
        )
        .expect("valid discriminated union"),
    ]
}

fn outcome(result: SafeParseResult) -> serde_json::Value {
    match result {
        SafeParseResult::Success(out) => json!({ "ok": out.to_json() }),
        SafeParseResult::Failure(err) => json!({ "issues": err.to_json() }),
    }
}

fn json_value() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        (-5i64..20).prop_map(serde_json::Value::from),
        (-5.0f64..15.0).prop_map(serde_json::Value::from),
        "[a-c]{0,4}".prop_map(serde_json::Value::from),
        Just(json!("a@b.co")),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-c]{1,2}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Objects drawn from the member names the fixtures care about.
fn shaped_object() -> impl Strategy<Value = serde_json::Value> {
    let member = prop_oneof![
        Just("name"),
        Just("age"),
        Just("tags"),
        Just("kind"),
        Just("a"),
        Just("v"),
        Just("extra"),
    ]
    .prop_map(String::from);
    let kind = prop_oneof![Just(json!("a")), Just(json!("b")), json_value()];
    (prop::collection::btree_map(member, json_value(), 0..6), kind).prop_map(|(m, kind)| {
        let mut out: serde_json::Map<String, serde_json::Value> = m.into_iter().collect();
        out.insert("kind".into(), kind);
        serde_json::Value::Object(out)
    })
}

fn any_input() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![json_value(), shaped_object()]
}

proptest! {
    /// The async entry points report exactly what the sync ones do.
    #[test]
    fn sync_and_async_agree(value in any_input(), index in 0usize..6) {
        let schema = &schemas()[index];
        let sync = schema.safe_parse(Value::from(&value)).expect("no async effects");
        let asynchronous = block_on(schema.safe_parse_async(Value::from(&value))).expect("no usage errors");
        prop_assert_eq!(outcome(sync), outcome(asynchronous));
    }

    /// Parsing a successful output again yields the same output.
    #[test]
    fn successful_output_is_stable(value in any_input(), index in 0usize..6) {
        let schema = &schemas()[index];
        if let SafeParseResult::Success(first) = schema.safe_parse(Value::from(&value)).expect("sync") {
            let again = schema.safe_parse(first.clone()).expect("sync");
            prop_assert_eq!(outcome(again), json!({ "ok": first.to_json() }));
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ASYNC EFFECTS
// ————————————————————————————————————————————————————————————————————————————

#[tokio::test]
async fn async_issues_keep_declaration_order() {
    let slow_check = number().refine_async(|v| async move {
        let n = v.as_f64().unwrap_or(0.0);
        tokio::time::sleep(Duration::from_millis((40.0 - n * 10.0) as u64)).await;
        n < 2.0
    });
    let schema: Schema = array(slow_check).into();

    let err = match schema.safe_parse_async(Value::from(json!([0, 1, 2, 3]))).await.expect("async") {
        SafeParseResult::Failure(err) => err,
        SafeParseResult::Success(out) => panic!("expected failure, got {out:?}"),
    };
    let paths: Vec<_> = err.issues().iter().map(|i| i.path.clone()).collect();
    assert_eq!(paths, vec![vec![PathSegment::Index(2)], vec![PathSegment::Index(3)]]);
    assert!(err.issues().iter().all(|i| i.code() == IssueCode::Custom && i.message == "Invalid input"));
}

#[tokio::test]
async fn async_transform_and_refine() {
    let schema = string()
        .transform_async(|v| async move { Value::from(v.as_str().unwrap_or_default().to_uppercase()) })
        .refine_async(|v| async move { v.as_str() != Some("NO") });

    let out = schema.parse_async(Value::from("ab")).await.expect("valid");
    assert_eq!(out.as_str(), Some("AB"));
    assert!(schema.parse_async(Value::from("no")).await.is_err());
}

#[tokio::test]
async fn async_object_collects_every_member() {
    let positive = || number().refine_async(|v| async move { v.as_f64().is_some_and(|n| n > 0.0) });
    let schema: Schema = object([("a", positive()), ("b", positive()), ("c", string().into())]).into();

    let result = schema.safe_parse_async(Value::from(json!({"a": -1, "b": -2, "c": 3}))).await.expect("async");
    let err = result.error().expect("failure").clone();
    let codes: Vec<_> = err.issues().iter().map(|i| i.code()).collect();
    assert_eq!(codes, vec![IssueCode::Custom, IssueCode::Custom, IssueCode::InvalidType]);
}

#[tokio::test]
async fn promise_schema_validates_the_resolved_value() {
    let schema = promise(number());

    let out = schema.parse_async(Value::from(5)).await.expect("lifted");
    let Value::Promise(pending) = out else { panic!("expected a promise") };
    assert_eq!(pending.resolve().await.expect("resolved").as_f64(), Some(5.0));

    let bad = Value::Promise(PromiseValue::resolved(Value::from("x")));
    let Value::Promise(pending) = schema.parse_async(bad).await.expect("accepted") else {
        panic!("expected a promise");
    };
    let err = pending.resolve().await.expect_err("invalid payload");
    assert!(matches!(err, Error::Invalid(_)));

    assert!(schema.parse(Value::from(5)).is_err());
}

#[tokio::test]
async fn function_returning_a_promise_validates_asynchronously() {
    let contract = function().args([Schema::from(number())]).returns(promise(number()));
    let echo = contract.implement(|args| Ok(Value::Promise(PromiseValue::resolved(args[0].clone()))));

    let Value::Promise(pending) = echo.call(vec![Value::from(2)]).expect("call") else {
        panic!("expected a promise");
    };
    assert_eq!(pending.resolve().await.expect("resolved").as_f64(), Some(2.0));

    let Value::Promise(pending) = echo.call(vec![Value::from("x")]).expect("call") else {
        panic!("expected a promise");
    };
    let err = pending.resolve().await.expect_err("bad arguments");
    let issues = err.as_validation().expect("validation error").issues().to_vec();
    assert!(matches!(issues[0].kind, IssueKind::InvalidArguments { .. }));

    let liar = contract.implement(|_| Ok(Value::Promise(PromiseValue::resolved(Value::from("x")))));
    let Value::Promise(pending) = liar.call(vec![Value::from(1)]).expect("call") else {
        panic!("expected a promise");
    };
    let err = pending.resolve().await.expect_err("bad return");
    assert_eq!(err.as_validation().expect("validation error").issues()[0].code(), IssueCode::InvalidReturnType);
}

#[tokio::test]
async fn async_intersection_reports_member_conflicts() {
    let schema = intersection(object([("p", Schema::from(string()))]), object([("p", Schema::from(number()))]));
    let err = schema.safe_parse_async(Value::from(json!({"p": "x"}))).await.expect("async").error().expect("failure").clone();
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].code(), IssueCode::InvalidIntersectionTypes);
    assert_eq!(err.issues()[0].path, vec![PathSegment::from("p")]);
}
