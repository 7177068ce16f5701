use json_vet::schema::{
    any, array, bigint, discriminated_union, function, intersection, literal, number, object, preprocess, record,
    string, tuple, union, Check, RefineParams, StringCheckKind,
};
use json_vet::{
    AsyncFeature, Error, ErrorMap, IssueCode, IssueData, IssueKind, ParseOptions, PathSegment, SafeParseResult,
    Schema, SchemaExt, UsageError, ValidationError, Value,
};
use serde_json::json;

// ————————————————————————————————————————————————————————————————————————————
// HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn input(j: serde_json::Value) -> Value {
    Value::from(j)
}

fn failure(schema: &Schema, value: Value) -> ValidationError {
    match schema.safe_parse(value).expect("synchronous schema") {
        SafeParseResult::Failure(err) => err,
        SafeParseResult::Success(out) => panic!("expected failure, got {out:?}"),
    }
}

fn success(schema: &Schema, value: Value) -> serde_json::Value {
    match schema.safe_parse(value).expect("synchronous schema") {
        SafeParseResult::Success(out) => out.to_json(),
        SafeParseResult::Failure(err) => panic!("expected success, got {}", err.to_json()),
    }
}

fn key(k: &str) -> PathSegment {
    PathSegment::from(k)
}

fn codes(err: &ValidationError) -> Vec<IssueCode> {
    err.issues().iter().map(|i| i.code()).collect()
}

// ————————————————————————————————————————————————————————————————————————————
// PATHS & COLLECTION
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn nested_issue_paths_are_absolute() {
    let schema: Schema = object([(
        "users",
        Schema::from(array(object([("email", Schema::from(string().email()))]))),
    )])
    .into();
    let err = failure(&schema, input(json!({"users": [{"email": "a@b.co"}, {"email": "nope"}]})));
    assert_eq!(err.len(), 1);
    let issue = &err.issues()[0];
    assert_eq!(issue.path, vec![key("users"), PathSegment::Index(1), key("email")]);
    assert_eq!(issue.message, "Invalid email");
}

#[test]
fn collects_every_issue_in_declaration_order() {
    let schema: Schema =
        object([("a", Schema::from(string().min(3))), ("b", number().max(5.0).into())]).into();
    let err = failure(&schema, input(json!({"a": "x", "b": 10})));
    assert_eq!(codes(&err), vec![IssueCode::TooSmall, IssueCode::TooBig]);
    assert_eq!(err.issues()[0].path, vec![key("a")]);
    assert_eq!(err.issues()[0].message, "String must contain at least 3 character(s)");
    assert_eq!(err.issues()[1].path, vec![key("b")]);
    assert_eq!(err.issues()[1].message, "Number must be less than or equal to 5");
}

#[test]
fn failed_size_check_still_validates_items() {
    let schema: Schema = array(number().int()).min(4).into();
    let err = failure(&schema, input(json!([1, 2.5])));
    assert_eq!(codes(&err), vec![IssueCode::TooSmall, IssueCode::InvalidType]);
    assert_eq!(err.issues()[0].path, Vec::<PathSegment>::new());
    assert_eq!(err.issues()[1].path, vec![PathSegment::Index(1)]);
}

#[test]
fn missing_member_is_required() {
    let schema: Schema = object([("name", Schema::from(string()))]).into();
    let err = failure(&schema, input(json!({})));
    assert_eq!(err.issues()[0].message, "Required");
    assert_eq!(err.issues()[0].path, vec![key("name")]);

    let err = failure(&string().into(), Value::from(1));
    assert_eq!(err.issues()[0].message, "Expected string, received number");
}

#[test]
fn record_reports_under_each_key() {
    let schema = record(string(), number());
    let err = failure(&schema, input(json!({"ok": 1, "bad": "x"})));
    assert_eq!(err.issues()[0].path, vec![key("bad")]);
}

#[test]
fn record_keeps_undefined_values_unless_omittable() {
    let present = Value::object([("a", Value::Undefined)]);

    let out = record(string(), any()).parse(present.clone()).expect("any value");
    assert!(out.as_object().expect("an object").contains_key("a"));

    let out = record(string(), string().optional()).parse(present).expect("optional value");
    assert!(!out.as_object().expect("an object").contains_key("a"));
}

#[test]
fn bigint_multiple_of_minus_one_accepts_the_minimum() {
    let schema: Schema = bigint().multiple_of(-1).into();
    assert!(schema.safe_parse(Value::BigInt(i128::MIN)).expect("sync").is_success());
}

#[test]
fn tuple_length_is_checked_before_items() {
    let schema: Schema = tuple([Schema::from(string()), number().into()]).into();
    assert_eq!(codes(&failure(&schema, input(json!(["a"])))), vec![IssueCode::TooSmall]);
    assert_eq!(codes(&failure(&schema, input(json!(["a", 1, true])))), vec![IssueCode::TooBig]);
    assert_eq!(success(&schema, input(json!(["a", 1]))), json!(["a", 1]));
}

#[test]
fn flatten_buckets_by_first_segment() {
    let schema: Schema = object([("a", Schema::from(string())), ("b", number().into())]).into();
    let flat = failure(&schema, input(json!({"a": 1, "b": "x"}))).flatten();
    assert!(flat.form_errors.is_empty());
    assert_eq!(flat.field_errors.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(flat.field_errors["a"], vec!["Expected string, received number".to_string()]);
}

// ————————————————————————————————————————————————————————————————————————————
// OBJECT KEY POLICIES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn unknown_key_policies() {
    let base = || object([("a", Schema::from(string()))]);
    let data = json!({"a": "x", "extra": 1});

    assert_eq!(success(&base().into(), input(data.clone())), json!({"a": "x"}));
    assert_eq!(success(&base().passthrough().into(), input(data.clone())), data);
    assert_eq!(success(&base().catchall(number()).into(), input(data.clone())), data);

    let err = failure(&base().strict().into(), input(data));
    assert_eq!(err.len(), 1);
    assert!(err.issues()[0].path.is_empty());
    match &err.issues()[0].kind {
        IssueKind::UnrecognizedKeys { keys } => assert_eq!(keys, &vec!["extra".to_string()]),
        other => panic!("unexpected issue {other:?}"),
    }
    assert_eq!(err.issues()[0].message, "Unrecognized key(s) in object: 'extra'");
}

#[test]
fn catchall_validates_unknown_members() {
    let schema: Schema = object([("a", Schema::from(string()))]).catchall(number()).into();
    let err = failure(&schema, input(json!({"a": "x", "extra": "y"})));
    assert_eq!(err.issues()[0].path, vec![key("extra")]);
}

// ————————————————————————————————————————————————————————————————————————————
// UNIONS & INTERSECTIONS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn union_takes_first_valid_option() {
    let schema = union([Schema::from(string()), number().into()]);
    assert_eq!(success(&schema, Value::from(3)), json!(3));
    assert_eq!(success(&schema, Value::from("x")), json!("x"));
}

#[test]
fn union_falls_back_to_a_dirty_option() {
    let schema = union([Schema::from(string().min(5)), number().into()]);
    let err = failure(&schema, Value::from("abc"));
    assert_eq!(codes(&err), vec![IssueCode::TooSmall]);
}

#[test]
fn union_failure_keeps_every_option_error() {
    let schema = union([Schema::from(string()), number().into()]);
    let err = failure(&schema, Value::from(true));
    assert_eq!(err.len(), 1);
    assert_eq!(err.issues()[0].message, "Invalid input");
    match &err.issues()[0].kind {
        IssueKind::InvalidUnion { union_errors } => {
            assert_eq!(union_errors.len(), 2);
            assert_eq!(union_errors[0].issues()[0].message, "Expected string, received boolean");
            assert_eq!(union_errors[1].issues()[0].message, "Expected number, received boolean");
        }
        other => panic!("unexpected issue {other:?}"),
    }
}

#[test]
fn discriminated_union_dispatches_on_the_tag() {
    let schema = discriminated_union(
        "type",
        [
            Schema::from(object([("type", literal("a")), ("x", string().into())])),
            object([("type", literal("b")), ("y", number().into())]).into(),
        ],
    )
    .expect("valid discriminated union");

    assert_eq!(success(&schema, input(json!({"type": "a", "x": "hi"}))), json!({"type": "a", "x": "hi"}));

    let err = failure(&schema, input(json!({"type": "c"})));
    assert_eq!(codes(&err), vec![IssueCode::InvalidUnionDiscriminator]);
    assert_eq!(err.issues()[0].path, vec![key("type")]);
    assert_eq!(err.issues()[0].message, "Invalid discriminator value. Expected 'a' | 'b'");

    let err = failure(&schema, input(json!({"type": "b", "y": "no"})));
    assert_eq!(codes(&err), vec![IssueCode::InvalidType]);
    assert_eq!(err.issues()[0].path, vec![key("y")]);
}

#[test]
fn discriminated_union_rejects_duplicate_tags() {
    let result = discriminated_union(
        "type",
        [
            Schema::from(object([("type", literal("a"))])),
            object([("type", literal("a"))]).into(),
        ],
    );
    assert!(result.is_err());
}

#[test]
fn intersection_merges_objects() {
    let schema = intersection(
        object([("a", Schema::from(string()))]).passthrough(),
        object([("b", Schema::from(number()))]).passthrough(),
    );
    assert_eq!(success(&schema, input(json!({"a": "x", "b": 1}))), json!({"a": "x", "b": 1}));
}

#[test]
fn intersection_conflict_is_reported_where_it_happens() {
    let schema = intersection(
        object([("p", string().transform(|_| Value::from("L")))]),
        object([("p", Schema::from(string()))]),
    );
    let err = failure(&schema, input(json!({"p": "in"})));
    assert_eq!(codes(&err), vec![IssueCode::InvalidIntersectionTypes]);
    assert_eq!(err.issues()[0].path, vec![key("p")]);
    assert_eq!(err.issues()[0].message, "Intersection results could not be merged");
}

#[test]
fn intersection_member_type_disagreement_is_a_conflict() {
    let schema = intersection(object([("p", Schema::from(string()))]), object([("p", Schema::from(number()))]));
    let err = failure(&schema, input(json!({"p": "x"})));
    assert_eq!(codes(&err), vec![IssueCode::InvalidIntersectionTypes]);
    assert_eq!(err.issues()[0].path, vec![key("p")]);

    // A member neither side accepts stays an ordinary type error.
    let err = failure(&schema, input(json!({"p": true})));
    assert_eq!(codes(&err), vec![IssueCode::InvalidType, IssueCode::InvalidType]);

    // So does a refinement failure on the rejecting side.
    let strict = intersection(object([("p", Schema::from(string()))]), object([("p", Schema::from(string().min(3)))]));
    assert_eq!(codes(&failure(&strict, input(json!({"p": "x"})))), vec![IssueCode::TooSmall]);
}

// ————————————————————————————————————————————————————————————————————————————
// FATAL ISSUES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn fatal_check_skips_remaining_checks() {
    let schema: Schema = string().check(Check::new(StringCheckKind::Min(5)).fatal()).email().into();
    assert_eq!(codes(&failure(&schema, Value::from("ab"))), vec![IssueCode::TooSmall]);

    let lenient: Schema = string().min(5).email().into();
    assert_eq!(codes(&failure(&lenient, Value::from("ab"))), vec![IssueCode::TooSmall, IssueCode::InvalidString]);
}

#[test]
fn fatal_refinement_stops_later_refinements() {
    let schema = number().refine_with(|_| false, RefineParams::message("first").fatal()).refine(|_| false);
    let err = failure(&schema, Value::from(1));
    assert_eq!(err.len(), 1);
    assert_eq!(err.issues()[0].message, "first");
}

// ————————————————————————————————————————————————————————————————————————————
// EFFECTS
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn preprocess_runs_before_the_inner_schema() {
    let schema = preprocess(|v| Value::from(v.coerce_to_string()), string().min(2));
    assert_eq!(success(&schema, Value::from(42)), json!("42"));
    assert_eq!(codes(&failure(&schema, Value::from(7))), vec![IssueCode::TooSmall]);
}

#[test]
fn refinements_see_transformed_output() {
    let schema = string()
        .transform(|v| Value::from(v.as_str().map_or(0, str::len) as i64))
        .refine_with(|v| v.as_f64().is_some_and(|n| n > 2.0), RefineParams::message("too short"));
    assert_eq!(success(&schema, Value::from("abcd")), json!(4));
    let err = failure(&schema, Value::from("ab"));
    assert_eq!(codes(&err), vec![IssueCode::Custom]);
    assert_eq!(err.issues()[0].message, "too short");
}

#[test]
fn super_refine_raises_issues_at_its_own_paths() {
    let schema = object([("pw", Schema::from(string())), ("confirm", string().into())]).super_refine(|v, ctx| {
        if v.get("pw") != v.get("confirm") {
            ctx.add_issue(IssueData::custom("passwords differ").at(["confirm"]));
        }
    });
    assert!(schema.safe_parse(input(json!({"pw": "a", "confirm": "a"}))).expect("sync").is_success());
    let err = failure(&schema, input(json!({"pw": "a", "confirm": "b"})));
    assert_eq!(err.issues()[0].path, vec![key("confirm")]);
    assert_eq!(err.issues()[0].message, "passwords differ");
}

#[test]
fn refinement_with_path_and_params() {
    let schema = object([("n", Schema::from(number()))]).refine_with(
        |v| v.get("n").and_then(Value::as_f64).is_some_and(|n| n > 0.0),
        RefineParams::message("must be positive").at(["n"]).params(json!({"min": 0})),
    );
    let err = failure(&schema, input(json!({"n": -1})));
    let issue = err.issues()[0].to_json();
    assert_eq!(issue["path"], json!(["n"]));
    assert_eq!(issue["params"], json!({"min": 0}));
    assert_eq!(issue["code"], json!("custom"));
}

#[test]
fn async_effect_in_sync_parse_is_a_usage_error() {
    let schema = string().refine_async(|_| async { true });
    let err = schema.safe_parse(Value::from("x")).expect_err("async refinement");
    assert_eq!(err, UsageError::AsyncInSync(AsyncFeature::Refinement));
    assert!(matches!(schema.parse(Value::from("x")), Err(Error::Usage(_))));

    let schema = string().transform_async(|v| async move { v });
    assert_eq!(
        schema.safe_parse(Value::from("x")).expect_err("async transform"),
        UsageError::AsyncInSync(AsyncFeature::Transform)
    );
}

// ————————————————————————————————————————————————————————————————————————————
// MESSAGES
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn required_and_invalid_type_messages() {
    let schema = string().required_error("name is required").invalid_type_error("name must be text");
    let wrapped: Schema = object([("name", schema)]).into();
    assert_eq!(failure(&wrapped, input(json!({}))).issues()[0].message, "name is required");
    assert_eq!(failure(&wrapped, input(json!({"name": 3}))).issues()[0].message, "name must be text");
}

#[test]
fn explicit_check_message_wins() {
    let schema: Schema = string().check(Check::new(StringCheckKind::Min(3)).message("three please")).into();
    let options = ParseOptions::new().with_error_map(ErrorMap::new(|_, _| "contextual".to_string()));
    match schema.safe_parse_with(Value::from("a"), &options).expect("sync") {
        SafeParseResult::Failure(err) => assert_eq!(err.issues()[0].message, "three please"),
        SafeParseResult::Success(_) => panic!("expected failure"),
    }
}

#[test]
fn contextual_map_runs_after_schema_map() {
    let schema = number().error_map(ErrorMap::new(|_, _| "schema says no".to_string()));
    let options = ParseOptions::new()
        .with_error_map(ErrorMap::new(|issue, ctx| format!("{} [{}]", ctx.default_error, issue.code())));
    match schema.safe_parse_with(Value::from("x"), &options).expect("sync") {
        SafeParseResult::Failure(err) => assert_eq!(err.issues()[0].message, "schema says no [invalid_type]"),
        SafeParseResult::Success(_) => panic!("expected failure"),
    }
}

#[test]
fn locale_replaces_defaults() {
    let schema: Schema = string().into();
    let options = ParseOptions::new().with_locale(ErrorMap::new(|issue, ctx| match issue.code() {
        IssueCode::InvalidType => "Tipo inválido".to_string(),
        _ => ctx.default_error.to_string(),
    }));
    match schema.safe_parse_with(Value::from(1), &options).expect("sync") {
        SafeParseResult::Failure(err) => assert_eq!(err.issues()[0].message, "Tipo inválido"),
        SafeParseResult::Success(_) => panic!("expected failure"),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FUNCTIONS
// ————————————————————————————————————————————————————————————————————————————

fn add() -> json_vet::FunctionValue {
    function().args([Schema::from(number()), number().into()]).returns(number()).implement(|args| {
        let sum: f64 = args.iter().filter_map(Value::as_f64).sum();
        Ok(Value::from(sum))
    })
}

#[test]
fn implemented_function_validates_arguments() {
    let f = add();
    let out = f.call(vec![Value::from(1), Value::from(2)]).expect("valid call");
    assert_eq!(out.as_f64(), Some(3.0));

    let err = f.call(vec![Value::from("x"), Value::from(2)]).expect_err("bad arguments");
    let err = err.as_validation().expect("validation error");
    assert_eq!(codes(err), vec![IssueCode::InvalidArguments]);
    match &err.issues()[0].kind {
        IssueKind::InvalidArguments { arguments_error } => {
            assert_eq!(arguments_error.issues()[0].path, vec![PathSegment::Index(0)]);
        }
        other => panic!("unexpected issue {other:?}"),
    }
}

#[test]
fn implemented_function_validates_its_result() {
    let f = function().returns(string()).implement(|_| Ok(Value::from(1)));
    let err = f.call(vec![]).expect_err("bad return");
    assert_eq!(codes(err.as_validation().expect("validation error")), vec![IssueCode::InvalidReturnType]);
}

#[test]
fn extra_call_arguments_are_ignored() {
    let out = add().call(vec![Value::from(1), Value::from(2), Value::from("extra")]).expect("valid call");
    assert_eq!(out.as_f64(), Some(3.0));
}

#[test]
fn function_schema_wraps_host_functions() {
    let schema: Schema = function().args([Schema::from(string())]).returns(number()).into();
    let raw = json_vet::FunctionValue::new(|args| Ok(Value::from(args.len() as i64)));

    let Value::Function(wrapped) = schema.parse(Value::Function(raw)).expect("a function") else {
        panic!("expected a function");
    };
    assert_eq!(wrapped.call(vec![Value::from("a")]).expect("valid call").as_f64(), Some(1.0));
    assert!(wrapped.call(vec![Value::from(1)]).is_err());

    assert_eq!(codes(&failure(&schema, Value::from(1))), vec![IssueCode::InvalidType]);
}
