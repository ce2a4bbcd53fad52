//! Field access over sequence containers

use ouroboros_jsonable::*;
use serde_json::json;
use uuid::Uuid;

fn doc(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn sequence_of(value: &Value) -> &Sequence {
    value.as_sequence().unwrap()
}

fn class(name: &str, fields: Vec<Field>) -> ProxyClass {
    ProxyClass::builder(name, ContainerKind::Sequence)
        .fields(fields)
        .build()
        .unwrap()
}

// ============================================================================
// Basic Access
// ============================================================================

#[test]
fn test_basic() {
    let foo = class("Foo", vec![Field::new("bar")]);

    assert_eq!(foo.wrap(Value::object()).unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(foo.wrap(Value::array()).unwrap_err().kind(), ErrorKind::MissingField);
    assert_eq!(
        foo.wrap(doc(json!([null]))).unwrap_err().kind(),
        ErrorKind::InvalidType
    );

    let d = doc(json!([123]));
    let proxy = foo.wrap(d.clone()).unwrap();
    assert!(proxy.jsonable().ptr_eq(&d));
    proxy.set("bar", 456).unwrap();
    assert_eq!(sequence_of(&d).get(0), Some(Value::Int(456)));
    assert!(proxy.set("bar", FieldValue::null()).is_err());
    assert_eq!(proxy.delete("bar").unwrap_err().kind(), ErrorKind::ImmutableField);
}

#[test]
fn test_positions_follow_declaration_order() {
    let point = class(
        "Point",
        vec![Field::new("x").integer(), Field::new("y").integer()],
    );
    let d = doc(json!([1, 2]));
    let proxy = point.wrap(d.clone()).unwrap();
    assert_eq!(proxy.get("y").unwrap().as_i64(), Some(2));
    proxy.set("x", 10).unwrap();
    assert_eq!(d.to_json(), json!([10, 2]));

    assert_eq!(point.wrap(doc(json!([1]))).unwrap_err().kind(), ErrorKind::MissingField);
}

#[test]
fn test_index_override() {
    let foo = class("Foo", vec![Field::new("last").index(2)]);
    let proxy = foo.wrap(doc(json!(["a", "b", "c"]))).unwrap();
    assert_eq!(proxy.get("last").unwrap().as_str(), Some("c"));
}

#[test]
fn test_optional() {
    let foo = class("Foo", vec![Field::new("bar").optional()]);
    let d = doc(json!([null]));
    let proxy = foo.wrap(d.clone()).unwrap();
    assert!(proxy.get("bar").unwrap().is_null());

    proxy.set("bar", 123).unwrap();
    assert_eq!(sequence_of(&d).get(0), Some(Value::Int(123)));

    proxy.set("bar", FieldValue::null()).unwrap();
    assert_eq!(d.to_json(), json!([null]));

    proxy.set("bar", 456).unwrap();
    proxy.delete("bar").unwrap();
    proxy.delete("bar").unwrap();
    assert!(proxy.get("bar").unwrap().is_null());
    assert_eq!(d.to_json(), json!([null]));
}

#[test]
fn test_optional_out_of_range_is_missing() {
    let foo = class("Foo", vec![Field::new("bar").optional()]);
    let proxy = foo.wrap(Value::array()).unwrap();
    assert_eq!(proxy.get("bar").unwrap_err().kind(), ErrorKind::MissingField);
    assert_eq!(proxy.set("bar", 1).unwrap_err().kind(), ErrorKind::MissingField);
    assert_eq!(
        proxy.set("bar", FieldValue::null()).unwrap_err().kind(),
        ErrorKind::MissingField
    );
    assert_eq!(proxy.delete("bar").unwrap_err().kind(), ErrorKind::MissingField);
    assert!(proxy.jsonable().as_sequence().unwrap().is_empty());
}

// ============================================================================
// Coercion, Predicates and Formats
// ============================================================================

#[test]
fn test_type_int() {
    let foo = class("Foo", vec![Field::new("bar").integer()]);
    assert_eq!(foo.wrap(doc(json!([]))).unwrap_err().kind(), ErrorKind::MissingField);

    let proxy = foo.wrap(doc(json!([123.1]))).unwrap();
    assert_eq!(proxy.get("bar").unwrap().as_i64(), Some(123));
    assert!(proxy.set("bar", 456.1).is_err());

    let proxy = foo.wrap(doc(json!(["123"]))).unwrap();
    assert_eq!(proxy.get("bar").unwrap().as_i64(), Some(123));
    assert!(proxy.set("bar", "456").is_err());
}

#[test]
fn test_predicate() {
    let foo = class(
        "Foo",
        vec![Field::new("bar").predicate(|v| v.as_f64().is_some_and(|n| n >= 0.0))],
    );
    assert_eq!(foo.wrap(Value::array()).unwrap_err().kind(), ErrorKind::MissingField);

    let d = doc(json!([123]));
    let proxy = foo.wrap(d.clone()).unwrap();
    proxy.set("bar", 456).unwrap();
    assert_eq!(proxy.set("bar", -456).unwrap_err().kind(), ErrorKind::InvalidValue);
    assert_eq!(d.to_json(), json!([456]));

    assert_eq!(
        foo.wrap(doc(json!([-123]))).unwrap_err().kind(),
        ErrorKind::InvalidValue
    );
}

#[test]
fn test_format() {
    let foo = class("Foo", vec![Field::new("uuid").string().format(UuidFormat)]);
    assert!(foo.wrap(doc(json!(["invalid"]))).is_err());

    let d = doc(json!(["27d861ac-f27e-4ef5-81af-99d2fcd976a6"]));
    let proxy = foo.wrap(d.clone()).unwrap();
    let id = Uuid::parse_str("b827a618-ac92-4de7-a12a-29c457de3000").unwrap();
    proxy.set("uuid", FieldValue::native(id)).unwrap();
    assert_eq!(proxy.get("uuid").unwrap().downcast_ref::<Uuid>(), Some(&id));
    assert_eq!(d.to_json(), json!(["b827a618-ac92-4de7-a12a-29c457de3000"]));
}

#[test]
fn test_datetime_format() {
    use chrono::NaiveDate;

    let event = class(
        "Event",
        vec![Field::new("at").string().format(DateTimeFormat)],
    );
    let d = doc(json!(["2017-03-04 05:06:07"]));
    let proxy = event.wrap(d.clone()).unwrap();
    let at = NaiveDate::from_ymd_opt(2017, 3, 4)
        .unwrap()
        .and_hms_micro_opt(5, 6, 7, 890)
        .unwrap();
    proxy.set("at", FieldValue::native(at)).unwrap();
    assert_eq!(d.to_json(), json!(["2017-03-04 05:06:07.000890"]));
    assert_eq!(proxy.get("at").unwrap(), FieldValue::native(at));
}

// ============================================================================
// Nested Proxies
// ============================================================================

#[test]
fn test_proxy() {
    let bar = class("Bar", vec![Field::new("id").integer()]);
    assert_eq!(
        Field::new("bar").proxy(&bar).coercion_type().unwrap(),
        CoercionType::Sequence
    );
    let foo = class("Foo", vec![Field::new("bar").sequence().proxy(&bar)]);
    assert_eq!(foo.wrap(Value::array()).unwrap_err().kind(), ErrorKind::MissingField);

    let d = doc(json!([[1]]));
    let proxy = foo.wrap(d.clone()).unwrap();
    let nested = proxy.get("bar").unwrap().into_proxy().unwrap();
    assert_eq!(nested.get("id").unwrap().as_i64(), Some(1));

    let b = doc(json!([2]));
    proxy.set("bar", bar.wrap(b.clone()).unwrap()).unwrap();
    assert!(sequence_of(&d).get(0).unwrap().ptr_eq(&b));

    // writes through the nested proxy reach the outer document
    let nested = proxy.get("bar").unwrap().into_proxy().unwrap();
    nested.set("id", 5).unwrap();
    assert_eq!(d.to_json(), json!([[5]]));

    assert!(proxy.set("bar", 123).is_err());
    assert!(proxy.set("bar", Value::array()).is_err());
}

#[test]
fn test_proxy_optional() {
    let bar = class("Bar", vec![Field::new("id").integer()]);
    let foo = class("Foo", vec![Field::new("bar").optional().proxy(&bar)]);

    let d = doc(json!([null]));
    assert!(foo.wrap(d.clone()).unwrap().get("bar").unwrap().is_null());

    let d = doc(json!([[1]]));
    let proxy = foo.wrap(d.clone()).unwrap();
    proxy.delete("bar").unwrap();
    assert_eq!(d.to_json(), json!([null]));
}

#[test]
fn test_repr() {
    let point = class(
        "Point",
        vec![Field::new("x").integer(), Field::new("y").float()],
    );
    let proxy = point.wrap(doc(json!([1, 2]))).unwrap();
    assert_eq!(proxy.to_string(), "Point(x=1, y=2.0)");

    let raw = class("Raw", vec![]);
    let proxy = raw.wrap(doc(json!(["foo", "bar"]))).unwrap();
    assert_eq!(proxy.to_string(), r#"Raw(["foo", "bar"])"#);
}
