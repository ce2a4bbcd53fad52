//! Walk through field proxies and container mode over one JSON document
//!
//! Run with: cargo run -p ouroboros-jsonable --example basic_proxy

use ouroboros_jsonable::{
    ContainerKind, Field, FieldValue, Jsonable, ProxyClass, ProxyResult, UuidFormat, Value,
};
use serde_json::json;
use uuid::Uuid;

fn main() -> ProxyResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let user = ProxyClass::builder("User", ContainerKind::Mapping)
        .doc("A registered user.")
        .field(Field::new("id").string().format(UuidFormat))
        .field(Field::new("name").string())
        .field(Field::new("age").integer().optional().predicate(|v| {
            v.as_i64().is_some_and(|n| (0..150).contains(&n))
        }))
        .build()?;

    let users = ProxyClass::builder("Users", ContainerKind::Sequence)
        .item_proxy(&user)
        .build()?;

    let document = Value::from(json!([
        {"id": "27d861ac-f27e-4ef5-81af-99d2fcd976a6", "name": "alice", "age": "31"},
        {"id": "b827a618-ac92-4de7-a12a-29c457de3000", "name": "bob"},
    ]));
    let list = users.wrap(document.clone())?;

    println!("{} users", list.len()?);
    for item in list.iter()? {
        let proxy = item?.into_proxy().expect("item proxy");
        let id = proxy.get("id")?;
        println!("  {} -> {:?}", proxy, id.downcast_ref::<Uuid>());
    }

    // Writes go straight into the shared document
    let bob = list.item(1)?.into_proxy().expect("item proxy");
    bob.set("age", 42)?;
    if let Err(e) = bob.set("age", 200) {
        println!("rejected: {}", e);
    }

    let carol = user.wrap_json(json!({"id": Uuid::new_v4().to_string(), "name": "carol"}))?;
    list.set_slice(2i64.., [FieldValue::from(&carol)])?;

    println!("{}", document.to_json());
    assert!(list.jsonable().ptr_eq(&document));
    Ok(())
}
