use std::sync::Arc;

use anyhow::anyhow;
use aop_monitor::target::Slot;
use aop_monitor::{
    AopMonitor, CallError, Class, Emission, MonitorConfig, MonitorError, Object, Prototype,
    Receiver, RecordingSink, Target, Value, WatchSpec,
};
use serde_json::json;

// Helper: `{ greet: (name) => "hi " + name }`
fn greeter() -> Object {
    Object::new(
        "greeter",
        Prototype::new().with_method("greet", |_, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("hi {}", name)))
        }),
    )
}

fn greet_watch() -> WatchSpec<Value> {
    WatchSpec::new().watch("greet", |_, args| {
        Ok(Emission::One(json!({ "event": "greet", "name": args[0] })))
    })
}

// Helper: class whose instances count their own calls
fn counter_class() -> Class {
    Class::new(
        "Counter",
        Prototype::new().with_method("bump", |recv, args| {
            let step = args.first().and_then(Value::as_i64).unwrap_or(1);
            let count = recv.get("count").and_then(Value::as_i64).unwrap_or(0) + step;
            recv.set("count", count);
            Ok(json!(count))
        }),
    )
}

#[test]
fn test_greet_scenario() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());

    let mut greeter = monitor.configure(greet_watch()).apply(greeter()).unwrap();
    let result = greeter.call("greet", &[json!("Ann")]).unwrap();

    assert_eq!(result, json!("hi Ann"));
    assert_eq!(sink.records(), vec![json!({ "event": "greet", "name": "Ann" })]);
}

#[test]
fn test_apply_returns_same_target() {
    let monitor = AopMonitor::build(RecordingSink::<Value>::new());
    let original = greeter();

    let applied = monitor.configure(greet_watch()).apply(original).unwrap();

    assert_eq!(applied.label(), "greeter");
    assert!(applied.owner().has_own("greet"));
}

#[test]
fn test_return_value_identical_to_unwrapped() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let mut plain = greeter();
    let mut wrapped = monitor.configure(greet_watch()).apply(greeter()).unwrap();

    for name in ["Ann", "Bob", ""] {
        let expected = plain.call("greet", &[json!(name)]).unwrap();
        let actual = wrapped.call("greet", &[json!(name)]).unwrap();
        assert_eq!(actual, expected, "wrapped result must match the original");
    }
    assert_eq!(sink.len(), 3);
}

#[test]
fn test_inherited_method_is_not_wrapped() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());

    let base = Arc::new(Prototype::new().with_method("greet", |_, _| Ok(json!("hello"))));
    let child = Object::with_parent("child", base, |own| own);

    let mut child = monitor.configure(greet_watch()).apply(child).unwrap();

    assert!(!child.owner().has_own("greet"), "inherited member must stay inherited");
    assert_eq!(child.call("greet", &[json!("Ann")]).unwrap(), json!("hello"));
    assert!(sink.is_empty(), "skipped method must not emit");
}

#[test]
fn test_missing_method_is_skipped() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());

    let watch = greet_watch().watch("farewell", |_, _| Ok(Emission::One(json!("bye"))));
    let mut greeter = monitor.configure(watch).apply(greeter()).unwrap();

    assert!(!greeter.owner().has_own("farewell"));
    greeter.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_class_instances_share_wrapped_prototype() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let watch = WatchSpec::new().watch("bump", |recv, _| {
        Ok(Emission::One(json!({ "event": "bump", "count": recv.get("count") })))
    });

    let counter = monitor.configure(watch).apply(counter_class()).unwrap();
    let mut a = counter.instantiate(Receiver::new().with("count", 0));
    let mut b = counter.instantiate(Receiver::new().with("count", 100));

    assert_eq!(a.call("bump", &[json!(2)]).unwrap(), json!(2));
    assert_eq!(b.call("bump", &[]).unwrap(), json!(101));
    assert_eq!(
        sink.records(),
        vec![
            json!({ "event": "bump", "count": 2 }),
            json!({ "event": "bump", "count": 101 }),
        ]
    );
}

#[test]
fn test_instances_created_before_apply_stay_plain() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let watch = WatchSpec::new().watch("bump", |_, _| Ok(Emission::One(json!("bumped"))));

    let mut counter = counter_class();
    let mut early = counter.instantiate(Receiver::new());
    monitor.configure(watch).apply_in_place(&mut counter).unwrap();
    let mut late = counter.instantiate(Receiver::new());

    early.call("bump", &[]).unwrap();
    assert!(sink.is_empty(), "earlier instance keeps its original prototype");

    late.call("bump", &[]).unwrap();
    assert_eq!(sink.records(), vec![json!("bumped")]);
}

#[test]
fn test_subclass_only_wraps_own_methods() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());

    let base = counter_class();
    let derived = Class::extends("Derived", &base, |proto| {
        proto.with_method("reset", |recv, _| {
            recv.set("count", 0);
            Ok(Value::Null)
        })
    });
    let watch = WatchSpec::new()
        .watch("bump", |_, _| Ok(Emission::One(json!("bump"))))
        .watch("reset", |_, _| Ok(Emission::One(json!("reset"))));

    let derived = monitor.configure(watch).apply(derived).unwrap();
    let mut obj = derived.instantiate(Receiver::new());

    obj.call("bump", &[]).unwrap();
    obj.call("reset", &[]).unwrap();

    assert_eq!(sink.records(), vec![json!("reset")]);
}

#[test]
fn test_non_callable_member_rejected() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let target = Object::new(
        "settings",
        Prototype::new()
            .with_field("label", "not a method")
            .with_method("save", |_, _| Ok(Value::Bool(true))),
    );
    let watch = WatchSpec::new()
        .watch("label", |_, _| Ok(Emission::One(json!("label"))))
        .watch("save", |_, _| Ok(Emission::One(json!("save"))));

    let mut target = target;
    let err = monitor.configure(watch).apply_in_place(&mut target).unwrap_err();

    assert!(matches!(err, MonitorError::NotAFunction { ref name } if name == "label"));
    assert!(err.to_string().contains("expected function"));

    // Validation happens before any slot changes.
    target.call("save", &[]).unwrap();
    assert!(sink.is_empty());
}

#[test]
fn test_unregistered_extractor_rejected() {
    let monitor = AopMonitor::build(RecordingSink::<Value>::new());
    let watch = WatchSpec::new().watch_named("greet", "nobody_registered_this");

    let err = monitor.configure(watch).apply(greeter()).unwrap_err();

    match err {
        MonitorError::CallbackNotFunction { name, extractor } => {
            assert_eq!(name, "greet");
            assert_eq!(extractor, "nobody_registered_this");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_field_check_precedes_extractor_check() {
    let monitor = AopMonitor::build(RecordingSink::<Value>::new());
    let target = Object::new("t", Prototype::new().with_field("greet", 1));
    let watch = WatchSpec::new().watch_named("greet", "missing");

    let err = monitor.configure(watch).apply(target).unwrap_err();

    assert!(matches!(err, MonitorError::NotAFunction { .. }));
}

#[test]
fn test_named_extractor_from_config() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone()).register_extractor("greet_event", |_, args| {
        Ok(Emission::One(json!({ "event": "greet", "name": args[0] })))
    });
    let config = MonitorConfig::from_json_str(r#"{ "watch": { "greet": "greet_event" } }"#).unwrap();

    let mut greeter = monitor.configure_from(&config).apply(greeter()).unwrap();
    greeter.call("greet", &[json!("Ann")]).unwrap();

    assert_eq!(sink.records(), vec![json!({ "event": "greet", "name": "Ann" })]);
}

#[test]
fn test_default_configuration_watches_nothing() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let mut target = greeter();

    let installation = monitor.configure_default().apply_in_place(&mut target).unwrap();

    assert!(installation.is_empty());
    assert_eq!(target.call("greet", &[json!("Ann")]).unwrap(), json!("hi Ann"));
    assert!(sink.is_empty());
}

#[test]
fn test_double_apply_adds_second_layer() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let applicator = monitor.configure(greet_watch());

    let target = applicator.apply(greeter()).unwrap();
    let mut target = applicator.apply(target).unwrap();

    assert_eq!(target.call("greet", &[json!("Ann")]).unwrap(), json!("hi Ann"));
    assert_eq!(sink.len(), 2, "each layer emits once");
}

#[test]
fn test_revert_restores_original() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let mut target = greeter();

    let installation = monitor.configure(greet_watch()).apply_in_place(&mut target).unwrap();
    assert_eq!(installation.methods().collect::<Vec<_>>(), vec!["greet"]);
    assert_eq!(installation.target(), "greeter");

    target.call("greet", &[json!("Ann")]).unwrap();
    installation.revert(&mut target).unwrap();
    target.call("greet", &[json!("Bob")]).unwrap();

    assert_eq!(sink.len(), 1, "reverted method must not emit");
}

#[test]
fn test_revert_layers_in_reverse_order() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let applicator = monitor.configure(greet_watch());
    let mut target = greeter();

    let inner = applicator.apply_in_place(&mut target).unwrap();
    let outer = applicator.apply_in_place(&mut target).unwrap();
    assert_ne!(inner.id(), outer.id());

    outer.revert(&mut target).unwrap();
    target.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 1);

    inner.revert(&mut target).unwrap();
    target.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_revert_refuses_other_target() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let mut a = greeter();
    let mut b = Object::new("other", Prototype::new());

    let installation = monitor.configure(greet_watch()).apply_in_place(&mut a).unwrap();
    let err = installation.revert(&mut b).unwrap_err();

    assert!(matches!(err, MonitorError::NotInstalled { ref name, ref target } if name == "greet" && target == "other"));
    assert!(!b.owner().has_own("greet"), "other target must not gain a member");

    a.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 1, "instrumented target stays wrapped");

    installation.revert(&mut a).unwrap();
    a.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_revert_out_of_order_keeps_outer_layer() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let applicator = monitor.configure(greet_watch());
    let mut target = greeter();

    let inner = applicator.apply_in_place(&mut target).unwrap();
    let outer = applicator.apply_in_place(&mut target).unwrap();

    assert!(matches!(inner.revert(&mut target), Err(MonitorError::NotInstalled { .. })));
    target.call("greet", &[json!("Ann")]).unwrap();
    assert_eq!(sink.len(), 2, "both layers still in place");

    outer.revert(&mut target).unwrap();
    inner.revert(&mut target).unwrap();
    assert!(inner.revert(&mut target).is_err(), "a second revert finds no wrapper");
}

#[test]
fn test_subclass_keeps_parent_prototype_from_creation() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let watch = WatchSpec::new().watch("bump", |_, _| Ok(Emission::One(json!("bump"))));
    let applicator = monitor.configure(watch);

    let mut base = counter_class();
    let early = Class::extends("Early", &base, |proto| proto);
    applicator.apply_in_place(&mut base).unwrap();
    let late = Class::extends("Late", &base, |proto| proto);

    early.instantiate(Receiver::new()).call("bump", &[]).unwrap();
    assert!(sink.is_empty(), "subclass made before apply inherits the plain method");

    late.instantiate(Receiver::new()).call("bump", &[]).unwrap();
    assert_eq!(sink.records(), vec![json!("bump")]);
}

#[test]
fn test_original_error_propagates_unchanged() {
    let sink = RecordingSink::<Value>::new();
    let monitor = AopMonitor::build(sink.clone());
    let target = Object::new(
        "failing",
        Prototype::new().with_method("explode", |_, _| Err(anyhow!("boom").into())),
    );
    let watch = WatchSpec::new().watch("explode", |_, _| Ok(Emission::One(json!("never"))));

    let mut target = monitor.configure(watch).apply(target).unwrap();
    let err = target.call("explode", &[]).unwrap_err();

    assert!(matches!(err, CallError::Method(_)));
    assert_eq!(err.to_string(), "boom");
    assert!(sink.is_empty(), "pipeline must not run after a failed call");
}

#[test]
fn test_calling_field_or_missing_member() {
    let mut target = Object::new("t", Prototype::new().with_field("size", 3));

    assert!(matches!(target.call("size", &[]), Err(CallError::NotCallable(_))));
    assert!(matches!(target.call("nope", &[]), Err(CallError::NoSuchMethod(_))));
    assert!(matches!(target.owner().own("size"), Some(Slot::Field(_))));
}
