//! End-to-end scenarios through the in-memory engine.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use aop_interceptor::engine::MemoryJoinPoint;
use aop_interceptor::kind::engine_codes;
use aop_interceptor::{
    AddOptions, Category, FnAdvice, Kind, RawJoinPoint, Scope, Thrown, WeaveError,
};
use common::{pointcut, setup, Recorder};
use serde_json::{json, Value};

fn around_event() -> MemoryJoinPoint {
    MemoryJoinPoint::new(engine_codes::AROUND_METHOD, "Foo::bar")
        .with_class("Foo")
        .with_method("bar")
        .with_original(|_| Ok(json!("original")))
}

#[test]
fn test_around_disable_then_enable() {
    let (interceptor, engine) = setup();
    let recorder = Recorder::new();

    let index = interceptor
        .add_around(pointcut("Foo::bar"), recorder.proceeding(), AddOptions::default())
        .unwrap();
    assert_eq!(index, 1);
    assert_eq!(interceptor.is_enabled(Scope::Index(1)).unwrap(), Some(true));

    interceptor.disable(Scope::Index(1)).unwrap();
    let mut event = around_event();
    let result = engine.fire(Category::Around, &mut event).unwrap();
    assert_eq!(result, Some(json!("original")));
    assert_eq!(event.proceed_count(), 1);
    assert_eq!(recorder.calls(), 0);

    interceptor.enable(Scope::Index(1)).unwrap();
    let mut event = around_event();
    let result = engine.fire(Category::Around, &mut event).unwrap();
    assert_eq!(result, Some(json!("original")));
    assert_eq!(recorder.calls(), 1);
    assert_eq!(recorder.kinds(), vec![Kind::AroundMethod]);
    assert_eq!(event.proceed_count(), 1);
}

#[test]
fn test_around_advice_controls_proceed() {
    let (interceptor, engine) = setup();
    let skip = Recorder::new();

    // Advice that never proceeds replaces the original result outright.
    interceptor
        .add_around(pointcut("Foo::bar"), skip.advice(json!("cached")), AddOptions::default())
        .unwrap();

    let mut event = around_event();
    let result = engine.fire(Category::Around, &mut event).unwrap();
    assert_eq!(result, Some(json!("cached")));
    assert_eq!(event.proceed_count(), 0);
}

#[test]
fn test_before_advice_rewrites_arguments() {
    let (interceptor, engine) = setup();
    let advice = FnAdvice::shared(|jp| {
        let mut args = jp.args();
        args.push(json!("appended"));
        jp.set_args(args);
        Ok(Value::Null)
    });
    interceptor
        .add_before(pointcut("Foo::bar"), advice, AddOptions::default())
        .unwrap();

    let mut event = MemoryJoinPoint::new(engine_codes::BEFORE_METHOD, "Foo::bar")
        .with_args(vec![json!(1)])
        .with_original(|args| Ok(json!(args.len())));
    engine.fire(Category::Before, &mut event).unwrap();
    let result = engine.fire(Category::Around, &mut event).unwrap();

    assert_eq!(result, Some(json!(2)));
}

#[test]
fn test_after_return_advice_replaces_return_value() {
    let (interceptor, engine) = setup();
    let advice = FnAdvice::shared(|jp| {
        let doubled = jp.return_value().as_i64().unwrap_or_default() * 2;
        jp.set_return_value(json!(doubled));
        Ok(Value::Null)
    });
    interceptor
        .add_after_return(pointcut("count()"), advice, AddOptions::default())
        .unwrap();

    let mut event = MemoryJoinPoint::new(644, "count()")
        .with_function("count")
        .with_returned(json!(21));
    engine.fire(Category::AfterReturn, &mut event).unwrap();

    assert_eq!(event.returned(), &json!(42));
}

#[test]
fn test_property_write_advice_sees_assigned_value() {
    let (interceptor, engine) = setup();
    let advice = FnAdvice::shared(|jp| {
        assert_eq!(jp.property_name().as_deref(), Some("name"));
        let value = jp.property_value().unwrap_or_default();
        let upper = value.as_str().unwrap_or_default().to_uppercase();
        jp.set_property_value(json!(upper));
        Ok(Value::Null)
    });
    interceptor
        .add_before(pointcut("Foo::$name"), advice, AddOptions::default())
        .unwrap();

    let mut event = MemoryJoinPoint::new(engine_codes::BEFORE_WRITE_PROPERTY, "Foo::$name")
        .with_class("Foo")
        .with_property("name", Some(json!("ada")));
    engine.fire(Category::Before, &mut event).unwrap();

    assert_eq!(event.assigned_value(), Some(json!("ADA")));
}

#[test]
fn test_after_throw_advice_sees_exception() {
    let (interceptor, engine) = setup();
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let sink = Arc::clone(&seen);
    let advice = FnAdvice::shared(move |jp| {
        *sink.lock() = jp.exception();
        Ok(Value::Null)
    });
    interceptor
        .add_after_throw(pointcut("Foo::bar"), advice, AddOptions::default())
        .unwrap();

    let thrown = Thrown::new("RuntimeException", "boom");
    let mut event = MemoryJoinPoint::new(engine_codes::AFTER_METHOD, "Foo::bar")
        .with_exception(thrown.clone());
    engine.fire(Category::AfterThrow, &mut event).unwrap();

    assert_eq!(seen.lock().as_ref(), Some(&thrown));
}

#[test]
fn test_advice_error_propagates_unchanged() {
    let (interceptor, engine) = setup();
    let advice = FnAdvice::shared(|_jp| {
        Err(WeaveError::raised(Thrown::new("DomainException", "rejected")))
    });
    interceptor
        .add_before(pointcut("Foo::bar"), advice, AddOptions::default())
        .unwrap();

    let mut event = MemoryJoinPoint::new(engine_codes::BEFORE_METHOD, "Foo::bar");
    let err = engine.fire(Category::Before, &mut event).unwrap_err();

    let thrown = err.as_thrown().expect("raised exception");
    assert_eq!(thrown.class_name, "DomainException");
    assert_eq!(err.to_string(), "DomainException: rejected");
}

#[test]
fn test_original_error_propagates_through_pass_through() {
    let (interceptor, engine) = setup();
    let recorder = Recorder::new();
    let index = interceptor
        .add_around(pointcut("Foo::bar"), recorder.proceeding(), AddOptions::default())
        .unwrap();
    interceptor.disable(Scope::Index(index)).unwrap();

    let mut event = MemoryJoinPoint::new(engine_codes::AROUND_METHOD, "Foo::bar")
        .with_original(|_| Err(WeaveError::raised(Thrown::new("LogicException", "bad"))));
    let err = engine.fire(Category::Around, &mut event).unwrap_err();

    assert_eq!(err.as_thrown().map(|t| t.message.as_str()), Some("bad"));
    assert_eq!(event.proceed_count(), 1);
}

#[test]
fn test_unknown_kind_code_raises_kind_error() {
    let (interceptor, engine) = setup();
    let recorder = Recorder::new();
    let index = interceptor
        .add_before(pointcut("Foo::bar"), recorder.advice(Value::Null), AddOptions::default())
        .unwrap();

    let mut event = MemoryJoinPoint::new(999, "Foo::bar");
    let err = engine.fire(Category::Before, &mut event).unwrap_err();

    assert!(matches!(err, WeaveError::Kind(999)));
    assert_eq!(err.to_string(), "The kind (999) is invalid.");
    assert!(interceptor.was_called(index).unwrap());
    assert_eq!(recorder.calls(), 0);
}

#[test]
fn test_join_point_exposes_matched_pointcut() {
    let (interceptor, engine) = setup();
    let pc = pointcut("Foo::bar");
    let expected = Arc::clone(&pc);
    let advice = FnAdvice::shared(move |jp| {
        assert!(Arc::ptr_eq(jp.pointcut(), &expected));
        assert_eq!(jp.matched_pointcut(), "Foo::bar");
        Ok(json!(jp.index()))
    });
    let index = interceptor.add_before(pc, advice, AddOptions::default()).unwrap();

    let mut event = MemoryJoinPoint::new(engine_codes::BEFORE_METHOD, "Foo::bar");
    let result = engine.fire(Category::Before, &mut event).unwrap();

    assert_eq!(result, Some(json!(index)));
}
