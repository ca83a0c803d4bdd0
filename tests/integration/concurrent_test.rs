//! Concurrent toggling and dispatch.
//!
//! Every dispatch must see either the advice or the pass-through, never a
//! binding whose flag and handler disagree.

#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use aop_interceptor::engine::MemoryJoinPoint;
use aop_interceptor::kind::engine_codes;
use aop_interceptor::{AddOptions, Category, FnAdvice, Scope, StatusFilter};
use common::{pointcut, setup, Recorder};
use parking_lot::Mutex;
use serde_json::{json, Value};

const ITERATIONS: usize = 500;

#[test]
fn test_toggle_while_dispatching() {
    let (interceptor, engine) = setup();
    let recorder = Recorder::new();
    let index = interceptor
        .add_around(pointcut("Foo::bar()"), recorder.advice(json!("advice")), AddOptions::default())
        .unwrap();

    let advised = AtomicUsize::new(0);
    let passed = AtomicUsize::new(0);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..ITERATIONS {
                let scope = Scope::Index(index);
                if i % 2 == 0 {
                    interceptor.disable(scope).unwrap();
                } else {
                    interceptor.enable(scope).unwrap();
                }
            }
        });

        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..ITERATIONS {
                    let mut event = MemoryJoinPoint::new(engine_codes::AROUND_METHOD, "Foo::bar()")
                        .with_original(|_| Ok(json!("original")));
                    let result = engine.fire(Category::Around, &mut event).unwrap();

                    match result {
                        Some(v) if v == json!("advice") => {
                            assert_eq!(event.proceed_count(), 0);
                            advised.fetch_add(1, Ordering::SeqCst);
                        }
                        Some(v) if v == json!("original") => {
                            assert_eq!(event.proceed_count(), 1);
                            passed.fetch_add(1, Ordering::SeqCst);
                        }
                        other => panic!("unexpected result: {:?}", other),
                    }
                }
            });
        }
    });

    let advised = advised.load(Ordering::SeqCst);
    assert_eq!(advised + passed.load(Ordering::SeqCst), 4 * ITERATIONS);
    assert_eq!(recorder.calls(), advised);
    // Last toggle was an enable.
    assert_eq!(interceptor.is_enabled(Scope::Index(index)).unwrap(), Some(true));
}

#[test]
fn test_concurrent_registration_assigns_unique_indices() {
    let (interceptor, engine) = setup();
    let recorder = Recorder::new();

    let mut indices: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let interceptor = Arc::clone(&interceptor);
                let recorder = Arc::clone(&recorder);
                s.spawn(move || {
                    (0..25)
                        .map(|_| {
                            let selector = format!("worker{}()", t);
                            interceptor
                                .add_before(
                                    pointcut(&selector),
                                    recorder.advice(json!(null)),
                                    AddOptions::default(),
                                )
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    indices.sort_unstable();
    assert_eq!(indices, (1..=200).collect::<Vec<usize>>());
    assert_eq!(interceptor.len(), 200);
    assert_eq!(engine.registration_count(), 200);
    for t in 0..8 {
        let selector = format!("worker{}()", t);
        let found = interceptor.get_index_of_selector(&selector, StatusFilter::Any);
        assert_eq!(found.len(), 25);
        assert!(found.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_engine_fires_same_selector_in_index_order() {
    let (interceptor, engine) = setup();
    let order = Arc::new(Mutex::new(Vec::new()));

    thread::scope(|s| {
        for _ in 0..8 {
            let interceptor = Arc::clone(&interceptor);
            let order = Arc::clone(&order);
            s.spawn(move || {
                for _ in 0..25 {
                    let sink = Arc::clone(&order);
                    let advice = FnAdvice::shared(move |jp| {
                        sink.lock().push(jp.index());
                        Ok(Value::Null)
                    });
                    interceptor
                        .add_before(pointcut("shared()"), advice, AddOptions::default())
                        .unwrap();
                }
            });
        }
    });

    let mut event = MemoryJoinPoint::new(engine_codes::BEFORE_FUNCTION, "shared()");
    engine.fire(Category::Before, &mut event).unwrap();

    assert_eq!(*order.lock(), (1..=200).collect::<Vec<usize>>());
}
