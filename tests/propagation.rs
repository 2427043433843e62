//! End-to-end behaviour of the reactive cell graph.

use reflow::{
    Computation, ComputeError, ConfigurationError, Engine, NUMBER_TYPE, ReflowError,
    VALUE_PROPERTY, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn dashboard(ids: &[&str]) -> Engine {
    let mut engine = Engine::new();
    engine.create_dashboard("main").unwrap();
    engine.set_current_dashboard("main").unwrap();
    for id in ids {
        engine.create_element(id, NUMBER_TYPE).unwrap();
    }
    engine
}

fn num(engine: &Engine, id: &str) -> Option<f64> {
    engine.value(id).and_then(Value::as_number)
}

/// X = A + B, solvable for either side. Solving for B wins over solving for A.
fn sum_engine() -> Engine {
    let mut engine = dashboard(&["A", "B", "X"]);
    engine.create_formula("X=A+B").unwrap();
    engine
        .add_computations(
            "X=A+B",
            [
                ("forward", Computation::numeric(["A", "B"], "X", |v| v[0] + v[1])),
                (
                    "solve_for_b",
                    Computation::numeric(["X", "A"], "B", |v| v[0] - v[1]).with_priority(-1),
                ),
                (
                    "solve_for_a",
                    Computation::numeric(["X", "B"], "A", |v| v[0] - v[1]).with_priority(-2),
                ),
            ],
        )
        .unwrap();
    engine.start();
    engine
}

#[test]
fn test_bidirectional_sum() {
    let mut engine = sum_engine();

    engine.set_value("A", 5.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(5.0));

    engine.set_value("B", 3.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(8.0));

    engine.set_value("X", 10.0).unwrap();
    assert_eq!(num(&engine, "A"), Some(5.0));
    assert_eq!(num(&engine, "B"), Some(5.0));
    assert!(engine.last_errors().is_empty());
}

#[test]
fn test_rewriting_current_value_is_a_no_op() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut engine = dashboard(&["A", "X"]);
    engine.create_formula("f").unwrap();
    engine
        .add_computations(
            "f",
            [(
                "double",
                Computation::numeric(["A"], "X", move |v| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    v[0] * 2.0
                }),
            )],
        )
        .unwrap();
    engine.start();
    engine.set_value("A", 5.0).unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let sink = notified.clone();
    engine
        .observe("X", VALUE_PROPERTY, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    let calls_before = calls.load(Ordering::SeqCst);
    let notified_before = notified.load(Ordering::SeqCst);
    let revision = engine.revision();

    engine.set_value("A", 5.0).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), calls_before);
    assert_eq!(notified.load(Ordering::SeqCst), notified_before);
    assert_eq!(engine.revision(), revision);
}

#[test]
fn test_mutual_equality_settles_in_one_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (c1, c2) = (calls.clone(), calls.clone());
    let mut engine = dashboard(&["A", "B"]);
    engine.create_formula("A=B").unwrap();
    engine
        .add_computations(
            "A=B",
            [
                (
                    "a_from_b",
                    Computation::numeric(["B"], "A", move |v| {
                        c1.fetch_add(1, Ordering::SeqCst);
                        v[0]
                    }),
                ),
                (
                    "b_from_a",
                    Computation::numeric(["A"], "B", move |v| {
                        c2.fetch_add(1, Ordering::SeqCst);
                        v[0]
                    }),
                ),
            ],
        )
        .unwrap();
    engine.start();
    calls.store(0, Ordering::SeqCst);

    engine.set_value("A", 7.0).unwrap();
    assert_eq!(num(&engine, "B"), Some(7.0));
    assert!(calls.load(Ordering::SeqCst) <= 2);

    engine.set_value("B", -1.0).unwrap();
    assert_eq!(num(&engine, "A"), Some(-1.0));
}

#[test]
fn test_multi_hop_chain() {
    let mut engine = dashboard(&["A", "B", "C", "X", "Y"]);
    engine.create_formula("X=A+B").unwrap();
    engine.create_formula("Y=X*C").unwrap();
    engine
        .add_computations(
            "X=A+B",
            [("forward", Computation::numeric(["A", "B"], "X", |v| v[0] + v[1]))],
        )
        .unwrap();
    engine
        .add_computations(
            "Y=X*C",
            [("forward", Computation::numeric(["X", "C"], "Y", |v| v[0] * v[1]))],
        )
        .unwrap();
    engine.start();

    engine.set_value("A", 5.0).unwrap();
    engine.set_value("B", 3.0).unwrap();
    engine.set_value("C", 2.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(8.0));
    assert_eq!(num(&engine, "Y"), Some(16.0));

    engine.set_value("C", 4.0).unwrap();
    assert_eq!(num(&engine, "Y"), Some(32.0));
    assert_eq!(num(&engine, "X"), Some(8.0));
}

#[test]
fn test_missing_input_registers_nothing() {
    let mut engine = dashboard(&["A", "X"]);
    engine.create_formula("f").unwrap();
    let err = engine
        .add_computations(
            "f",
            [("forward", Computation::numeric(["A", "ghost"], "X", |v| v[0] + v[1]))],
        )
        .unwrap_err();
    assert_eq!(
        err,
        ReflowError::Configuration(ConfigurationError::UnknownInput {
            computation: "forward".to_string(),
            input: "ghost".to_string(),
        })
    );
    assert!(engine.get("f").unwrap().computations().is_empty());
}

#[test]
fn test_failing_computations_leave_output_and_siblings_run() {
    let mut engine = dashboard(&["A", "err", "boom", "ratio", "ok"]);
    engine.create_formula("f").unwrap();
    engine
        .add_computations(
            "f",
            [
                (
                    "err",
                    Computation::new(["A"], "err", |_: &[Value]| {
                        Err(ComputeError::Failed("unavailable".to_string()))
                    }),
                ),
                (
                    "boom",
                    Computation::numeric(["A"], "boom", |v| {
                        if v[0] > 1.0 {
                            panic!("exploded");
                        }
                        v[0]
                    }),
                ),
                ("ratio", Computation::numeric(["A"], "ratio", |v| 1.0 / (v[0] - 2.0))),
                ("ok", Computation::numeric(["A"], "ok", |v| v[0] + 100.0)),
            ],
        )
        .unwrap();
    engine.start();
    engine.set_value("A", 1.0).unwrap();
    assert_eq!(num(&engine, "boom"), Some(1.0));
    assert_eq!(num(&engine, "ratio"), Some(-1.0));

    engine.set_value("A", 2.0).unwrap();
    assert_eq!(num(&engine, "ok"), Some(102.0));
    assert_eq!(num(&engine, "boom"), Some(1.0));
    assert_eq!(num(&engine, "ratio"), Some(-1.0));
    assert_eq!(engine.value("err"), None);

    let mut failed: Vec<_> = engine
        .last_errors()
        .iter()
        .map(|f| f.computation.as_str())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["boom", "err", "ratio"]);
    assert!(
        engine
            .last_errors()
            .iter()
            .any(|f| matches!(f.error, ComputeError::NonFinite(_)))
    );
    assert!(
        engine
            .last_errors()
            .iter()
            .any(|f| matches!(f.error, ComputeError::Panicked(_)))
    );
}

#[test]
fn test_snapshots_are_never_torn() {
    let mut engine = sum_engine();
    let torn = Arc::new(Mutex::new(Vec::new()));
    let sink = torn.clone();
    engine.observe_state(move |snapshot| {
        let get = |id: &str| snapshot.value(id).and_then(Value::as_number);
        if let (Some(a), Some(b), Some(x)) = (get("A"), get("B"), get("X")) {
            if a + b != x {
                sink.lock().unwrap().push((snapshot.revision, a, b, x));
            }
        }
    });

    engine.set_value("A", 5.0).unwrap();
    engine.set_value("B", 3.0).unwrap();
    engine.set_value("X", 10.0).unwrap();
    engine.set_value("A", 1.5).unwrap();
    assert!(torn.lock().unwrap().is_empty(), "{:?}", torn.lock().unwrap());
}

#[test]
fn test_one_notification_per_cell_per_write() {
    let mut engine = sum_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for id in ["A", "B", "X"] {
        let sink = seen.clone();
        engine
            .observe(id, VALUE_PROPERTY, move |v| {
                sink.lock().unwrap().push((id, v.clone()));
            })
            .unwrap();
    }
    seen.lock().unwrap().clear();

    engine.set_value("X", 4.0).unwrap();
    let got = seen.lock().unwrap().clone();
    assert_eq!(got, vec![("X", Value::from(4.0)), ("B", Value::from(4.0))]);
}

#[test]
fn test_start_initialises_existing_formulas() {
    let mut engine = dashboard(&["A", "B", "X"]);
    engine.set_value("A", 2.0).unwrap();
    engine.set_value("B", 5.0).unwrap();
    engine.create_formula("X=A+B").unwrap();
    engine
        .add_computations(
            "X=A+B",
            [("forward", Computation::numeric(["A", "B"], "X", |v| v[0] + v[1]))],
        )
        .unwrap();
    assert_eq!(engine.value("X"), None);

    engine.start();
    assert_eq!(num(&engine, "X"), Some(7.0));
}

#[test]
fn test_text_formulas() {
    let mut engine = dashboard(&["celsius", "fahrenheit"]);
    engine.create_formula("temperature").unwrap();
    engine
        .add_computations(
            "temperature",
            [
                (
                    "to_f",
                    Computation::script(["celsius"], "fahrenheit", "celsius * 9.0 / 5.0 + 32.0")
                        .unwrap(),
                ),
                (
                    "to_c",
                    Computation::script(["fahrenheit"], "celsius", "(f) => (f - 32.0) * 5.0 / 9.0")
                        .unwrap()
                        .with_priority(-1),
                ),
            ],
        )
        .unwrap();
    engine.start();

    engine.set_value("celsius", 100.0).unwrap();
    assert_eq!(num(&engine, "fahrenheit"), Some(212.0));
    engine.set_value("fahrenheit", 32.0).unwrap();
    assert_eq!(num(&engine, "celsius"), Some(0.0));

    assert!(Computation::script(["celsius"], "fahrenheit", "celsius *").is_err());
}

#[test]
fn test_priority_beats_registration_order() {
    let mut engine = dashboard(&["A", "B", "X"]);
    engine.create_formula("X=A+B").unwrap();
    engine
        .add_computations(
            "X=A+B",
            [
                (
                    "solve_for_a",
                    Computation::numeric(["X", "B"], "A", |v| v[0] - v[1]).with_priority(-2),
                ),
                (
                    "solve_for_b",
                    Computation::numeric(["X", "A"], "B", |v| v[0] - v[1]).with_priority(-1),
                ),
                ("forward", Computation::numeric(["A", "B"], "X", |v| v[0] + v[1])),
            ],
        )
        .unwrap();
    engine.start();

    engine.set_value("A", 5.0).unwrap();
    engine.set_value("B", 3.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(8.0));

    engine.set_value("X", 10.0).unwrap();
    assert_eq!(num(&engine, "A"), Some(5.0));
    assert_eq!(num(&engine, "B"), Some(5.0));
}

#[test]
fn test_equal_priority_prefers_earlier_formula() {
    let mut engine = dashboard(&["A", "X"]);
    engine.create_formula("double").unwrap();
    engine.create_formula("triple").unwrap();
    // Registered in the opposite order to formula creation.
    engine
        .add_computations("triple", [("x", Computation::numeric(["A"], "X", |v| v[0] * 3.0))])
        .unwrap();
    engine
        .add_computations("double", [("x", Computation::numeric(["A"], "X", |v| v[0] * 2.0))])
        .unwrap();
    engine.start();

    engine.set_value("A", 4.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(8.0));
}

#[test]
fn test_equal_priority_same_formula_prefers_name() {
    let mut engine = dashboard(&["A", "X"]);
    engine.create_formula("f").unwrap();
    engine
        .add_computations(
            "f",
            [
                ("plus_two", Computation::numeric(["A"], "X", |v| v[0] + 2.0)),
                ("plus_one", Computation::numeric(["A"], "X", |v| v[0] + 1.0)),
            ],
        )
        .unwrap();
    engine.start();

    engine.set_value("A", 4.0).unwrap();
    assert_eq!(num(&engine, "X"), Some(5.0));
}

#[test]
fn test_diamond_settles_regardless_of_names() {
    for (upstream, downstream) in [("a_x", "b_y"), ("b_x", "a_y")] {
        let mut engine = dashboard(&["A", "B", "X", "Y"]);
        engine.create_formula("f").unwrap();
        engine
            .add_computations(
                "f",
                [
                    (downstream, Computation::numeric(["X", "A"], "Y", |v| v[0] + v[1])),
                    (upstream, Computation::numeric(["A", "B"], "X", |v| v[0] + v[1])),
                ],
            )
            .unwrap();
        engine.start();

        engine.set_value("B", 3.0).unwrap();
        engine.set_value("A", 5.0).unwrap();
        assert_eq!(num(&engine, "X"), Some(8.0), "{upstream}/{downstream}");
        assert_eq!(num(&engine, "Y"), Some(13.0), "{upstream}/{downstream}");
    }
}
