//! Built-in formula functions (Rust) and their metadata.
//!
//! Conventions:
//! - Formula-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Aggregates take a Rhai array: `SUM([A, B, 3])`.
//! - Non-numeric arguments read as NaN, which the engine rejects as a
//!   non-finite result.
//! - If you add a new built-in, list it in `BUILTINS` and register its
//!   implementation in `register_builtins`.

use rhai::{Array, Dynamic, Engine};

pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        description: "Sum of numeric values in an array",
    },
    Builtin {
        name: "AVG",
        description: "Average of numeric values in an array",
    },
    Builtin {
        name: "MIN",
        description: "Minimum of an array, or of two values",
    },
    Builtin {
        name: "MAX",
        description: "Maximum of an array, or of two values",
    },
    Builtin {
        name: "ABS",
        description: "Absolute value",
    },
    Builtin {
        name: "ROUND",
        description: "Round to the nearest integer, or to N decimal places",
    },
    Builtin {
        name: "CLAMP",
        description: "Clamp a value into [lo, hi]",
    },
    Builtin {
        name: "IF",
        description: "IF(cond, then, else)",
    },
];

fn to_f64(value: &Dynamic) -> f64 {
    if let Ok(n) = value.as_float() {
        return n;
    }
    if let Ok(n) = value.as_int() {
        return n as f64;
    }
    if let Ok(b) = value.as_bool() {
        return if b { 1.0 } else { 0.0 };
    }
    f64::NAN
}

/// Look up a built-in by name, ignoring case. For help listings.
pub fn describe_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

fn fold_numbers(arr: &Array, init: f64, f: impl Fn(f64, f64) -> f64) -> f64 {
    arr.iter().map(to_f64).fold(init, f)
}

// f64::min/max silently drop NaN; keep it so bad inputs stay visible.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

pub fn register_builtins(engine: &mut Engine) {
    engine.register_fn("SUM", |arr: Array| -> f64 { fold_numbers(&arr, 0.0, |a, b| a + b) });

    engine.register_fn("AVG", |arr: Array| -> f64 {
        if arr.is_empty() {
            return f64::NAN;
        }
        fold_numbers(&arr, 0.0, |a, b| a + b) / arr.len() as f64
    });

    engine.register_fn("MIN", |arr: Array| -> f64 {
        if arr.is_empty() {
            return f64::NAN;
        }
        fold_numbers(&arr, f64::INFINITY, nan_min)
    });
    engine.register_fn("MIN", |a: Dynamic, b: Dynamic| -> f64 { nan_min(to_f64(&a), to_f64(&b)) });

    engine.register_fn("MAX", |arr: Array| -> f64 {
        if arr.is_empty() {
            return f64::NAN;
        }
        fold_numbers(&arr, f64::NEG_INFINITY, nan_max)
    });
    engine.register_fn("MAX", |a: Dynamic, b: Dynamic| -> f64 { nan_max(to_f64(&a), to_f64(&b)) });

    engine.register_fn("ABS", |x: Dynamic| -> f64 { to_f64(&x).abs() });

    engine.register_fn("ROUND", |x: Dynamic| -> f64 { to_f64(&x).round() });
    engine.register_fn("ROUND", |x: Dynamic, digits: i64| -> f64 {
        let factor = 10f64.powi(digits.clamp(-15, 15) as i32);
        (to_f64(&x) * factor).round() / factor
    });

    engine.register_fn("CLAMP", |x: Dynamic, lo: Dynamic, hi: Dynamic| -> f64 {
        let (x, lo, hi) = (to_f64(&x), to_f64(&lo), to_f64(&hi));
        if x.is_nan() || lo.is_nan() || hi.is_nan() || lo > hi {
            return f64::NAN;
        }
        x.clamp(lo, hi)
    });

    engine.register_fn("IF", |cond: bool, then: Dynamic, otherwise: Dynamic| -> Dynamic {
        if cond { then } else { otherwise }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        register_builtins(&mut engine);
        engine
    }

    #[test]
    fn test_builtin_names_are_caps_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for builtin in BUILTINS {
            assert_eq!(builtin.name, builtin.name.to_ascii_uppercase());
            assert!(seen.insert(builtin.name), "duplicate builtin {}", builtin.name);
        }
    }

    #[test]
    fn test_aggregates() {
        let engine = engine();
        assert_eq!(engine.eval::<f64>("SUM([1, 2.5, true])").unwrap(), 4.5);
        assert_eq!(engine.eval::<f64>("AVG([2, 4])").unwrap(), 3.0);
        assert_eq!(engine.eval::<f64>("MIN([3, 1, 2])").unwrap(), 1.0);
        assert_eq!(engine.eval::<f64>("MAX(3, 7.5)").unwrap(), 7.5);
        assert!(engine.eval::<f64>("AVG([])").unwrap().is_nan());
        assert!(engine.eval::<f64>("MAX([1, \"x\"])").unwrap().is_nan());
    }

    #[test]
    fn test_pairwise_min_max_keep_nan() {
        let engine = engine();
        assert_eq!(engine.eval::<f64>("MIN(4, 3)").unwrap(), 3.0);
        assert!(engine.eval::<f64>("MIN(\"x\", 3)").unwrap().is_nan());
        assert!(engine.eval::<f64>("MAX(3, \"x\")").unwrap().is_nan());
    }

    #[test]
    fn test_every_listed_builtin_is_registered() {
        let engine = engine();
        let calls = [
            ("SUM", "SUM([1, 2])"),
            ("AVG", "AVG([1, 2])"),
            ("MIN", "MIN([1, 2])"),
            ("MAX", "MAX([1, 2])"),
            ("ABS", "ABS(-1)"),
            ("ROUND", "ROUND(1.4)"),
            ("CLAMP", "CLAMP(1, 0, 2)"),
            ("IF", "IF(true, 1.0, 2.0)"),
        ];
        for builtin in BUILTINS {
            let (_, call) = calls
                .iter()
                .find(|(name, _)| *name == builtin.name)
                .unwrap_or_else(|| panic!("no sample call for {}", builtin.name));
            assert!(engine.eval::<f64>(call).is_ok(), "{} failed", call);
        }
        assert_eq!(calls.len(), BUILTINS.len());
    }

    #[test]
    fn test_describe_builtin() {
        assert_eq!(describe_builtin("clamp").map(|b| b.name), Some("CLAMP"));
        assert!(describe_builtin("SPILL").is_none());
    }

    #[test]
    fn test_rounding_and_clamp() {
        let engine = engine();
        assert_eq!(engine.eval::<f64>("ROUND(2.6)").unwrap(), 3.0);
        assert_eq!(engine.eval::<f64>("ROUND(2.346, 2)").unwrap(), 2.35);
        assert_eq!(engine.eval::<f64>("CLAMP(15, 0, 10)").unwrap(), 10.0);
        assert!(engine.eval::<f64>("CLAMP(5, 10, 0)").unwrap().is_nan());
    }

    #[test]
    fn test_if_returns_branch() {
        let engine = engine();
        assert_eq!(engine.eval::<i64>("IF(true, 1, 2)").unwrap(), 1);
        assert_eq!(engine.eval::<String>("IF(false, \"a\", \"b\")").unwrap(), "b");
    }
}
