//! Text formulas evaluated in a sandboxed Rhai interpreter.
//!
//! Formula text is compiled once into an expression AST (statements, loops
//! and `eval` are rejected) and evaluated against a fresh scope on every call.
//! Two source forms are accepted:
//!
//! - plain expressions that name inputs by id: `A + B`
//! - arrow form that names inputs positionally: `(a, b) => a + b`
//!
//! Plain form only binds ids that are valid identifiers; use the arrow form
//! for ids like `speed-km`.

use regex::Regex;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{AST, Dynamic, Engine, Scope};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::{Compute, ComputeError, Computation, ScriptError, Value};

const MAX_OPERATIONS: u64 = 100_000;
const MAX_CALL_LEVELS: usize = 16;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_STRING_SIZE: usize = 64 * 1024;
const MAX_ARRAY_SIZE: usize = 10_000;

fn arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*\(([^)]*)\)\s*=>\s*(.+)$").expect("arrow formula regex must compile")
    })
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
    })
}

/// Create a Rhai engine locked down for formula evaluation, with builtins registered.
pub fn create_sandbox_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(MAX_OPERATIONS);
    engine.set_max_call_levels(MAX_CALL_LEVELS);
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
    engine.set_max_string_size(MAX_STRING_SIZE);
    engine.set_max_array_size(MAX_ARRAY_SIZE);
    engine.set_module_resolver(DummyModuleResolver::new());
    engine.disable_symbol("eval");
    engine.on_print(|_| {});
    engine.on_debug(|_, _, _| {});
    crate::builtins::register_builtins(&mut engine);
    engine
}

fn sandbox() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(create_sandbox_engine)
}

/// Split arrow-form source into its parameter names and body.
/// Plain expressions come back with `None` parameters.
fn split_arrow(source: &str) -> Result<(Option<Vec<String>>, &str), ScriptError> {
    let Some(caps) = arrow_re().captures(source) else {
        return Ok((None, source));
    };
    let params: Vec<String> = caps
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or("")
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if let Some(bad) = params.iter().find(|p| !ident_re().is_match(p)) {
        return Err(ScriptError::InvalidParam(bad.clone()));
    }
    let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Ok((Some(params), body))
}

struct ScriptCompute {
    ast: AST,
    /// Variable name bound to each input position (`None` leaves it unbound).
    bindings: Vec<Option<String>>,
}

impl Compute for ScriptCompute {
    fn compute(&self, inputs: &[Value]) -> Result<Value, ComputeError> {
        let mut scope = Scope::new();
        for (name, value) in self.bindings.iter().zip(inputs) {
            if let Some(name) = name {
                scope.push_dynamic(name.clone(), value.to_dynamic());
            }
        }
        let result = sandbox()
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|e| ComputeError::Script(e.to_string()))?;
        Value::from_dynamic(&result).ok_or_else(|| {
            ComputeError::Failed(format!(
                "formula returned unsupported value of type {}",
                result.type_name()
            ))
        })
    }
}

impl Computation {
    /// Build a computation from formula text.
    ///
    /// The source is compiled immediately, so syntax errors surface here
    /// rather than during propagation.
    pub fn script<I, S>(
        inputs: I,
        output: impl Into<String>,
        source: &str,
    ) -> Result<Computation, ScriptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
        let (params, body) = split_arrow(source)?;

        let bindings: Vec<Option<String>> = match params {
            Some(params) => {
                if params.len() != inputs.len() {
                    return Err(ScriptError::ParamMismatch {
                        params: params.len(),
                        inputs: inputs.len(),
                    });
                }
                params.into_iter().map(Some).collect()
            }
            None => inputs
                .iter()
                .map(|id| ident_re().is_match(id).then(|| id.clone()))
                .collect(),
        };

        let ast = sandbox().compile_expression(body).map_err(|e| {
            debug!(source, error = %e, "formula rejected");
            ScriptError::Compile(e.to_string())
        })?;

        let compute = ScriptCompute { ast, bindings };
        Ok(Computation::from_compute(inputs, output, Arc::new(compute)).with_source(source.trim()))
    }
}
