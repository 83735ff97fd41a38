//! End-to-end scenarios from spec.md §8, against a mock backend that
//! stands in for a real Python loader — this crate carries no guest
//! language runtime of its own.

use std::rc::Rc;

use metacall_core::{
    BackendArtifact, Context, Function, FunctionDispatch, LoaderBackend, LoaderRegistry, MetacallError, Result,
    Signature, Value,
};

/// Publishes a fixed set of Python-equivalent functions on every load,
/// ignoring the requested paths — this backend models "a script exposing
/// multiply/divide/sum/strcat" without parsing anything.
struct MockPythonBackend;

struct MockDispatch;

impl FunctionDispatch for MockDispatch {
    fn invoke(&self, function: &Function, args: &[Value]) -> Result<Value> {
        match function.name.as_str() {
            "multiply" => {
                let a = args[0].to_long().expect("multiply takes integers");
                let b = args[1].to_long().expect("multiply takes integers");
                Ok(Value::long(a * b))
            }
            "divide" => {
                let a = args[0].to_double().expect("divide takes doubles");
                let b = args[1].to_double().expect("divide takes doubles");
                Ok(Value::double(a / b))
            }
            "sum" => {
                let a = args[0].to_long().expect("sum takes integers");
                let b = args[1].to_long().expect("sum takes integers");
                Ok(Value::long(a + b))
            }
            "strcat" => {
                let a = args[0].to_string_value().expect("strcat takes strings");
                let b = args[1].to_string_value().expect("strcat takes strings");
                Ok(Value::string(format!("{a}{b}")))
            }
            other => Err(MetacallError::NotFound(other.to_owned())),
        }
    }
}

impl LoaderBackend for MockPythonBackend {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_from_file(&mut self, _paths: &[String]) -> Result<BackendArtifact> {
        Ok(0)
    }

    fn clear(&mut self, _artifact: BackendArtifact) -> Result<()> {
        Ok(())
    }

    fn discover(&mut self, _artifact: BackendArtifact, context: &mut Context) -> Result<()> {
        let dispatch: Rc<dyn FunctionDispatch> = Rc::new(MockDispatch);
        for (name, arity) in [("multiply", 2), ("divide", 2), ("sum", 2), ("strcat", 2)] {
            let function = Function::new(name, Signature::new(arity), "py", Rc::clone(&dispatch), true);
            context.scope_mut().define(name, Value::Function(Box::new(function)))?;
        }
        Ok(())
    }

    fn function_interface(&self) -> Rc<dyn FunctionDispatch> {
        Rc::new(MockDispatch)
    }
}

fn registry_with_python_module() -> LoaderRegistry {
    let registry = LoaderRegistry::new().unwrap();
    registry.register_backend("py", Box::new(MockPythonBackend)).unwrap();
    registry.load("py", metacall_core::LoadSource::File(&["script.py".to_owned()])).unwrap();
    registry
}

#[test]
fn scenario_1_python_multiply() {
    let registry = registry_with_python_module();
    assert_eq!(registry.invoke("multiply", &[Value::long(5), Value::long(15)]).unwrap(), Value::long(75));
    for i in 0..10i64 {
        assert_eq!(registry.invoke("multiply", &[Value::long(7), Value::long(i)]).unwrap(), Value::long(7 * i));
    }
}

#[test]
fn scenario_2_python_divide() {
    let registry = registry_with_python_module();
    assert_eq!(registry.invoke("divide", &[Value::double(64.0), Value::double(2.0)]).unwrap(), Value::double(32.0));
}

#[test]
fn scenario_3_python_sum() {
    let registry = registry_with_python_module();
    assert_eq!(registry.invoke("sum", &[Value::long(1000), Value::long(3500)]).unwrap(), Value::long(4500));
    assert_eq!(registry.invoke("sum", &[Value::long(3), Value::long(4)]).unwrap(), Value::long(7));
}

#[test]
fn scenario_4_absent_symbol_is_not_found_not_a_crash() {
    let registry = registry_with_python_module();
    let err = registry.invoke("hello", &[]).unwrap_err();
    assert_eq!(err, MetacallError::NotFound("hello".to_owned()));
}

#[test]
fn scenario_5_python_strcat() {
    let registry = registry_with_python_module();
    let result = registry.invoke("strcat", &[Value::string("Hello "), Value::string("Universe")]).unwrap();
    assert_eq!(result, Value::string("Hello Universe"));
}

#[test]
fn clearing_a_handle_removes_every_name_it_introduced() {
    let registry = LoaderRegistry::new().unwrap();
    registry.register_backend("py", Box::new(MockPythonBackend)).unwrap();
    let handle = registry.load("py", metacall_core::LoadSource::File(&["script.py".to_owned()])).unwrap();

    assert!(registry.invoke("multiply", &[Value::long(1), Value::long(1)]).is_ok());

    registry.unload("py", handle).unwrap();
    let err = registry.invoke("multiply", &[Value::long(1), Value::long(1)]).unwrap_err();
    assert_eq!(err, MetacallError::NotFound("multiply".to_owned()));
}

#[test]
fn teardown_runs_without_error() {
    let registry = registry_with_python_module();
    registry.destroy().unwrap();
}
