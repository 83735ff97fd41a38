//! Scenario 6 from spec.md §8: a file backend registered into a real
//! [`metacall_core::LoaderRegistry`], resolved against a configured
//! execution path, with and without `LOADER_SCRIPT_PATH` set.
//!
//! Both branches run in one test function since they toggle a shared
//! process environment variable and must not race against each other.

use std::fs;

use metacall_core::{LoadSource, LoaderRegistry, Value};
use metacall_loader_file::{FileLoaderBackend, register_file_type};

#[test]
fn resolves_against_execution_path_and_names_relative_to_script_path() {
    let base = std::env::temp_dir().join("metacall_loader_file_e2e_base");
    let sub = base.join("x");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("y.txt"), "hello").unwrap();

    let registry = LoaderRegistry::new().unwrap();
    registry.register_backend("file", Box::new(FileLoaderBackend::new("file"))).unwrap();
    register_file_type(&registry, "file").unwrap();
    registry.execution_path("file", &base.to_string_lossy()).unwrap();

    // SAFETY: this test owns `LOADER_SCRIPT_PATH` for its whole body and
    // no other test in this binary reads or writes it, so there is no
    // concurrent access for `set_var`'s caller contract to worry about.
    unsafe {
        std::env::set_var("LOADER_SCRIPT_PATH", sub.to_string_lossy().as_ref());
    }
    let handle = registry.load("file", LoadSource::File(&["x/y.txt".to_owned()])).unwrap();
    assert_eq!(registry.invoke("y.txt", &[]).unwrap(), Value::string(sub.join("y.txt").to_string_lossy().into_owned()));
    registry.unload("file", handle).unwrap();
    // SAFETY: see the `set_var` call above — same single-owner guarantee.
    unsafe {
        std::env::remove_var("LOADER_SCRIPT_PATH");
    }

    let handle = registry.load("file", LoadSource::File(&["x/y.txt".to_owned()])).unwrap();
    let absolute = sub.join("y.txt").to_string_lossy().into_owned();
    assert_eq!(registry.invoke(&absolute, &[]).unwrap(), Value::string(absolute.clone()));
    registry.unload("file", handle).unwrap();

    registry.destroy().unwrap();
    let _ = fs::remove_dir_all(&base);
}
