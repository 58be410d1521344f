//! File-target behavior of the driver.

use segen_driver::Driver;
use serde_json::json;
use tempfile::tempdir;

fn minimal_tree(outfile: Option<&str>, outfile_h: Option<&str>) -> String {
    let fragments: Vec<_> = [
        ("se_global_variables", "// generated module: $js_module_name\n"),
        ("jsc_global_registration",
         "se::Object* $jsmangledname = register_namespace(\"$jsname\", $jsparent); $jsglobalfunctions $jsglobalvariables"),
        ("js_initializer",
         "bool register_all_$jsname(se::Object* obj) { $jsregisternamespaces $jsregisterclasses return true; }"),
        ("js_register_module_declare", "bool register_all_$js_module_name(se::Object* obj);\n"),
    ]
    .iter()
    .map(|(name, code)| {
        json!({
            "nodeType": "fragment",
            "attributes": {"section": "templates", "value": name, "code": code}
        })
    })
    .collect();

    let mut attributes = serde_json::Map::new();
    attributes.insert("name".into(), json!("demo"));
    if let Some(outfile) = outfile {
        attributes.insert("outfile".into(), json!(outfile));
    }
    if let Some(outfile_h) = outfile_h {
        attributes.insert("outfile_h".into(), json!(outfile_h));
    }

    json!({
        "nodeType": "top",
        "attributes": attributes,
        "children": fragments
    })
    .to_string()
}

#[test]
fn writes_both_output_files_from_tree_attributes() {
    let dir = tempdir().unwrap();
    let cpp = dir.path().join("demo_wrap.cpp");
    let h = dir.path().join("demo_wrap.h");

    let tree = minimal_tree(cpp.to_str(), h.to_str());
    Driver::new().run_source(&tree).unwrap();

    let cpp_text = std::fs::read_to_string(&cpp).unwrap();
    let h_text = std::fs::read_to_string(&h).unwrap();

    assert!(cpp_text.contains("automatically generated by segen"));
    assert!(cpp_text.contains("bool register_all_demo(se::Object* obj)"));
    assert!(h_text.contains("bool register_all_demo(se::Object* obj);"));
}

#[test]
fn cli_style_overrides_beat_tree_attributes() {
    let dir = tempdir().unwrap();
    let tree_cpp = dir.path().join("from_tree.cpp");
    let tree_h = dir.path().join("from_tree.h");
    let override_cpp = dir.path().join("override.cpp");
    let override_h = dir.path().join("override.h");

    let tree = minimal_tree(tree_cpp.to_str(), tree_h.to_str());
    Driver::new()
        .outfile(&override_cpp)
        .outfile_h(&override_h)
        .run_source(&tree)
        .unwrap();

    assert!(override_cpp.exists());
    assert!(override_h.exists());
    assert!(!tree_cpp.exists());
    assert!(!tree_h.exists());
}

#[test]
fn run_file_reads_the_tree_from_disk() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("demo.json");
    let cpp = dir.path().join("demo_wrap.cpp");
    let h = dir.path().join("demo_wrap.h");

    std::fs::write(&input, minimal_tree(cpp.to_str(), h.to_str())).unwrap();

    let module = Driver::new().run_file(&input).unwrap();
    assert!(module.implementation.contains("// generated module: demo"));
    assert!(cpp.exists());
}

#[test]
fn missing_input_file_is_an_io_error() {
    let err = Driver::new().run_file("/nonexistent/tree.json").unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
