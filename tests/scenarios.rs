//! End-to-end scenarios (spec.md §8 "S1"–"S7"), exercised through the public
//! `chtl::compile` entry point exactly as a consumer of the crate would call
//! it — no internal module is touched directly.

use chtl::Config;

fn compile_ok(src: &str) -> chtl::CompileResult {
    let result = chtl::compile(src, &Config::default());
    assert!(!result.failed(), "unexpected errors: {:?}", result.errors);
    result
}

#[test]
fn s1_minimal_element() {
    let result = compile_ok(r#"div { id: "x"; text { "hi" } }"#);
    assert!(result.html.contains(r#"<div id="x">hi</div>"#));
}

#[test]
fn s2_template_style_with_inheritance() {
    let src = r#"
        [Template] @Style BaseStyle { color: blue; font-weight: bold; }
        [Template] @Style FullStyle { inherit BaseStyle; font-size: 20px; color: red; }
        div { style { @Style FullStyle; } }
    "#;
    let result = compile_ok(src);
    let style_start = result.html.find("style=\"").expect("inline style attribute");
    let style_value = &result.html[style_start..];
    let color_blue = style_value.find("color: blue").expect("color: blue present");
    let font_weight = style_value.find("font-weight: bold").expect("font-weight: bold present");
    let font_size = style_value.find("font-size: 20px").expect("font-size: 20px present");
    let color_red = style_value.find("color: red").expect("color: red present");
    assert!(
        color_blue < font_weight && font_weight < font_size && font_size < color_red,
        "expected cascade order blue < font-weight < font-size < red, got: {style_value}"
    );
}

#[test]
fn s3_var_template() {
    let src = r#"
        [Template] @Var Theme { primary: "#00aaff"; }
        p { text { "x" } style { color: Theme(primary); } }
    "#;
    let result = compile_ok(src);
    assert!(result.html.contains("color: #00aaff;"), "html was: {}", result.html);
}

#[test]
fn s4_specialization_delete() {
    let src = r#"
        [Template] @Style BaseStyle { color: blue; font-weight: bold; }
        [Template] @Style FullStyle { inherit BaseStyle; font-size: 20px; color: red; }
        div { style { @Style FullStyle { delete font-weight; } } }
    "#;
    let result = compile_ok(src);
    assert!(!result.html.contains("font-weight"), "html was: {}", result.html);
    assert!(result.html.contains("color: red"));
}

#[test]
fn s5_script_passthrough() {
    let result = compile_ok(r#"div { script { console.log("hi"); } }"#);
    assert!(
        result.html.contains(r#"<script>console.log("hi");"#),
        "html was: {}",
        result.html
    );
}

#[test]
fn s6_scanner_chtljs_separation() {
    let src = "script { listen { click: () => 1 } function f(){} }";
    let result = compile_ok(src);
    assert!(result.html.contains("listen { click: () => 1 }"), "html was: {}", result.html);
    assert!(result.html.contains("function f(){}"), "html was: {}", result.html);
}

#[test]
fn s7_cycle_detection() {
    let src = r#"
        [Template] @Style A : B { }
        [Template] @Style B : A { }
    "#;
    let result = chtl::compile(src, &Config::default());
    assert!(result.failed());
    assert!(result.errors.iter().any(|e| e.code == "E-CYCLE-001"));
}
