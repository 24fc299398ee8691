//! V8-backed sandbox.

use std::time::{Duration, Instant};

use deno_core::{v8, JsRuntime, RuntimeOptions};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uiforge_transform::CompiledUnit;

use crate::artifact::Artifact;
use crate::config::{SandboxConfig, SHADOWED_GLOBALS};
use crate::error::SandboxError;
use crate::extract::{ExtractReply, Extraction};
use crate::modules::{js_string, ModuleEnvironment};
use crate::protocol::{forward_logs, ExecuteReply, RenderReply};
use crate::traits::{Renderable, Sandbox};
use crate::watchdog::Watchdog;

/// Runs each unit in its own V8 isolate.
///
/// The isolate exposes no filesystem, network or timer APIs. Only the
/// capabilities of the [`ModuleEnvironment`] are reachable via `require`.
#[derive(Debug, Default, Clone)]
pub struct IsolateSandbox {
    config: SandboxConfig,
}

impl IsolateSandbox {
    /// Sandbox whose script entries are each bounded by `config.timeout`.
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Limits applied to every run.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

impl Sandbox for IsolateSandbox {
    fn name(&self) -> &'static str {
        "v8"
    }

    fn run(&self, unit: &CompiledUnit, env: &ModuleEnvironment) -> Result<Artifact, SandboxError> {
        let started = Instant::now();

        let mut isolate = Isolate::boot(env, self.config.timeout)?;

        for specifier in isolate.execute(unit)? {
            tracing::warn!(%specifier, "Component required a module outside the sandbox environment");
        }

        let extraction = isolate.extract()?;

        tracing::debug!(
            origin = %extraction.origin,
            name = ?extraction.name,
            elapsed = ?started.elapsed(),
            "Extracted component"
        );

        Ok(Artifact::new(Box::new(isolate), extraction))
    }
}

/// A booted isolate with the harness installed.
struct Isolate {
    runtime: JsRuntime,
    timeout: Duration,
}

impl Isolate {
    fn boot(env: &ModuleEnvironment, timeout: Duration) -> Result<Self, SandboxError> {
        let runtime = JsRuntime::new(RuntimeOptions::default());
        let mut isolate = Self { runtime, timeout };

        isolate
            .eval("uiforge:prelude", env.prelude())
            .map_err(|err| match err {
                SandboxError::Timeout(limit) => SandboxError::Timeout(limit),
                other => SandboxError::Bootstrap(other.to_string()),
            })?;

        Ok(isolate)
    }

    fn execute(&mut self, unit: &CompiledUnit) -> Result<Vec<String>, SandboxError> {
        let script = format!(
            "__uiforge.execute({}, {})",
            js_string(&unit.code),
            serde_json::to_string(SHADOWED_GLOBALS).map_err(protocol)?
        );

        let reply: ExecuteReply = self.call("uiforge:execute", script)?;
        forward_logs(&reply.logs);
        reply.into_result()
    }

    fn extract(&mut self) -> Result<Extraction, SandboxError> {
        let reply: ExtractReply = self.call("uiforge:extract", "__uiforge.extract()".into())?;
        forward_logs(&reply.logs);
        reply.into_extraction()
    }

    /// Evaluate `script` and decode its JSON string result.
    fn call<T: DeserializeOwned>(&mut self, name: &'static str, script: String) -> Result<T, SandboxError> {
        let raw = self.eval(name, script)?;
        serde_json::from_str(&raw).map_err(protocol)
    }

    /// Evaluate `script` under the watchdog and stringify its completion value.
    fn eval(&mut self, name: &'static str, script: String) -> Result<String, SandboxError> {
        let watchdog = Watchdog::arm(self.runtime.v8_isolate().thread_safe_handle(), self.timeout);
        let result = self.runtime.execute_script(name, script);
        let expired = watchdog.disarm();

        let value = match result {
            Ok(value) => {
                if expired {
                    self.runtime.v8_isolate().cancel_terminate_execution();
                }
                value
            }
            Err(_) if expired => return Err(SandboxError::Timeout(self.timeout)),
            Err(err) => return Err(SandboxError::Runtime(err.to_string())),
        };

        let scope = &mut self.runtime.handle_scope();
        let local = v8::Local::new(scope, &value);
        Ok(local.to_rust_string_lossy(scope))
    }
}

impl Renderable for Isolate {
    fn render(&mut self, props: &Value) -> Result<String, SandboxError> {
        let script = format!(
            "__uiforge.render({})",
            serde_json::to_string(props).map_err(protocol)?
        );

        let reply: RenderReply = self.call("uiforge:render", script)?;
        forward_logs(&reply.logs);
        reply.into_result()
    }
}

fn protocol(err: serde_json::Error) -> SandboxError {
    SandboxError::Protocol(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExportOrigin;
    use serde_json::json;

    fn run(code: &str) -> Result<Artifact, SandboxError> {
        IsolateSandbox::default().run(&CompiledUnit::from_code(code), &ModuleEnvironment::standard())
    }

    fn render(code: &str) -> Result<String, SandboxError> {
        run(code)?.render_default()
    }

    #[test]
    fn renders_exported_function_component() {
        let html = render(
            r#"
function Card(props) {
  return React.createElement("div", { className: "card" }, "Hello ", props.name || "world");
}
exports.default = Card;
            "#,
        )
        .unwrap();

        assert_eq!(html, r#"<div class="card">Hello world</div>"#);
    }

    #[test]
    fn prefers_module_exports_default() {
        let artifact = run(
            r#"
exports.default = function A() { return React.createElement("a"); };
module.exports = { default: function B() { return React.createElement("b"); } };
            "#,
        )
        .unwrap();

        assert_eq!(artifact.origin(), ExportOrigin::ModuleDefault);
        assert_eq!(artifact.name(), Some("B"));
    }

    #[test]
    fn falls_back_to_exports_default() {
        let artifact = run(
            r#"
exports.default = function A() { return React.createElement("a"); };
module.exports = { helper: 1 };
            "#,
        )
        .unwrap();

        assert_eq!(artifact.origin(), ExportOrigin::ExportsDefault);
        assert_eq!(artifact.export_names(), ["helper".to_string()]);
    }

    #[test]
    fn falls_back_to_module_exports() {
        let mut artifact = run(
            r#"module.exports = function Plain() { return React.createElement("p", null, "plain"); };"#,
        )
        .unwrap();

        assert_eq!(artifact.origin(), ExportOrigin::ModuleExports);
        assert_eq!(artifact.render_default().unwrap(), "<p>plain</p>");
    }

    #[test]
    fn reports_missing_default() {
        match run("exports.helper = function helper() {};") {
            Err(SandboxError::NoDefaultExport { exports }) => {
                assert_eq!(exports, vec!["helper".to_string()]);
            }
            other => panic!("expected NoDefaultExport, got {:?}", other),
        }
    }

    #[test]
    fn non_component_default_is_not_an_artifact() {
        assert!(matches!(
            run(r#"exports.default = "hello";"#),
            Err(SandboxError::NoDefaultExport { .. })
        ));
    }

    #[test]
    fn syntax_errors_are_compile_errors() {
        assert!(matches!(run("exports.default = (("), Err(SandboxError::Compile(_))));
    }

    #[test]
    fn top_level_throw_is_a_runtime_error() {
        match run(r#"throw new Error("boom");"#) {
            Err(SandboxError::Runtime(message)) => assert_eq!(message, "boom"),
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn render_failures_are_runtime_errors() {
        let mut artifact = run(
            r#"exports.default = function Bad() { return null.x; };"#,
        )
        .unwrap();

        match artifact.render_default() {
            Err(SandboxError::Runtime(message)) => assert!(message.starts_with("TypeError")),
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn undefined_element_type_fails_render() {
        let mut artifact = run(
            r#"exports.default = function Broken() { return React.createElement(undefined); };"#,
        )
        .unwrap();

        let err = artifact.render_default().unwrap_err();
        assert!(err.to_string().contains("Element type is invalid"));
    }

    #[test]
    fn infinite_loops_time_out() {
        let sandbox = IsolateSandbox::new(SandboxConfig::with_timeout(Duration::from_millis(100)));
        let result = sandbox.run(
            &CompiledUnit::from_code("while (true) {}"),
            &ModuleEnvironment::standard(),
        );

        assert!(matches!(result, Err(SandboxError::Timeout(_))));
    }

    #[test]
    fn host_globals_are_shadowed() {
        let html = render(
            r#"
exports.default = function Globals() {
  return React.createElement("p", null, [typeof fetch, typeof Deno, typeof window, typeof globalThis].join(","));
};
            "#,
        )
        .unwrap();

        assert_eq!(html, "<p>undefined,undefined,undefined,undefined</p>");
    }

    #[test]
    fn global_intrinsics_cannot_be_replaced() {
        let html = render(
            r#"
var g = Function("return this")();
try { g.JSON.stringify = function () { return '{"ok":true,"origin":"module_default","exports":[]}'; }; } catch (e) {}
try { g.Object.keys = function () { return ["forged"]; }; } catch (e) {}
try { g.Array = null; } catch (e) {}
try { Object.prototype.polluted = true; } catch (e) {}
exports.default = function () {
  return React.createElement("ul", null, [1, 2].map(function (i) {
    return React.createElement("li", { key: i }, i);
  }), String({}.polluted));
};
            "#,
        )
        .unwrap();

        assert_eq!(html, "<ul><li>1</li><li>2</li>undefined</ul>");
    }

    #[test]
    fn tampering_cannot_forge_an_extraction() {
        match run(
            r#"
var g = Function("return this")();
try { g.JSON = { stringify: function () { return '{"ok":true,"origin":"module_default","exports":[]}'; } }; } catch (e) {}
exports.helper = 1;
            "#,
        ) {
            Err(SandboxError::NoDefaultExport { exports }) => {
                assert_eq!(exports, vec!["helper".to_string()]);
            }
            other => panic!("expected NoDefaultExport, got {:?}", other),
        }
    }

    #[test]
    fn blocked_elements_are_dropped() {
        let html = render(
            r#"
exports.default = function () {
  return React.createElement("div", null,
    React.createElement("script", null, "alert(1)"),
    React.createElement("iframe", { src: "https://example.com" }),
    React.createElement("object", { data: "x.swf" }),
    React.createElement("embed", { src: "x.swf" }),
    "ok");
};
            "#,
        )
        .unwrap();

        assert_eq!(html, "<div>ok</div>");
    }

    #[test]
    fn script_urls_are_stripped() {
        let html = render(
            r#"
exports.default = function () {
  return React.createElement("p", null,
    React.createElement("a", { href: " JaVaScript:alert(1)" }, "bad"),
    React.createElement("a", { href: "https://example.com" }, "good"),
    React.createElement("img", { src: "javascript:alert(1)", alt: "x" }),
    React.createElement("form", { action: "vbscript:x" }));
};
            "#,
        )
        .unwrap();

        assert_eq!(
            html,
            r#"<p><a>bad</a><a href="https://example.com">good</a><img alt="x"/><form></form></p>"#
        );
    }

    #[test]
    fn handler_and_malformed_attributes_are_dropped() {
        let html = render(
            r#"
exports.default = function () {
  var props = { onclick: "alert(1)", ONLOAD: "x()", title: "t" };
  props['x" onmouseover="alert(1)'] = "y";
  return React.createElement("span", props, "hi");
};
            "#,
        )
        .unwrap();

        assert_eq!(html, r#"<span title="t">hi</span>"#);
    }

    #[test]
    fn inner_html_is_sanitized() {
        let html = render(
            r#"
exports.default = function () {
  return React.createElement("div", {
    dangerouslySetInnerHTML: {
      __html: '<b onclick="x()">hi</b><script>alert(1)</script><a href="javascript:alert(1)">a</a>',
    },
  });
};
            "#,
        )
        .unwrap();

        assert_eq!(html, r##"<div><b>hi</b><a href="#">a</a></div>"##);
    }

    #[test]
    fn unknown_modules_resolve_to_null() {
        let html = render(
            r#"
var motion = require("framer-motion");
exports.default = function () { return React.createElement("i", null, String(motion)); };
            "#,
        )
        .unwrap();

        assert_eq!(html, "<i>null</i>");
    }

    #[test]
    fn icon_capability_renders_svg() {
        let html = render(
            r#"
var icons = require("lucide-react");
exports.default = function () { return React.createElement(icons.ShoppingCart, { size: 16 }); };
            "#,
        )
        .unwrap();

        assert!(html.starts_with("<svg"));
        assert!(html.contains(r#"width="16""#));
        assert!(html.contains("lucide-shopping-cart"));
        assert!(html.contains(r#"stroke-width="2""#));
    }

    #[test]
    fn renders_with_props_and_escapes_text() {
        let mut artifact = run(
            r#"exports.default = function (p) { return React.createElement("b", { title: p.title }, p.title); };"#,
        )
        .unwrap();

        let html = artifact.render(&json!({ "title": "a & <b>" })).unwrap();

        assert_eq!(html, r#"<b title="a &amp; &lt;b&gt;">a &amp; &lt;b&gt;</b>"#);
    }

    #[test]
    fn hooks_render_initial_state() {
        let html = render(
            r#"
var react = require("react");
exports.default = function Counter() {
  var state = react.useState(3);
  react.useEffect(function () { throw new Error("effects never run"); });
  return React.createElement("span", { onClick: function () { state[1](state[0] + 1); } }, state[0]);
};
            "#,
        )
        .unwrap();

        assert_eq!(html, "<span>3</span>");
    }

    #[test]
    fn console_output_does_not_reach_markup() {
        let html = render(
            r#"
console.log("rendering", { a: 1 });
exports.default = function () { console.warn("inside"); return React.createElement("hr"); };
            "#,
        )
        .unwrap();

        assert_eq!(html, "<hr/>");
    }
}
