//! Module environment exposed to sandboxed code.
//!
//! Generated components may `require` only the capabilities registered here.
//! Anything else resolves to `null` and is reported back as unresolved.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

const REACT_RUNTIME: &str = include_str!("runtime/react.js");
const ICONS_RUNTIME: &str = include_str!("runtime/icons.js");
const HARNESS: &str = include_str!("runtime/harness.js");

static STANDARD: LazyLock<Arc<ModuleEnvironment>> = LazyLock::new(|| {
    Arc::new(
        ModuleEnvironment::new(Capability::new("react", REACT_RUNTIME))
            .with(Capability::new("lucide-react", ICONS_RUNTIME)),
    )
});

/// A module the sandbox can hand to `require`.
///
/// `script` is a JS function expression `(modules, host) => exports`. It is
/// evaluated once per isolate, after every capability registered before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    specifier: Cow<'static, str>,
    script: Cow<'static, str>,
}

impl Capability {
    /// A capability answering `require(specifier)` with the value `script`
    /// evaluates to.
    pub fn new(specifier: impl Into<Cow<'static, str>>, script: impl Into<Cow<'static, str>>) -> Self {
        Self {
            specifier: specifier.into(),
            script: script.into(),
        }
    }

    /// Exact module name matched by `require`.
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// Source of the factory expression.
    pub fn script(&self) -> &str {
        &self.script
    }
}

/// Fixed, ordered set of capabilities.
///
/// The first capability is the renderer; it is also bound to the `React`
/// identifier inside component bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEnvironment {
    capabilities: Vec<Capability>,
}

impl ModuleEnvironment {
    /// Start an environment around a renderer capability.
    pub fn new(renderer: Capability) -> Self {
        Self {
            capabilities: vec![renderer],
        }
    }

    /// Register another capability. A later registration of the same
    /// specifier replaces the earlier one in place.
    pub fn with(mut self, capability: Capability) -> Self {
        match self
            .capabilities
            .iter_mut()
            .find(|c| c.specifier == capability.specifier)
        {
            Some(existing) => *existing = capability,
            None => self.capabilities.push(capability),
        }
        self
    }

    /// The shared default environment: `react` and `lucide-react`.
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Look up a capability by its exact specifier.
    pub fn resolve(&self, specifier: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.specifier == specifier)
    }

    /// The capability bound to `React` and used to render the default export.
    pub fn renderer(&self) -> &Capability {
        &self.capabilities[0]
    }

    /// Registered specifiers in evaluation order, renderer first.
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(|c| c.specifier())
    }

    /// Bootstrap script evaluated in every fresh isolate.
    pub(crate) fn prelude(&self) -> String {
        let mut out = String::from(
            "globalThis.__uiforge_modules = Object.create(null);\n\
             globalThis.__uiforge_host = Object.create(null);\n",
        );

        for capability in &self.capabilities {
            out.push_str(&format!(
                "__uiforge_modules[{}] = ({})(__uiforge_modules, __uiforge_host);\n",
                js_string(capability.specifier()),
                trim_script(capability.script())
            ));
        }

        out.push_str(&format!(
            "globalThis.__uiforge_renderer = {};\n",
            js_string(self.renderer().specifier())
        ));
        out.push_str(trim_script(HARNESS));
        out.push_str(";\n");
        out
    }
}

fn trim_script(script: &str) -> &str {
    script.trim_end().trim_end_matches(';')
}

/// Quote a string as a JS literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}
