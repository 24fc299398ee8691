//! Preview lifecycle controller.

use serde_json::Value;
use uiforge_transform::SourceText;

use crate::pipeline::Pipeline;
use crate::state::{Failure, PreviewSnapshot, PreviewState, Rendered};

/// Owns the single live artifact and moves between preview states.
///
/// Each submission fully replaces the previous state. Nothing from an earlier
/// submission, artifact or error, survives a later one.
#[derive(Debug)]
pub struct PreviewController {
    pipeline: Pipeline,
    state: PreviewState,
    revision: u64,
    props: Value,
}

impl PreviewController {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            state: PreviewState::Idle,
            revision: 0,
            props: Value::Object(Default::default()),
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// Revision of the last applied submission.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Props used for the next render.
    pub fn set_props(&mut self, props: Value) {
        self.props = props;
    }

    /// Process `source` as the newest submission.
    pub fn submit(&mut self, source: &SourceText) -> &PreviewState {
        let revision = self.revision + 1;
        self.apply(revision, source);
        &self.state
    }

    /// Process `source` for `revision`.
    ///
    /// Returns `false` and leaves the state untouched when a submission with
    /// an equal or newer revision has already been applied.
    pub fn apply(&mut self, revision: u64, source: &SourceText) -> bool {
        if revision <= self.revision {
            tracing::debug!(revision, current = self.revision, "Discarding stale submission");
            return false;
        }
        self.revision = revision;

        // The previous isolate has to go before the next one is created on
        // this thread.
        self.state = PreviewState::Idle;

        self.state = match self.pipeline.render(source, &self.props) {
            Ok((artifact, markup)) => {
                tracing::info!(
                    revision,
                    component = artifact.name().unwrap_or("<anonymous>"),
                    "Preview updated"
                );
                PreviewState::Rendering(Rendered {
                    artifact,
                    markup,
                    revision,
                })
            }
            Err(error) => {
                tracing::warn!(revision, kind = error.kind(), "Preview failed: {}", error);
                PreviewState::Failed(Failure { error, revision })
            }
        };

        true
    }

    /// Render the live artifact again with new props.
    pub fn rerender(&mut self, props: Value) -> &PreviewState {
        self.props = props;

        if let PreviewState::Rendering(rendered) = &mut self.state {
            match rendered.artifact.render(&self.props) {
                Ok(markup) => rendered.markup = markup,
                Err(err) => {
                    let revision = rendered.revision;
                    tracing::warn!(revision, "Re-render failed: {}", err);
                    self.state = PreviewState::Failed(Failure {
                        error: err.into(),
                        revision,
                    });
                }
            }
        }

        &self.state
    }

    /// Drop the live artifact and return to `Idle`. Revisions keep counting.
    pub fn clear(&mut self) {
        self.state = PreviewState::Idle;
    }

    /// Count revisions up to `revision` as handled without applying them.
    pub fn retire(&mut self, revision: u64) {
        self.revision = self.revision.max(revision);
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        match self.state {
            PreviewState::Idle => PreviewSnapshot::Idle {
                revision: self.revision,
            },
            _ => self.state.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreviewError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uiforge_sandbox::{ExportOrigin, NO_COMPONENT_MESSAGE};
    use uiforge_transform::Passthrough;

    const FOO: &str = r#"
import React from 'react';

function Foo({ label = 'Foo' }) {
  return <section className="foo"><h2>{label}</h2></section>;
}

export default Foo;
"#;

    const COUNTER: &str = r#"
import React, { useState } from 'react';
import { Plus } from 'lucide-react';

export default function Counter() {
  const [count, setCount] = useState(0);
  return (
    <button onClick={() => setCount(count + 1)}>
      <Plus size={12} /> Count: {count}
    </button>
  );
}
"#;

    fn controller() -> PreviewController {
        PreviewController::new(Pipeline::default())
    }

    fn submit(controller: &mut PreviewController, source: &str) -> PreviewSnapshot {
        controller.submit(&SourceText::from(source)).snapshot()
    }

    fn failure(snapshot: &PreviewSnapshot) -> (&str, &str) {
        match snapshot {
            PreviewSnapshot::Failed { kind, message, .. } => (kind, message),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn starts_idle() {
        let controller = controller();

        assert!(controller.state().is_idle());
        assert_eq!(controller.revision(), 0);
    }

    #[test]
    fn renders_default_export() {
        let mut controller = controller();

        let state = controller.submit(&SourceText::from(FOO));

        let artifact = state.artifact().unwrap();
        assert_eq!(artifact.name(), Some("Foo"));
        assert_eq!(artifact.origin(), ExportOrigin::ModuleDefault);
        assert_eq!(
            state.markup(),
            Some(r#"<section class="foo"><h2>Foo</h2></section>"#)
        );
    }

    #[test]
    fn renders_hooks_and_icons() {
        let mut controller = controller();

        let snapshot = submit(&mut controller, COUNTER);

        let markup = snapshot.markup().unwrap();
        assert!(markup.starts_with("<button><svg"));
        assert!(markup.contains("lucide-plus"));
        assert!(markup.ends_with(" Count: 0</button>"));
    }

    #[test]
    fn identical_input_is_idempotent() {
        let mut controller = controller();

        let first = submit(&mut controller, FOO);
        let second = submit(&mut controller, FOO);

        match (first, second) {
            (
                PreviewSnapshot::Rendering {
                    revision: r1,
                    markup: m1,
                    component: c1,
                    origin: o1,
                    exports: e1,
                },
                PreviewSnapshot::Rendering {
                    revision: r2,
                    markup: m2,
                    component: c2,
                    origin: o2,
                    exports: e2,
                },
            ) => {
                assert_eq!((m1, c1, o1, e1), (m2, c2, o2, e2));
                assert_eq!(r2, r1 + 1);
            }
            other => panic!("expected two renders, got {:?}", other),
        }
    }

    #[test]
    fn replacement_leaves_no_trace_of_previous_submission() {
        let mut controller = controller();

        assert!(submit(&mut controller, FOO).markup().is_some());

        let failed = submit(&mut controller, "export default function () { return <div>; }");
        assert_eq!(failure(&failed).0, "compile");
        assert!(controller.state().artifact().is_none());

        let rendered = submit(&mut controller, COUNTER);
        assert!(controller.state().error().is_none());
        assert!(!rendered.markup().unwrap().contains("foo"));
    }

    #[test]
    fn no_exports_at_all_is_reported() {
        let mut controller = controller();

        let state = controller.submit(&SourceText::from("const unused = 1;"));

        assert_eq!(
            state.error(),
            Some(&PreviewError::NoDefaultExport { exports: vec![] })
        );
        assert_eq!(failure(&state.snapshot()).1, NO_COMPONENT_MESSAGE);
    }

    #[test]
    fn named_export_only_is_reported() {
        let mut controller = controller();

        let state = controller.submit(&SourceText::from(
            "export const Button = () => <button>Go</button>;",
        ));

        assert_eq!(
            state.error(),
            Some(&PreviewError::NoDefaultExport {
                exports: vec!["Button".into()]
            })
        );
    }

    #[test]
    fn malformed_syntax_supersedes_previous_state() {
        let mut controller = controller();
        submit(&mut controller, FOO);

        let snapshot = submit(&mut controller, "export default function Broken() { return (<div>; }");

        assert_eq!(failure(&snapshot).0, "compile");
        assert_eq!(snapshot.revision(), 2);
    }

    #[test]
    fn malformed_syntax_reaching_the_sandbox_is_a_compile_error() {
        let pipeline = Pipeline::default().with_transform(Box::new(Passthrough::new()));
        let mut controller = PreviewController::new(pipeline);

        let snapshot = submit(&mut controller, "exports.default = function ( {");

        assert_eq!(failure(&snapshot).0, "compile");
    }

    #[test]
    fn unresolved_modules_are_tolerated_until_used() {
        let mut controller = controller();

        let unused = submit(
            &mut controller,
            r#"
import { motion } from 'framer-motion';
export default function Card() { return <div>{motion ? 'animated' : 'static'}</div>; }
"#,
        );
        assert_eq!(unused.markup(), Some("<div>static</div>"));

        let used = submit(
            &mut controller,
            r#"
import { motion } from 'framer-motion';
export default function Card() { return <motion.div>hi</motion.div>; }
"#,
        );
        assert_eq!(failure(&used).0, "runtime");
    }

    #[test]
    fn render_body_exceptions_fail_with_message() {
        let mut controller = controller();

        let snapshot = submit(
            &mut controller,
            "export default function Boom() { throw new Error('kaboom'); }",
        );

        assert_eq!(failure(&snapshot), ("runtime", "kaboom"));
    }

    #[test]
    fn empty_source_is_a_compile_error() {
        let mut controller = controller();

        let snapshot = submit(&mut controller, "");

        assert_eq!(failure(&snapshot).0, "compile");
    }

    #[test]
    fn stale_revisions_are_discarded() {
        let mut controller = controller();

        assert!(controller.apply(5, &SourceText::from(FOO)));
        assert!(!controller.apply(4, &SourceText::from("")));
        assert!(!controller.apply(5, &SourceText::from("")));

        assert!(controller.state().is_rendering());
        assert_eq!(controller.revision(), 5);
    }

    #[test]
    fn rerender_uses_new_props() {
        let mut controller = controller();
        submit(&mut controller, FOO);

        let state = controller.rerender(json!({ "label": "Bar" }));

        assert_eq!(
            state.markup(),
            Some(r#"<section class="foo"><h2>Bar</h2></section>"#)
        );
    }

    #[test]
    fn failing_rerender_moves_to_failed() {
        let mut controller = controller();
        submit(
            &mut controller,
            "export default function Strict({ items }) { return <ul>{items.map((i) => <li key={i}>{i}</li>)}</ul>; }",
        );
        assert!(controller.state().is_failed());

        controller.set_props(json!({ "items": ["a"] }));
        submit(
            &mut controller,
            "export default function Strict({ items }) { return <ul>{items.map((i) => <li key={i}>{i}</li>)}</ul>; }",
        );
        assert_eq!(controller.state().markup(), Some("<ul><li>a</li></ul>"));

        let state = controller.rerender(json!({}));
        assert!(state.is_failed());
        assert_eq!(state.revision(), Some(2));
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut controller = controller();
        submit(&mut controller, FOO);

        controller.clear();

        assert!(controller.state().is_idle());
        assert_eq!(controller.revision(), 1);
        assert_eq!(controller.snapshot(), PreviewSnapshot::Idle { revision: 1 });
    }

    #[test]
    fn retired_revisions_are_not_applied() {
        let mut controller = controller();

        controller.retire(3);
        controller.retire(2);

        assert_eq!(controller.revision(), 3);
        assert!(!controller.apply(3, &SourceText::from(FOO)));
        assert!(controller.state().is_idle());
        assert_eq!(controller.snapshot().revision(), 3);
    }
}
