//! Compiles generated UI component source into sandbox-ready code.
//!
//! The transform stage takes the JSX/TSX module text produced by the model and
//! turns it into a CommonJS function body: JSX becomes `React.createElement`
//! calls, imports become `require` calls and exports become assignments on
//! `exports`.

pub mod commonjs;
pub mod jsx;
pub mod passthrough;
pub mod source;
pub mod traits;

pub use commonjs::lower_modules;
pub use jsx::OxcTransform;
pub use passthrough::Passthrough;
pub use source::SourceText;
pub use traits::{CompiledUnit, Transform, TransformError};
