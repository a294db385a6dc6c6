//! GHS Label Core - classification resolution and label printing
//!
//! # Guarantees
//! 1. Resolution never fails: stale overrides fall back to the primary bundle
//! 2. Printed labels match the on-screen choice (same resolver, same overrides)
//! 3. Layout constants are lookups, not packing computations
//! 4. A print surface is always torn down
//! 5. Corrupt persisted state resets, never crashes

pub mod config;
pub mod hashing;
pub mod history;
pub mod logging;
pub mod model;
pub mod overrides;
pub mod pictograms;
pub mod pipeline;
pub mod print;
pub mod render;
pub mod resolver;
pub mod results;
pub mod spool;
pub mod storage;
pub mod templates;
pub mod validation;

pub use config::ToolConfig;
pub use model::{ChemicalRecord, ClassificationBundle, HazardStatement, SignalWord};
pub use overrides::{CustomOverride, OverrideMap, OverrideStore};
pub use pipeline::{ComposeRequest, LabelCompositor, Page, PipelineError, PrintDocument, PrintUnit};
pub use resolver::{resolve, ClassificationChoice, EffectiveClassification};
pub use spool::{FileHost, PrintHost, PrintSpooler, RenderSurface, SpoolError};
pub use templates::{CustomFields, LabelConfig, LabelSize, LabelTemplate, NameDisplay, Orientation};
pub use validation::{BatchParse, ValidationViolation, Validator, ViolationSeverity};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
