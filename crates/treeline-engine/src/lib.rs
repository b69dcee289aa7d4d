pub mod dialects;
pub mod editing;
pub mod outline;

// Re-export key types for easier usage
pub use dialects::{InsertContext, MarkupDialect, dialect_by_name};
pub use editing::change::{ChangeRequest, CutPoint, OpKind, Region};
pub use editing::model::{OutlineModel, SourceBuffer};
pub use editing::warnings::{CollectedWarnings, WarningSink};
pub use outline::{NewHeadline, Outline, ParseOrigin};
