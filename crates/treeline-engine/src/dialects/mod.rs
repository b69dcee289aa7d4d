//! One [`MarkupDialect`] implementation per supported grammar.
//!
//! A dialect owns three capabilities: deriving the outline from source
//! lines, synthesizing source lines for a brand-new headline, and writing
//! outline-side structural edits back into the source. Dialect state needed
//! across those calls (heading-style flags, observed section commands) lives
//! inside the dialect value and is refreshed on every document parse.

pub mod fold_marker;
pub mod html;
pub mod inverse_atx;
pub mod latex;
pub mod markdown;
pub mod paragraph;
pub mod python;
pub mod taskpaper;
pub mod txt2tags;
pub mod wiki;

use serde::{Deserialize, Serialize};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

pub use fold_marker::{FoldMarkerDialect, FoldMarkerOptions, HeadSide};
pub use html::HtmlDialect;
pub use inverse_atx::{InverseAtxDialect, InverseAtxOptions};
pub use latex::{LatexDialect, LatexOptions};
pub use markdown::MarkdownDialect;
pub use paragraph::{ParagraphDialect, ParagraphStyle};
pub use python::{PythonDialect, PythonOptions};
pub use taskpaper::TaskpaperDialect;
pub use txt2tags::Txt2tagsDialect;
pub use wiki::{WikiDialect, WikiOptions};

/// Context for synthesizing a new headline: the current model plus where the
/// new source lines will land.
pub struct InsertContext<'a> {
    pub model: &'a OutlineModel,
    /// 1-based source line after which the new lines are inserted.
    pub after_line: usize,
    /// 1-based node after which the new headline is inserted; 0 when the
    /// headline becomes the first node.
    pub after_node: usize,
}

/// One supported markup grammar.
///
/// All three methods are invoked by the host outliner engine; none of them
/// touch anything outside the arguments handed in.
pub trait MarkupDialect: std::fmt::Debug {
    /// Name under which the dialect is selected in configuration.
    fn name(&self) -> &'static str;

    /// Derive the outline from the full set of source lines. Never fails:
    /// unparseable source degrades to [`Outline::invalid_placeholder`],
    /// with the cause reported through `warnings`.
    fn make_outline(
        &mut self,
        lines: &[String],
        origin: ParseOrigin,
        warnings: &mut dyn WarningSink,
    ) -> Outline;

    /// Produce tree text and source lines for a new headline at `level`.
    fn new_headline(
        &self,
        level: usize,
        ctx: &InsertContext<'_>,
        warnings: &mut dyn WarningSink,
    ) -> NewHeadline;

    /// Rewrite the source after an outline-side structural edit. Levels in
    /// the model already reflect the operation; disallowed levels are
    /// clamped here, corrected in the model, and reported through
    /// `warnings`.
    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    );
}

/// Indentation unit used by the indentation-derived dialects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    /// The string inserted per indent level.
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces(n) => " ".repeat(*n),
        }
    }
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(4)
    }
}

/// Look up a dialect by configured name with default options.
pub fn dialect_by_name(name: &str) -> Option<Box<dyn MarkupDialect>> {
    match name {
        "markdown" => Some(Box::new(MarkdownDialect::new())),
        "wiki" => Some(Box::new(WikiDialect::new(WikiOptions::default()))),
        "inverse-atx" => Some(Box::new(InverseAtxDialect::new(InverseAtxOptions::default()))),
        "txt2tags" => Some(Box::new(Txt2tagsDialect::new())),
        "latex" => Some(Box::new(LatexDialect::with_defaults())),
        "html" => Some(Box::new(HtmlDialect::new())),
        "python" => Some(Box::new(PythonDialect::new(PythonOptions::default()))),
        "taskpaper" => Some(Box::new(TaskpaperDialect::new())),
        "fold-marker" => Some(Box::new(FoldMarkerDialect::new(FoldMarkerOptions::default()))),
        "paragraph" => Some(Box::new(ParagraphDialect::new(ParagraphStyle::BlankSeparated))),
        "paragraph-indent" => Some(Box::new(ParagraphDialect::new(ParagraphStyle::Indented))),
        "paragraph-flush" => Some(Box::new(ParagraphDialect::new(ParagraphStyle::Flush))),
        _ => None,
    }
}

/// All registry names, for CLI help and config validation.
pub const DIALECT_NAMES: &[&str] = &[
    "markdown",
    "wiki",
    "inverse-atx",
    "txt2tags",
    "latex",
    "html",
    "python",
    "taskpaper",
    "fold-marker",
    "paragraph",
    "paragraph-indent",
    "paragraph-flush",
];

/// Indent (positive delta) or dedent (negative, where possible) every
/// non-blank source line of the region by `|level_delta|` units. Used by the
/// dialects whose level is carried by indentation; the line count never
/// changes.
pub(crate) fn shift_region_indent(
    model: &mut OutlineModel,
    region: crate::editing::change::Region,
    level_delta: i64,
    unit: &str,
) {
    let before = model.source.len();
    let indent = unit.repeat(level_delta.unsigned_abs() as usize);
    for lnum in region.first_line..=region.last_line {
        let line = model.source.line(lnum);
        if line.trim().is_empty() {
            continue;
        }
        if level_delta > 0 {
            let shifted = format!("{indent}{line}");
            model.source.set_line(lnum, shifted);
        } else if line.starts_with(&indent) {
            let shifted = line[indent.len()..].to_string();
            model.source.set_line(lnum, shifted);
        }
    }
    assert_eq!(model.source.len(), before, "indent shift must not change line count");
}

/// Comma-separated 1-based node indices for warning messages.
pub(crate) fn join_node_list(nodes: &[usize]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_names() {
        for name in DIALECT_NAMES {
            let dialect = dialect_by_name(name).expect(name);
            assert!(!dialect.name().is_empty());
        }
        assert!(dialect_by_name("org").is_none());
    }

    #[test]
    fn indent_units() {
        assert_eq!(IndentStyle::Tabs.unit(), "\t");
        assert_eq!(IndentStyle::Spaces(2).unit(), "  ");
    }
}
