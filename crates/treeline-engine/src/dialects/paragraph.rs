//! Paragraph-per-node outlines. Every node is level 1; nesting is not
//! possible, so promote/demote never touch the source. Three styles of
//! paragraph detection:
//!
//! - blank-separated: the first non-blank line after a blank line (or the
//!   first buffer line) starts a paragraph
//! - indented: any non-blank line starting with a space or tab
//! - flush: any line starting with anything but a space or tab

use serde::{Deserialize, Serialize};

use crate::editing::change::{ChangeRequest, OpKind};
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParagraphStyle {
    #[default]
    BlankSeparated,
    Indented,
    Flush,
}

#[derive(Debug)]
pub struct ParagraphDialect {
    style: ParagraphStyle,
}

impl ParagraphDialect {
    pub fn new(style: ParagraphStyle) -> Self {
        ParagraphDialect { style }
    }

    fn leading_indent(line: &str) -> &str {
        &line[..line.len() - line.trim_start().len()]
    }
}

impl MarkupDialect for ParagraphDialect {
    fn name(&self) -> &'static str {
        match self.style {
            ParagraphStyle::BlankSeparated => "paragraph",
            ParagraphStyle::Indented => "paragraph-indent",
            ParagraphStyle::Flush => "paragraph-flush",
        }
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        match self.style {
            ParagraphStyle::BlankSeparated => {
                let mut prev_blank = true;
                for (i, line) in lines.iter().enumerate() {
                    let trimmed = line.trim();
                    if prev_blank && !trimmed.is_empty() {
                        outline.push(' ', 1, trimmed, i + 1);
                    }
                    prev_blank = trimmed.is_empty();
                }
            }
            ParagraphStyle::Indented | ParagraphStyle::Flush => {
                let want_indent = self.style == ParagraphStyle::Indented;
                for (i, line) in lines.iter().enumerate() {
                    let indented = line.starts_with([' ', '\t']);
                    if line.is_empty() || indented != want_indent {
                        continue;
                    }
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    outline.push(' ', 1, trimmed, i + 1);
                }
            }
        }
        outline
    }

    fn new_headline(
        &self,
        _level: usize,
        ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let model = ctx.model;
        let lines = match self.style {
            ParagraphStyle::BlankSeparated => {
                let after_non_blank = ctx.after_line >= 1
                    && ctx.after_line <= model.source.len()
                    && !model.source.line(ctx.after_line).trim().is_empty();
                if after_non_blank {
                    vec![String::new(), "NewHeadline".to_string(), String::new()]
                } else {
                    vec!["NewHeadline".to_string(), String::new()]
                }
            }
            ParagraphStyle::Indented => {
                // copy the indent of the neighboring headline
                let indent = if ctx.after_node >= 1 {
                    Self::leading_indent(model.source.line(model.node_line(ctx.after_node)))
                        .to_string()
                } else if model.node_count() > 0 {
                    Self::leading_indent(model.source.line(model.node_line(1))).to_string()
                } else {
                    " ".to_string()
                };
                vec![format!("{indent}NewHeadline")]
            }
            ParagraphStyle::Flush => vec!["NewHeadline".to_string()],
        };
        NewHeadline::new("NewHeadline", lines)
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        let _ = warnings;
        request.validate(model);
        if self.style != ParagraphStyle::BlankSeparated {
            return;
        }
        if request.op == OpKind::Cut {
            return;
        }
        let Some(region) = request.region else {
            return;
        };
        let before = model.source.len();
        let mut inserted = 0;

        // A paragraph headline only survives while a blank line precedes it;
        // restore the separators the move may have destroyed.
        if region.last_line < model.source.len()
            && !model.source.line(region.last_line).trim().is_empty()
        {
            model.insert_lines(region.last_line + 1, vec![String::new()], region.last_node + 1);
            inserted += 1;
        }
        let first_line = model.node_line(region.first_node);
        if first_line > 1 && !model.source.line(first_line - 1).trim().is_empty() {
            model.insert_lines(first_line, vec![String::new()], region.first_node);
            inserted += 1;
        }

        assert_eq!(
            model.source.len(),
            before + inserted,
            "paragraph writeback line accounting"
        );
    }
}
