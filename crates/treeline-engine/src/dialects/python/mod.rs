//! Outline of Python source: nesting derived from indentation.
//!
//! Headlines are `def`/`class` openers (anchored at the first decorator of a
//! decorated definition), the first statement after a block's indentation
//! drops back, and `### ` / `#---` comment lines. Continuation lines of
//! multi-line strings and expressions are excluded up front by a lexical
//! scan; if that scan fails the whole outline degrades to a single invalid
//! node and the document is left untouched.

mod lexer;

use serde::{Deserialize, Serialize};

use crate::editing::change::{ChangeRequest, OpKind};
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin, format_tree_line};

use super::{IndentStyle, InsertContext, MarkupDialect, shift_region_indent};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonOptions {
    /// Indent unit used when synthesizing and shifting lines.
    pub indent: IndentStyle,
}

#[derive(Debug)]
pub struct PythonDialect {
    opts: PythonOptions,
}

impl PythonDialect {
    pub fn new(opts: PythonOptions) -> Self {
        PythonDialect { opts }
    }
}

impl MarkupDialect for PythonDialect {
    fn name(&self) -> &'static str {
        "python"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        origin: ParseOrigin,
        warnings: &mut dyn WarningSink,
    ) -> Outline {
        let facts = match lexer::scan(lines) {
            Ok(facts) => facts,
            Err(err) => {
                warnings.warn(&format!("python: cannot scan source: {err}"));
                return Outline::invalid_placeholder();
            }
        };

        let mut outline = Outline::default();
        let mut got_head = false;
        // indents of enclosing levels; depth = stack size
        let mut indents: Vec<usize> = vec![0];
        // levels of enclosing def/class blocks
        let mut func_levels: Vec<usize> = Vec::new();
        let mut indent_error = "";
        // line of the first decorator of a pending decorated definition
        let mut in_dec = 0usize;
        let mut mark = ' ';

        for (i, bline) in lines.iter().enumerate() {
            let mut lnum = i + 1;
            if facts.ignore_lines.contains(&lnum) {
                continue;
            }
            let head = bline.trim();
            if head.is_empty() {
                continue;
            }
            let indent = bline.len() - bline.trim_start().len();

            if indent > *indents.last().unwrap() {
                indents.push(indent);
            } else if indent < *indents.last().unwrap() {
                while *indents.last().unwrap() > indent {
                    indents.pop();
                }
                if *indents.last().unwrap() == indent {
                    indent_error = "";
                } else {
                    indent_error = "!!! ";
                    if origin == ParseOrigin::Document {
                        warnings.warn(&format!(
                            "python: inconsistent dedent at line {lnum}"
                        ));
                    }
                }
            }
            let lev = indents.len();

            // first line after the end of a class or def block
            if func_levels.last().is_some_and(|&top| lev <= top) {
                got_head = true;
                while func_levels.last().is_some_and(|&top| top >= lev) {
                    func_levels.pop();
                }
            }
            if facts.func_lines.contains(&lnum) {
                // first line of a class or def block
                got_head = true;
                if in_dec != 0 {
                    lnum = in_dec;
                    in_dec = 0;
                    mark = 'd';
                }
                if func_levels.last().is_none_or(|&top| lev > top) {
                    func_levels.push(lev);
                }
            } else if in_dec != 0 {
                // between the first decorator and its def/class only more
                // decorators and comments are valid
                if head.starts_with('@') || head.starts_with('#') {
                    got_head = false;
                    continue;
                }
                // anything else should be a syntax error; if it looks like a
                // headline, let it be one
                in_dec = 0;
            } else if head.starts_with('@') {
                in_dec = lnum;
                got_head = false;
                continue;
            } else if head.starts_with("### ") || head.starts_with("#---") {
                got_head = true;
            }

            if got_head {
                got_head = false;
                outline
                    .tree_lines
                    .push(format_tree_line(mark, lev, &format!("{indent_error}{head}")));
                mark = ' ';
                outline.node_lines.push(lnum);
                outline.levels.push(lev);
            }
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let indent = self.opts.indent.unit().repeat(level - 1);
        NewHeadline::new("### NewHeadline", vec![format!("{indent}### NewHeadline")])
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        let _ = warnings;
        request.validate(model);
        let Some(region) = request.region else {
            return;
        };
        let unit = self.opts.indent.unit();

        // levels from parsing a pasted fragment are relative to the
        // fragment; the real delta comes from the first pasted line's indent
        let mut level_delta = request.level_delta;
        if request.op == OpKind::Paste {
            let first = model.source.line(region.first_line);
            let indent = first.len() - first.trim_start().len();
            let pasted_lev = (indent / unit.len() + 1) as i64;
            level_delta = model.levels[region.first_node - 1] as i64 - pasted_lev;
        }
        if level_delta == 0 {
            return;
        }
        shift_region_indent(model, region, level_delta, &unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::change::Region;
    use crate::editing::model::SourceBuffer;
    use crate::editing::warnings::CollectedWarnings;
    use pretty_assertions::assert_eq;

    fn parse(d: &mut PythonDialect, text: &str) -> Outline {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let mut warnings = CollectedWarnings::new();
        d.make_outline(&lines, ParseOrigin::Document, &mut warnings)
    }

    fn dialect() -> PythonDialect {
        PythonDialect::new(PythonOptions {
            indent: IndentStyle::Spaces(4),
        })
    }

    const SAMPLE: &str = "\
class Greeter:
    def hello(self):
        return 'hi'

    def bye(self):
        return 'bye'

print('module level')";

    #[test]
    fn defs_and_block_ends_are_headlines() {
        let mut d = dialect();
        let o = parse(&mut d, SAMPLE);
        // class, two methods, and the statement ending the class block
        assert_eq!(o.node_lines, vec![1, 2, 5, 8]);
        assert_eq!(o.levels, vec![1, 2, 2, 1]);
        assert_eq!(o.tree_lines[3], "  |print('module level')");
    }

    #[test]
    fn decorated_def_is_one_node_at_the_decorator() {
        let mut d = dialect();
        let o = parse(&mut d, "@property\n@cached\ndef value(self):\n    return 1");
        assert_eq!(o.node_lines, vec![1]);
        assert_eq!(o.levels, vec![1]);
        assert_eq!(o.tree_lines[0], " d|def value(self):");
    }

    #[test]
    fn special_comments_are_headlines() {
        let mut d = dialect();
        let o = parse(&mut d, "x = 1\n### Section one\ny = 2\n#--- divider");
        assert_eq!(o.node_lines, vec![2, 4]);
    }

    #[test]
    fn multiline_strings_hide_fake_definitions() {
        let mut d = dialect();
        let o = parse(&mut d, "doc = \"\"\"\ndef not_real():\n\"\"\"\ndef real():\n    pass");
        assert_eq!(o.node_lines, vec![4]);
    }

    #[test]
    fn inconsistent_dedent_is_flagged_not_fatal() {
        let mut d = dialect();
        let lines: Vec<String> = "def f():\n        a = 1\n    b = 2\ndef g():\n    pass"
            .lines()
            .map(str::to_string)
            .collect();
        let mut warnings = CollectedWarnings::new();
        let o = d.make_outline(&lines, ParseOrigin::Document, &mut warnings);
        // line 3 dedents to an indent that was never opened
        assert_eq!(o.node_lines, vec![1, 3, 4]);
        assert!(o.tree_lines[1].contains("!!! b = 2"));
        assert!(!o.invalid);
        assert_eq!(warnings.messages(), ["python: inconsistent dedent at line 3"]);
    }

    #[test]
    fn unscannable_source_degrades_to_invalid_outline() {
        let mut d = dialect();
        let lines = vec!["x = \"\"\"broken".to_string()];
        let mut warnings = CollectedWarnings::new();
        let o = d.make_outline(&lines, ParseOrigin::Document, &mut warnings);
        assert!(o.invalid);
        assert_eq!(o.node_lines, vec![1]);
        assert_eq!(warnings.messages().len(), 1);
        assert!(warnings.messages()[0].contains("cannot scan"));
    }

    #[test]
    fn promote_dedents_region_lines() {
        let mut d = dialect();
        let text = "class A:\n    def m(self):\n        pass";
        let outline = parse(&mut d, text);
        assert_eq!(outline.levels, vec![1, 2]);
        let mut model = OutlineModel::new(SourceBuffer::from_text(text), outline);
        model.levels[1] = 1;
        let req = ChangeRequest {
            op: OpKind::Promote,
            level_delta: -1,
            region: Some(Region {
                first_node: 2,
                last_node: 2,
                first_line: 2,
                last_line: 3,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(model.source.lines(), &["class A:", "def m(self):", "    pass"]);
    }

    #[test]
    fn paste_delta_comes_from_first_line_indent() {
        let mut d = dialect();
        // a fragment written at top level was pasted under a class; the host
        // assigned it level 2, the text still has level-1 indentation
        let text = "class A:\ndef pasted(self):\n    pass";
        let mut model = OutlineModel {
            source: SourceBuffer::from_text(text),
            tree_lines: vec![String::new(), String::new()],
            node_lines: vec![1, 2],
            levels: vec![1, 2],
        };
        let req = ChangeRequest {
            op: OpKind::Paste,
            level_delta: 0,
            region: Some(Region {
                first_node: 2,
                last_node: 2,
                first_line: 2,
                last_line: 3,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(
            model.source.lines(),
            &["class A:", "    def pasted(self):", "        pass"]
        );
    }

    #[test]
    fn new_headline_parses_at_requested_level_in_context() {
        let mut d = dialect();
        let mut warnings = CollectedWarnings::new();
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        for level in 1..=3 {
            let nh = d.new_headline(level, &ctx, &mut warnings);
            // splice into a document that already has the enclosing blocks
            let mut lines: Vec<String> = "class A:\n    class B:\n        pass"
                .lines()
                .map(str::to_string)
                .collect();
            lines.push(nh.source_lines[0].clone());
            let o = d.make_outline(&lines, ParseOrigin::Document, &mut warnings);
            assert_eq!(o.levels.last(), Some(&level), "level {level}");
        }
    }
}
