//! HTML heading tags: `<h1>…</h1>` through any `<hN>…</hN>`, opening and
//! closing level matching, on a single line. Inner tags are stripped and
//! character entities decoded for the tree pane.

use regex::{Captures, Regex};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect};

#[derive(Debug)]
pub struct HtmlDialect {
    headline_re: Regex,
    tag_re: Regex,
}

impl HtmlDialect {
    pub fn new() -> Self {
        HtmlDialect {
            // The closing level is a separate group checked for equality
            // afterwards (no backreferences in the regex engine).
            headline_re: Regex::new(r"(?i)<\s*h(\d+)[^>]*>(.*?)</h(\d+)\s*>").unwrap(),
            tag_re: Regex::new(r"<[^>]*>").unwrap(),
        }
    }

    /// First `<hN>…</hN>` pair on the line whose opening and closing levels
    /// agree.
    fn find_headline<'t>(&self, line: &'t str) -> Option<(usize, Captures<'t>)> {
        for caps in self.headline_re.captures_iter(line) {
            let open: usize = caps[1].parse().ok()?;
            let close: usize = caps[3].parse().ok()?;
            if open == close {
                return Some((open, caps));
            }
        }
        None
    }
}

impl Default for HtmlDialect {
    fn default() -> Self {
        HtmlDialect::new()
    }
}

impl MarkupDialect for HtmlDialect {
    fn name(&self) -> &'static str {
        "html"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        for (i, line) in lines.iter().enumerate() {
            if !(line.contains("</h") || line.contains("</H")) {
                continue;
            }
            let Some((lev, caps)) = self.find_headline(line) else {
                continue;
            };
            let stripped = self.tag_re.replace_all(&caps[2], "");
            let head = html_escape::decode_html_entities(stripped.trim()).into_owned();
            outline.push(' ', lev, &head, i + 1);
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        NewHeadline::new(
            "NewHeadline",
            vec![format!("<h{level}>NewHeadline</h{level}>"), String::new()],
        )
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        let _ = warnings;
        request.validate(model);
        if request.level_delta == 0 {
            return;
        }
        let Some(region) = request.region else {
            return;
        };
        let before = model.source.len();

        for tnum in region.first_node..=region.last_node {
            let lev = model.levels[tnum - 1];
            let bln = model.node_line(tnum);
            let line = model.source.line(bln).to_string();
            let (_, caps) = self.find_headline(&line).expect("node is a headline");
            let open = caps.get(1).unwrap();
            let close = caps.get(3).unwrap();
            let rewritten = format!(
                "{}{}{}{}{}",
                &line[..open.start()],
                lev,
                &line[open.end()..close.start()],
                lev,
                &line[close.end()..]
            );
            model.source.set_line(bln, rewritten);
        }

        assert_eq!(model.source.len(), before, "html writeback must not change line count");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::change::{OpKind, Region};
    use crate::editing::model::SourceBuffer;
    use crate::editing::warnings::CollectedWarnings;
    use pretty_assertions::assert_eq;

    fn parse(d: &mut HtmlDialect, text: &str) -> Outline {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        d.make_outline(&lines, ParseOrigin::Document, &mut CollectedWarnings::new())
    }

    #[test]
    fn finds_headings_with_attributes_and_case() {
        let mut d = HtmlDialect::new();
        let o = parse(
            &mut d,
            "<h1>Top</h1>\ntext\n <H3  ALIGN=\"CENTER\"> Third </H3>\n <  h4 > deep </H4    >",
        );
        assert_eq!(o.levels, vec![1, 3, 4]);
        assert_eq!(o.tree_lines[1], "  . . |Third");
    }

    #[test]
    fn inner_tags_are_stripped_and_entities_decoded() {
        let mut d = HtmlDialect::new();
        let o = parse(&mut d, "<h2> <font color=red>Q &amp; A</font> </h2> </td>");
        assert_eq!(o.tree_lines[0], "  . |Q & A");
    }

    #[test]
    fn mismatched_pair_is_skipped() {
        let mut d = HtmlDialect::new();
        let o = parse(&mut d, "<h1>broken</h2>\n<h2>ok</h2>");
        assert_eq!(o.levels, vec![2]);
        assert_eq!(o.node_lines, vec![2]);
    }

    #[test]
    fn demote_rewrites_both_level_numbers() {
        let mut d = HtmlDialect::new();
        let lines = "<h2 class=\"x\">Head</h2> trailing";
        let outline = parse(&mut d, lines);
        let mut model = OutlineModel::new(SourceBuffer::from_text(lines), outline);
        model.levels[0] = 3;
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 1,
                last_node: 1,
                first_line: 1,
                last_line: 1,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(model.source.line(1), "<h3 class=\"x\">Head</h3> trailing");
    }

    #[test]
    fn new_headline_round_trips() {
        let mut d = HtmlDialect::new();
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        let mut warnings = CollectedWarnings::new();
        for level in 1..=6 {
            let nh = d.new_headline(level, &ctx, &mut warnings);
            let o = d.make_outline(&nh.source_lines, ParseOrigin::Fragment, &mut CollectedWarnings::new());
            assert_eq!(o.levels, vec![level]);
        }
    }
}
