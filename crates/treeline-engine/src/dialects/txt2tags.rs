//! txt2tags titles: `=== Title ===` (plain) and `+++ Title +++` (numbered),
//! with an optional trailing `[label]`. Opening and closing runs must have
//! equal length; leading spaces are allowed, tabs are not.
//!
//! The format defines five title levels. Runs longer than five clamp to the
//! maximum level — the opposite polarity of the wiki family, kept as this
//! dialect's own documented constant.

use regex::{Captures, Regex};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect, join_node_list};

const MAX_LEVEL: usize = 5;

/// Line pairs between which headlines are ignored: verbatim, raw, tagged and
/// comment areas.
const FENCE_TAGS: [&str; 4] = ["```", "\"\"\"", "'''", "%%%"];

#[derive(Debug)]
pub struct Txt2tagsDialect {
    plain_re: Regex,
    numbered_re: Regex,
}

impl Txt2tagsDialect {
    pub fn new() -> Self {
        // The run-length equality the reference grammar expresses with a
        // backreference is checked after matching.
        Txt2tagsDialect {
            plain_re: Regex::new(r"^ *(=+)([^=](?:.*[^=])?)(=+)(\[[\w-]*\])?\s*$").unwrap(),
            numbered_re: Regex::new(r"^ *(\++)([^+](?:.*[^+])?)(\++)(\[[\w-]*\])?\s*$").unwrap(),
        }
    }

    /// Match a title line of either family, requiring equal runs.
    /// Returns the captures and the tree mark for the family.
    fn match_title<'t>(&self, line: &'t str) -> Option<(Captures<'t>, char)> {
        let stripped = line.trim_start_matches(' ');
        let (re, mark) = if stripped.starts_with('=') {
            (&self.plain_re, ' ')
        } else if stripped.starts_with('+') {
            (&self.numbered_re, '+')
        } else {
            return None;
        };
        let caps = re.captures(line)?;
        if caps[1].len() != caps[3].len() {
            return None;
        }
        Some((caps, mark))
    }
}

impl Default for Txt2tagsDialect {
    fn default() -> Self {
        Txt2tagsDialect::new()
    }
}

impl MarkupDialect for Txt2tagsDialect {
    fn name(&self) -> &'static str {
        "txt2tags"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        let mut fence: Option<&str> = None;
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_end();
            if let Some(tag) = FENCE_TAGS.iter().find(|t| **t == trimmed) {
                match fence {
                    None => fence = Some(tag),
                    Some(open) if open == *tag => fence = None,
                    Some(_) => {}
                }
                continue;
            }
            if fence.is_some() {
                continue;
            }
            let Some((caps, mark)) = self.match_title(line) else {
                continue;
            };
            let lev = caps[1].len().min(MAX_LEVEL);
            outline.push(mark, lev, caps[2].trim(), i + 1);
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        // same title family as the previous headline
        let marker = if ctx.after_node >= 1 {
            let prev = ctx.model.source.line(ctx.model.node_line(ctx.after_node));
            if prev.trim_start().starts_with('+') { '+' } else { '=' }
        } else {
            '='
        };
        let run = marker.to_string().repeat(level);
        NewHeadline::new(
            "NewHeadline",
            vec![format!("{run} NewHeadline {run}"), String::new()],
        )
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        request.validate(model);
        if request.level_delta == 0 {
            return;
        }
        let Some(region) = request.region else {
            return;
        };
        let before = model.source.len();

        let mut invalid_levs = Vec::new();
        for tnum in region.first_node..=region.last_node {
            let mut lev = model.levels[tnum - 1];
            if lev > MAX_LEVEL {
                invalid_levs.push(tnum);
                lev = MAX_LEVEL;
                model.levels[tnum - 1] = MAX_LEVEL;
            }
            let bln = model.node_line(tnum);
            let line = model.source.line(bln).to_string();
            let (caps, _) = self.match_title(&line).expect("node is a headline");
            let marker = caps[1].chars().next().unwrap();
            let run = marker.to_string().repeat(lev);
            let open = caps.get(1).unwrap();
            let close = caps.get(3).unwrap();
            let rewritten = format!(
                "{}{}{}{}{}",
                &line[..open.start()],
                run,
                &line[open.end()..close.start()],
                run,
                &line[close.end()..]
            );
            model.source.set_line(bln, rewritten);
        }

        assert_eq!(
            model.source.len(),
            before,
            "txt2tags writeback must not change line count"
        );
        if !invalid_levs.is_empty() {
            warnings.warn(&format!(
                "txt2tags: disallowed levels have been corrected after '{}'",
                request.op
            ));
            warnings.warn(&format!(
                "txt2tags: level set to maximum ({}) for nodes: {}",
                MAX_LEVEL,
                join_node_list(&invalid_levs)
            ));
        }
    }
}
