//! Wiki section headlines: `==== Title ====`.
//!
//! More `=` characters mean a *shallower* headline. A level-1 headline
//! carries `max_level + 1` (or more) markers on each side, a headline at the
//! maximum level carries two. Runs longer than `max_level + 1` collapse to
//! level 1.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect, join_node_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiOptions {
    /// Deepest allowed level. Two `=` on each side mean this level.
    pub max_level: usize,
}

impl Default for WikiOptions {
    fn default() -> Self {
        WikiOptions { max_level: 5 }
    }
}

#[derive(Debug)]
pub struct WikiDialect {
    opts: WikiOptions,
    headline_re: Regex,
}

impl WikiDialect {
    pub fn new(opts: WikiOptions) -> Self {
        WikiDialect {
            opts,
            // leading indent, opening run, title, closing run
            headline_re: Regex::new(r"^( ?| \t[ \t]*)(={2,})(.+?)(={2,})[ \t]*$").unwrap(),
        }
    }

    /// Level encoded by an opening run of `n` markers.
    fn level_for_run(&self, n: usize) -> usize {
        if n > self.opts.max_level {
            // over-long runs collapse to the top
            1
        } else {
            self.opts.max_level - n + 2
        }
    }

    /// Markers on each side (beyond the first) that encode `level`.
    fn run_for_level(&self, level: usize) -> usize {
        self.opts.max_level - level + 1
    }
}

impl MarkupDialect for WikiDialect {
    fn name(&self) -> &'static str {
        "wiki"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        for (i, line) in lines.iter().enumerate() {
            if !line.trim_start().starts_with('=') {
                continue;
            }
            let Some(m) = self.headline_re.captures(line) else {
                continue;
            };
            let lev = self.level_for_run(m[2].len());
            outline.push(' ', lev, m[3].trim(), i + 1);
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let run = if level >= self.opts.max_level {
            "=".to_string()
        } else {
            "=".repeat(self.opts.max_level - level + 1)
        };
        NewHeadline::new(
            "NewHeadline",
            vec![format!("={run} NewHeadline ={run}"), String::new()],
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

        // No lines are inserted or deleted, so walking top-to-bottom is safe.
        let mut invalid_levs = Vec::new();
        for tnum in region.first_node..=region.last_node {
            let lev = model.levels[tnum - 1];
            let bln = model.node_line(tnum);
            let line = model.source.line(bln).to_string();

            let run = if lev <= self.opts.max_level {
                self.run_for_level(lev)
            } else {
                invalid_levs.push(tnum);
                model.levels[tnum - 1] = self.opts.max_level;
                // already rendered at the maximum, leave the line alone
                if (lev as i64 - request.level_delta) as usize == self.opts.max_level {
                    continue;
                }
                self.run_for_level(self.opts.max_level)
            };
            let m = self.headline_re.captures(&line).expect("node is a headline");
            let markers = "=".repeat(run);
            // keep an over-long closing run rather than rewrite it
            let rewritten = if m[4].len() <= self.opts.max_level + 1 {
                format!("{}={}{}={}", &m[1], markers, &m[3], markers)
            } else {
                let open_end = m.get(2).unwrap().end();
                format!("{}={}{}", &m[1], markers, &line[open_end..])
            };
            model.source.set_line(bln, rewritten);
        }

        assert_eq!(model.source.len(), before, "wiki writeback must not change line count");
        if !invalid_levs.is_empty() {
            warnings.warn(&format!(
                "wiki: disallowed levels have been corrected after '{}'",
                request.op
            ));
            warnings.warn(&format!(
                "wiki: level set to maximum ({}) for nodes: {}",
                self.opts.max_level,
                join_node_list(&invalid_levs)
            ));
        }
    }
}
