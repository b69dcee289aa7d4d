//! Inverse ATX-style headers: a run of marker characters where *more*
//! markers mean a *shallower* headline.
//!
//! With the defaults (`@`, maximum 3):
//!
//! ```text
//! @@@ Headline level 1
//! @@ Headline level 2
//! @ Headline level 3
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect, join_node_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InverseAtxOptions {
    /// Marker character that denotes a headline.
    pub marker: char,
    /// Marker count of a level-1 headline; also the maximum level.
    pub max_level: usize,
}

impl Default for InverseAtxOptions {
    fn default() -> Self {
        InverseAtxOptions {
            marker: '@',
            max_level: 3,
        }
    }
}

#[derive(Debug)]
pub struct InverseAtxDialect {
    opts: InverseAtxOptions,
    headline_re: Regex,
}

impl InverseAtxDialect {
    pub fn new(opts: InverseAtxOptions) -> Self {
        let escaped = regex::escape(&opts.marker.to_string());
        InverseAtxDialect {
            headline_re: Regex::new(&format!("^({escaped}+)")).unwrap(),
            opts,
        }
    }

    fn level_for_run(&self, n: usize) -> usize {
        if n >= self.opts.max_level {
            1
        } else {
            self.opts.max_level - n + 1
        }
    }

    fn run_for_level(&self, level: usize) -> usize {
        if level >= self.opts.max_level {
            1
        } else {
            self.opts.max_level - level + 1
        }
    }
}

impl MarkupDialect for InverseAtxDialect {
    fn name(&self) -> &'static str {
        "inverse-atx"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        for (i, line) in lines.iter().enumerate() {
            if !line.starts_with(self.opts.marker) {
                continue;
            }
            let m = self.headline_re.captures(line).expect("checked prefix");
            let lev = self.level_for_run(m[1].len());
            let head = line.trim_start_matches(self.opts.marker).trim();
            outline.push(' ', lev, head, i + 1);
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let markers = self.opts.marker.to_string().repeat(self.run_for_level(level));
        NewHeadline::new(
            "NewHeadline",
            vec![format!("{markers} NewHeadline"), String::new()],
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
            let lev = model.levels[tnum - 1];
            let bln = model.node_line(tnum);
            let line = model.source.line(bln).to_string();

            let run = if lev <= self.opts.max_level {
                self.run_for_level(lev)
            } else {
                invalid_levs.push(tnum);
                model.levels[tnum - 1] = self.opts.max_level;
                if (lev as i64 - request.level_delta) as usize == self.opts.max_level {
                    continue;
                }
                1
            };
            let m = self.headline_re.captures(&line).expect("node is a headline");
            let rest = &line[m.get(1).unwrap().end()..];
            let markers = self.opts.marker.to_string().repeat(run);
            model.source.set_line(bln, format!("{markers}{rest}"));
        }

        assert_eq!(
            model.source.len(),
            before,
            "inverse-atx writeback must not change line count"
        );
        if !invalid_levs.is_empty() {
            warnings.warn(&format!(
                "inverse-atx: disallowed levels have been corrected after '{}'",
                request.op
            ));
            warnings.warn(&format!(
                "inverse-atx: level set to maximum ({}) for nodes: {}",
                self.opts.max_level,
                join_node_list(&invalid_levs)
            ));
        }
    }
}
