//! Fold markers carrying an explicit level: `{{{1`, `{{{2x`, …
//!
//! The level is the literal integer after the marker; it is never clamped.
//! Headline text sits either before the marker (the default) or after it:
//!
//! ```text
//! headline level 1 {{{1        {{{1 headline level 1
//! some text                    some text
//! headline level 2 {{{2        {{{2 headline level 2
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect};

/// Which side of the fold marker carries the headline text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadSide {
    #[default]
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldMarkerOptions {
    pub marker: String,
    pub head_side: HeadSide,
}

impl Default for FoldMarkerOptions {
    fn default() -> Self {
        FoldMarkerOptions {
            marker: "{{{".to_string(),
            head_side: HeadSide::Before,
        }
    }
}

#[derive(Debug)]
pub struct FoldMarkerDialect {
    opts: FoldMarkerOptions,
    marker_re: Regex,
}

impl FoldMarkerDialect {
    pub fn new(opts: FoldMarkerOptions) -> Self {
        let escaped = regex::escape(&opts.marker);
        FoldMarkerDialect {
            marker_re: Regex::new(&format!(r"{escaped}(\d+)(x?)")).unwrap(),
            opts,
        }
    }
}

impl MarkupDialect for FoldMarkerDialect {
    fn name(&self) -> &'static str {
        "fold-marker"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        for (i, line) in lines.iter().enumerate() {
            if !line.contains(&self.opts.marker) {
                continue;
            }
            let Some(m) = self.marker_re.captures(line) else {
                continue;
            };
            let Ok(lev) = m[1].parse::<usize>() else {
                continue;
            };
            if lev == 0 {
                continue;
            }
            let whole = m.get(0).unwrap();
            let head = match self.opts.head_side {
                HeadSide::Before => line[..whole.start()].trim(),
                // strip special flag characters the host may prepend
                HeadSide::After => line[whole.end()..].trim_start_matches(['x', 'o', '=']).trim(),
            };
            let mark = m[2].chars().next().unwrap_or(' ');
            outline.push(mark, lev, head, i + 1);
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let marker = &self.opts.marker;
        let line = match self.opts.head_side {
            HeadSide::Before => format!("NewHeadline {marker}{level}"),
            HeadSide::After => format!("{marker}{level} NewHeadline"),
        };
        NewHeadline::new("NewHeadline", vec![line, String::new()])
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
            let caps = self.marker_re.captures(&line).expect("node is a headline");
            let digits = caps.get(1).unwrap();
            let rewritten = format!("{}{}{}", &line[..digits.start()], lev, &line[digits.end()..]);
            model.source.set_line(bln, rewritten);
        }

        assert_eq!(
            model.source.len(),
            before,
            "fold-marker writeback must not change line count"
        );
    }
}
