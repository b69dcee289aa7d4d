//! Markdown headlines, in both notations:
//!
//! ```text
//! Title               # Title
//! =====               ## Subtitle
//! Subtitle
//! --------
//! ```
//!
//! An underline of `=` is level 1, `-` level 2; underline style overrides
//! hash style. A headline only counts when the previous line is blank,
//! another headline, or the end of a fenced code block; ``` and ~~~ fences
//! hide everything inside them. Which notation the document prefers (and
//! whether hash headlines carry closing hashes) is detected at parse time
//! and reused when synthesizing and converting headlines.

use crate::editing::change::{ChangeRequest, OpKind};
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect};

#[derive(Debug, Default)]
pub struct MarkdownDialect {
    /// Document writes levels 1-2 with hashes rather than underlines.
    use_hash: bool,
    /// Hash headlines carry closing hashes (`## Title ##`).
    use_close_hash: bool,
}

impl MarkdownDialect {
    pub fn new() -> Self {
        MarkdownDialect {
            use_hash: false,
            use_close_hash: true,
        }
    }
}

/// Level encoded by an underline line: all `=` is 1, all `-` is 2.
fn underline_level(line: &str) -> Option<usize> {
    let ch = line.chars().next()?;
    let lev = match ch {
        '=' => 1,
        '-' => 2,
        _ => return None,
    };
    line.chars().all(|c| c == ch).then_some(lev)
}

fn underline_for(level: usize, width: usize) -> String {
    let ch = if level == 1 { '=' } else { '-' };
    ch.to_string().repeat(width)
}

impl MarkupDialect for MarkdownDialect {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let z = lines.len();
        let mut outline = Outline::default();

        // style flags, set once by the first headline that decides them:
        // 0 undecided, 1 underline / closing hashes, 2 hashes / no closing
        let mut hash_flag = 0u8;
        let mut close_hash_flag = 0u8;

        // open fence prefix while inside a fenced code block
        let mut fence: Option<String> = None;
        // true on lines after which a headline (or fence start) is allowed:
        // blank line, headline, end of fenced block
        let mut ok = true;

        let mut l2: String = if z > 0 {
            lines[0].trim_end().to_string()
        } else {
            String::new()
        };
        for i in 0..z {
            let l1 = l2;
            l2 = if i + 1 < z {
                lines[i + 1].trim_end().to_string()
            } else {
                String::new()
            };

            if l1.is_empty() {
                ok = true;
                continue;
            }

            if let Some(open) = &fence {
                let ch = open.chars().next().unwrap();
                if l1.starts_with(open.as_str()) && l1.chars().all(|c| c == ch) {
                    fence = None;
                    ok = true;
                }
                continue;
            }

            if !ok {
                continue;
            }

            if l1.starts_with("~~~") || l1.starts_with("```") {
                let ch = l1.chars().next().unwrap();
                let n = l1.chars().take_while(|&c| c == ch).count();
                fence = Some(ch.to_string().repeat(n));
                continue;
            }

            let lev;
            let head;
            if let Some(ulev) = underline_level(&l2) {
                lev = ulev;
                head = l1.trim().to_string();
                // consume the underline; the emptied slot re-allows
                // headlines on the line after it
                l2 = String::new();
                if hash_flag == 0 {
                    hash_flag = 1;
                }
            } else if l1.starts_with('#') && !l1.starts_with("#. ") {
                ok = true;
                lev = l1.len() - l1.trim_start_matches('#').len();
                head = l1.trim_matches('#').trim().to_string();
                if hash_flag == 0 && lev < 3 {
                    hash_flag = 2;
                }
                if close_hash_flag == 0 {
                    close_hash_flag = if l1.ends_with('#') { 1 } else { 2 };
                }
            } else {
                ok = false;
                continue;
            }
            outline.push(' ', lev, &head, i + 1);
        }

        if origin == ParseOrigin::Document {
            self.use_hash = hash_flag == 2;
            self.use_close_hash = close_hash_flag < 2;
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        ctx: &InsertContext<'_>,
        _warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let mut body = if level < 3 && !self.use_hash {
            vec![
                "NewHeadline".to_string(),
                underline_for(level, 11),
                String::new(),
            ]
        } else {
            let hashes = "#".repeat(level);
            let head = if self.use_close_hash {
                format!("{hashes} NewHeadline {hashes}")
            } else {
                format!("{hashes} NewHeadline")
            };
            vec![head, String::new()]
        };
        // separate from a preceding non-blank line
        if ctx.after_line >= 1
            && ctx.after_line <= ctx.model.source.len()
            && !ctx.model.source.line(ctx.after_line).trim().is_empty()
        {
            body.insert(0, String::new());
        }
        NewHeadline::new("NewHeadline", body)
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        let _ = warnings;
        request.validate(model);
        let before = model.source.len() as i64;
        let mut b_delta: i64 = 0;

        // cut / move-up: the lines brought together by the removed region
        // may need a separator again
        if matches!(request.op, OpKind::Cut | OpKind::MoveUp)
            && let Some(cut) = request.cut
            && cut.line >= 1
            && cut.line < model.source.len()
            && !model.source.line(cut.line).trim().is_empty()
        {
            model.insert_lines(cut.line + 1, vec![String::new()], cut.node + 1);
            b_delta += 1;
        }
        if request.op == OpKind::Cut {
            assert_eq!(model.source.len() as i64, before + b_delta);
            return;
        }

        let Some(region) = request.region else {
            return;
        };

        // blank line after the last line of the region
        if region.last_line < model.source.len()
            && !model.source.line(region.last_line).trim().is_empty()
        {
            model.insert_lines(region.last_line + 1, vec![String::new()], region.last_node + 1);
            b_delta += 1;
        }

        // Change levels and/or formats. Paste always re-stamps: the pasted
        // text may come from a document with the other heading style.
        // Bottom to top, so inserted/deleted underlines leave the lines of
        // not-yet-processed nodes where the node array says they are.
        if request.level_delta != 0 || request.op == OpKind::Paste {
            for tnum in (region.first_node..=region.last_node).rev() {
                let lev_i64 = model.levels[tnum - 1] as i64;
                // level currently encoded in the text
                let lev_old = lev_i64 - request.level_delta;
                let lev = lev_i64 as usize;
                let bln = model.node_line(tnum);
                let l1 = model.source.line(bln).trim_end().to_string();
                let l2 = if bln < model.source.len() {
                    model.source.line(bln + 1).trim_end().to_string()
                } else {
                    String::new()
                };

                // format currently in the text
                let mut has_hash = true;
                let mut has_close_hash = self.use_close_hash;
                if underline_level(&l2).is_some() {
                    has_hash = false;
                } else {
                    has_close_hash = l1.ends_with('#');
                }

                // format wanted at the new level
                let (want_hash, want_close_hash) = if request.op == OpKind::Paste {
                    let hash = if lev > 2 { true } else { self.use_hash };
                    (hash, self.use_close_hash)
                } else if lev_i64 < 3 && lev_old < 3 {
                    (has_hash, has_close_hash)
                } else if lev_i64 > 2 && lev_old < 3 {
                    (true, has_close_hash)
                } else if lev_i64 < 3 && lev_old > 2 {
                    (self.use_hash, self.use_close_hash)
                } else {
                    // both deeper than underlines can express
                    (true, has_close_hash)
                };

                let hashes = "#".repeat(lev);
                match (want_hash, has_hash) {
                    // underline stays an underline: adjust its character
                    (false, false) => {
                        if request.level_delta == 0 {
                            continue;
                        }
                        let width = l2.chars().count();
                        model.source.set_line(bln + 1, underline_for(lev, width));
                    }
                    // hashes stay hashes: adjust run, add/remove closers
                    (true, true) => {
                        let rewritten = if want_close_hash && has_close_hash {
                            if request.level_delta == 0 {
                                continue;
                            }
                            format!("{hashes}{}{hashes}", l1.trim_matches('#'))
                        } else if !want_close_hash && !has_close_hash {
                            if request.level_delta == 0 {
                                continue;
                            }
                            format!("{hashes}{}", l1.trim_start_matches('#'))
                        } else if want_close_hash {
                            format!("{hashes}{} {hashes}", l1.trim_matches('#').trim_end())
                        } else {
                            format!("{hashes}{}", l1.trim_matches('#').trim_end())
                        };
                        model.source.set_line(bln, rewritten);
                    }
                    // hashes become an underlined headline
                    (false, true) => {
                        let head = l1.trim_matches('#').trim().to_string();
                        let width = head.chars().count();
                        model.source.set_line(bln, head);
                        model.insert_lines(bln + 1, vec![underline_for(lev, width)], tnum + 1);
                        b_delta += 1;
                    }
                    // underlined headline becomes hashes
                    (true, false) => {
                        let sp = if l1.chars().next().is_some_and(char::is_whitespace) {
                            ""
                        } else {
                            " "
                        };
                        let rewritten = if want_close_hash {
                            format!("{hashes}{sp}{l1} {hashes}")
                        } else {
                            format!("{hashes}{sp}{l1}")
                        };
                        model.source.set_line(bln, rewritten);
                        // the line after the underline
                        let l3 = if bln + 2 <= model.source.len() {
                            model.source.line(bln + 2).trim_end().to_string()
                        } else {
                            String::new()
                        };
                        if underline_level(&l3).is_some() {
                            // it is the next headline's underline: blanking
                            // ours keeps that one attached to its own text
                            model.source.set_line(bln + 1, String::new());
                        } else {
                            model.delete_line(bln + 1, tnum + 1);
                            b_delta -= 1;
                        }
                    }
                }
            }
        }

        // blank line before the region's first headline
        let first_line = model.node_line(region.first_node);
        if first_line > 1 && !model.source.line(first_line - 1).trim().is_empty() {
            model.insert_lines(first_line, vec![String::new()], region.first_node);
            b_delta += 1;
        }

        // move-down: separator at the spot the region vacated
        if request.op == OpKind::MoveDown
            && let Some(cut) = request.cut
            && cut.line >= 1
            && cut.line < model.source.len()
            && !model.source.line(cut.line).trim().is_empty()
        {
            model.insert_lines(cut.line + 1, vec![String::new()], cut.node + 1);
            b_delta += 1;
        }

        assert_eq!(
            model.source.len() as i64,
            before + b_delta,
            "markdown writeback line accounting"
        );
    }
}
