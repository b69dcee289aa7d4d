//! LaTeX sectioning outline.
//!
//! Sectioning commands are ordered by priority (`\part` before `\chapter`
//! before `\section` …), but the levels users see are dense: only the
//! commands actually present in the document count, renumbered 1..k. A
//! document containing nothing but `\section` and `\paragraph` shows them
//! as levels 1 and 2. Fixed elements (`\begin{document}` and friends) are
//! always level 1; verbatim and comment environments hide everything inside.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::editing::change::{ChangeRequest, OpKind};
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin, format_tree_line};

use super::{InsertContext, MarkupDialect, join_node_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexOptions {
    /// Sectioning commands in order of increasing depth.
    pub sections: Vec<String>,
    /// Regex for fixed level-1 elements; `None` disables them.
    pub elements: Option<String>,
    /// Environments whose contents are ignored.
    pub verbatims: Vec<String>,
}

impl Default for LatexOptions {
    fn default() -> Self {
        LatexOptions {
            sections: [
                "part",
                "chapter",
                "section",
                "subsection",
                "subsubsection",
                "paragraph",
                "subparagraph",
            ]
            .map(str::to_string)
            .to_vec(),
            elements: Some(
                r"^\s*\\(begin\s*\{(document|abstract|thebibliography)\}|end\s*\{document\}|bibliography\s*\{)"
                    .to_string(),
            ),
            verbatims: vec!["verbatim".to_string(), "comment".to_string()],
        }
    }
}

#[derive(Debug)]
pub struct LatexDialect {
    opts: LatexOptions,
    sects_re: Regex,
    elems_re: Option<Regex>,
    verbs_re: Option<Regex>,
    end_re: Regex,
    /// Actual level → section command, for the sections present in the
    /// document. Refreshed on every document parse, extended during
    /// writeback when a level gains its first section.
    levs_sects: BTreeMap<usize, String>,
}

impl LatexDialect {
    pub fn new(opts: LatexOptions) -> Result<Self, regex::Error> {
        let names = opts
            .sections
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        // \section{head}  or  \section*{head}  or  \section[short title]{head};
        // leading whitespace is part of the match so writeback preserves it
        let sects_re = Regex::new(&format!(r"^\s*\\({names})\s*(\*|\[[^\]{{]*\])?\s*\{{(.*)"))?;
        let elems_re = match &opts.elements {
            Some(pattern) => Some(Regex::new(pattern)?),
            None => None,
        };
        let verbs_re = if opts.verbatims.is_empty() {
            None
        } else {
            let envs = opts
                .verbatims
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"^\\begin\s*\{{({envs})\}}"))?)
        };
        Ok(LatexDialect {
            opts,
            sects_re,
            elems_re,
            verbs_re,
            end_re: Regex::new(r"^\\end\s*\{([^}]+)\}").unwrap(),
            levs_sects: BTreeMap::new(),
        })
    }

    pub fn with_defaults() -> Self {
        LatexDialect::new(LatexOptions::default()).expect("built-in latex options are valid")
    }

    /// Priority position of `section`, 1-based.
    fn default_level(&self, section: &str) -> usize {
        self.opts
            .sections
            .iter()
            .position(|s| s == section)
            .expect("section came from the priority list")
            + 1
    }

    /// Section command and achievable level for a requested level, given the
    /// sections currently in use. Falls back to deeper commands from the
    /// priority list; past the deepest command the level is reduced.
    fn sect_for_lev(&self, level: usize) -> (String, usize) {
        if let Some(sect) = self.levs_sects.get(&level) {
            return (sect.clone(), level);
        }
        let z = self.opts.sections.len();
        let Some((&levmax, sectmax)) = self.levs_sects.iter().next_back() else {
            // outline is empty
            return if level <= z {
                (self.opts.sections[level - 1].clone(), level)
            } else {
                (self.opts.sections[z - 1].clone(), z)
            };
        };
        let idx = self.default_level(sectmax) as i64 + level as i64 - levmax as i64;
        if idx < 1 {
            (self.opts.sections[0].clone(), level)
        } else if idx as usize <= z {
            (self.opts.sections[idx as usize - 1].clone(), level)
        } else {
            (
                self.opts.sections[z - 1].clone(),
                level - (idx as usize - z),
            )
        }
    }

    /// Headline text of a section match: everything up to the brace that
    /// closes the argument.
    fn head_in_braces(arg: &str) -> &str {
        let mut depth = 1usize;
        for (i, ch) in arg.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return arg[..i].trim();
                    }
                }
                _ => {}
            }
        }
        arg.trim()
    }
}

impl MarkupDialect for LatexDialect {
    fn name(&self) -> &'static str {
        "latex"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut nodes: Vec<(char, usize, String, usize)> = Vec::new();
        let mut observed: BTreeMap<usize, String> = BTreeMap::new();
        let mut in_verbatim: Option<String> = None;

        for (i, raw) in lines.iter().enumerate() {
            let l = raw.trim_start();
            if !l.starts_with('\\') {
                continue;
            }
            if let Some(verbs_re) = &self.verbs_re {
                if let Some(env) = &in_verbatim {
                    if self.end_re.captures(l).is_some_and(|m| &m[1] == env) {
                        in_verbatim = None;
                    }
                    continue;
                }
                if let Some(m) = verbs_re.captures(l) {
                    in_verbatim = Some(m[1].to_string());
                    continue;
                }
            }
            if let Some(m) = self.sects_re.captures(raw) {
                let sect = m[1].to_string();
                let lev = self.default_level(&sect);
                observed.insert(lev, sect);
                let mark = if m.get(2).is_some_and(|g| g.as_str() == "*") {
                    '*'
                } else {
                    ' '
                };
                let head = Self::head_in_braces(&m[3]).to_string();
                nodes.push((mark, lev, head, i + 1));
            } else if let Some(re) = &self.elems_re
                && re.is_match(l)
            {
                nodes.push(('-', 1, l.trim_end().to_string(), i + 1));
            }
        }

        // renumber so that only the sections present count, top level 1
        let dense: BTreeMap<usize, usize> = observed
            .keys()
            .enumerate()
            .map(|(i, &default_lev)| (default_lev, i + 1))
            .collect();
        let mut outline = Outline::default();
        for (mark, lev, head, line) in nodes {
            let actual = dense.get(&lev).copied().unwrap_or(lev);
            outline.tree_lines.push(format_tree_line(mark, actual, &head));
            outline.node_lines.push(line);
            outline.levels.push(actual);
        }

        if origin == ParseOrigin::Document {
            self.levs_sects = observed
                .into_iter()
                .map(|(default_lev, sect)| (dense[&default_lev], sect))
                .collect();
        }
        outline
    }

    fn new_headline(
        &self,
        level: usize,
        _ctx: &InsertContext<'_>,
        warnings: &mut dyn WarningSink,
    ) -> NewHeadline {
        let (sect, lev) = self.sect_for_lev(level);
        if lev != level {
            warnings.warn("latex: maximum level exceeded");
        }
        NewHeadline::new(
            "NewHeadline",
            vec![format!("\\{sect}{{NewHeadline}}"), String::new()],
        )
    }

    fn apply_change(
        &mut self,
        model: &mut OutlineModel,
        request: &ChangeRequest,
        warnings: &mut dyn WarningSink,
    ) {
        request.validate(model);
        // sections must be restyled after paste even at delta 0: the text
        // may come from an outline with a different section mapping
        if request.level_delta == 0 && request.op != OpKind::Paste {
            return;
        }
        let Some(region) = request.region else {
            return;
        };
        let before = model.source.len();

        let mut invalid_sects = Vec::new();
        let mut invalid_elems = Vec::new();
        for tnum in region.first_node..=region.last_node {
            let wanted = model.levels[tnum - 1];
            let bln = model.node_line(tnum);
            let line = model.source.line(bln).to_string();

            let Some(m) = self.sects_re.captures(&line) else {
                // fixed element; only level 1 is legal
                debug_assert!(
                    self.elems_re
                        .as_ref()
                        .is_some_and(|re| re.is_match(line.trim_start()))
                );
                if wanted > 1 {
                    invalid_elems.push(tnum);
                    model.levels[tnum - 1] = 1;
                }
                continue;
            };

            let current = &m[1];
            let (sect, lev) = self.sect_for_lev(wanted);
            if sect != current {
                let g1 = m.get(1).unwrap();
                let rewritten =
                    format!("{}{}{}", &line[..g1.start()], sect, &line[g1.end()..]);
                model.source.set_line(bln, rewritten);
            }
            if lev != wanted {
                invalid_sects.push(tnum);
                model.levels[tnum - 1] = lev;
            }
            self.levs_sects.entry(lev).or_insert(sect);
        }

        assert_eq!(model.source.len(), before, "latex writeback must not change line count");
        if !invalid_elems.is_empty() || !invalid_sects.is_empty() {
            warnings.warn(&format!(
                "latex: disallowed levels have been corrected after '{}'",
                request.op
            ));
            if !invalid_elems.is_empty() {
                warnings.warn(&format!(
                    "latex: level set to 1 for nodes: {}",
                    join_node_list(&invalid_elems)
                ));
            }
            if !invalid_sects.is_empty() {
                warnings.warn(&format!(
                    "latex: level set to maximum for nodes: {}",
                    join_node_list(&invalid_sects)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::change::Region;
    use crate::editing::model::SourceBuffer;
    use crate::editing::warnings::CollectedWarnings;
    use pretty_assertions::assert_eq;

    fn parse(d: &mut LatexDialect, text: &str) -> Outline {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        d.make_outline(&lines, ParseOrigin::Document, &mut CollectedWarnings::new())
    }

    #[test]
    fn levels_are_dense_over_present_sections() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(
            &mut d,
            "\\section{Intro}\ntext\n\\paragraph{Detail}\n\\section{Next}",
        );
        // only \section and \paragraph occur, so they become levels 1 and 2
        assert_eq!(o.levels, vec![1, 2, 1]);
        assert_eq!(o.tree_lines[1], "  . |Detail");
    }

    #[test]
    fn lone_deep_command_is_level_one() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(&mut d, "\\subsubsection{Only One}");
        assert_eq!(o.levels, vec![1]);
    }

    #[test]
    fn starred_sections_and_short_titles() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(&mut d, "\\section*{Unnumbered}\n\\section[short]{Long Title}");
        assert_eq!(o.tree_lines[0], " *|Unnumbered");
        assert_eq!(o.tree_lines[1], "  |Long Title");
    }

    #[test]
    fn head_stops_at_matching_brace() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(&mut d, "\\section{Math {x} stuff} % trailing");
        assert_eq!(o.tree_lines[0], "  |Math {x} stuff");
    }

    #[test]
    fn elements_are_level_one_with_dash_mark() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(&mut d, "\\begin{document}\n\\section{A}\n\\end{document}");
        assert_eq!(o.levels, vec![1, 1, 1]);
        assert_eq!(o.tree_lines[0], " -|\\begin{document}");
    }

    #[test]
    fn verbatim_hides_sections() {
        let mut d = LatexDialect::with_defaults();
        let o = parse(
            &mut d,
            "\\begin{verbatim}\n\\section{hidden}\n\\end{verbatim}\n\\section{visible}",
        );
        assert_eq!(o.node_lines, vec![4]);
    }

    #[test]
    fn demote_renames_section_command() {
        let mut d = LatexDialect::with_defaults();
        let text = "\\section{One}\n  \\subsection{Two}";
        let outline = parse(&mut d, text);
        assert_eq!(outline.levels, vec![1, 2]);
        let mut model = OutlineModel::new(SourceBuffer::from_text(text), outline);
        // demote node 2: level 3 has no section yet, falls back down the list
        model.levels[1] = 3;
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 2,
                last_node: 2,
                first_line: 2,
                last_line: 2,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(model.source.line(2), "  \\subsubsection{Two}");
        assert!(warnings.is_empty());
        // the new level/section pair is remembered for the next operation
        assert_eq!(d.levs_sects.get(&3).map(String::as_str), Some("subsubsection"));
    }

    #[test]
    fn demote_past_deepest_command_clamps() {
        let mut d = LatexDialect::with_defaults();
        let text = "\\subparagraph{Bottom}";
        let outline = parse(&mut d, text);
        let mut model = OutlineModel::new(SourceBuffer::from_text(text), outline);
        model.levels[0] = 2;
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
        // \subparagraph is already the deepest command
        assert_eq!(model.source.line(1), "\\subparagraph{Bottom}");
        assert_eq!(model.levels, vec![1]);
        assert!(warnings.messages()[1].contains("maximum"));
    }

    #[test]
    fn element_demoted_is_forced_back_to_level_one() {
        let mut d = LatexDialect::with_defaults();
        let text = "\\begin{document}\n\\section{A}";
        let outline = parse(&mut d, text);
        let mut model = OutlineModel::new(SourceBuffer::from_text(text), outline);
        model.levels[0] = 2;
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
        assert_eq!(model.source.line(1), "\\begin{document}");
        assert_eq!(model.levels[0], 1);
        assert!(warnings.messages()[1].contains("level set to 1"));
    }

    #[test]
    fn new_headline_uses_dense_mapping() {
        let mut d = LatexDialect::with_defaults();
        parse(&mut d, "\\subsection{Only}");
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        let mut warnings = CollectedWarnings::new();
        // level 1 is \subsection in this document
        let nh = d.new_headline(1, &ctx, &mut warnings);
        assert_eq!(nh.source_lines[0], "\\subsection{NewHeadline}");
        // level 2 falls forward to the next deeper command
        let nh = d.new_headline(2, &ctx, &mut warnings);
        assert_eq!(nh.source_lines[0], "\\subsubsection{NewHeadline}");
        assert!(warnings.is_empty());
    }

    #[test]
    fn new_headline_past_deepest_command_warns() {
        let mut d = LatexDialect::with_defaults();
        parse(&mut d, "\\subparagraph{Bottom}");
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        let mut warnings = CollectedWarnings::new();
        let nh = d.new_headline(2, &ctx, &mut warnings);
        assert_eq!(nh.source_lines[0], "\\subparagraph{NewHeadline}");
        assert_eq!(warnings.messages(), ["latex: maximum level exceeded"]);
    }

    #[test]
    fn empty_document_round_trip_per_level() {
        let mut d = LatexDialect::with_defaults();
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        let mut warnings = CollectedWarnings::new();
        for level in 1..=7 {
            let nh = d.new_headline(level, &ctx, &mut warnings);
            let mut fresh = LatexDialect::with_defaults();
            let o = fresh.make_outline(&nh.source_lines, ParseOrigin::Fragment, &mut CollectedWarnings::new());
            // a lone command is always level 1 after dense renumbering; the
            // command itself must be the one at the requested priority
            assert_eq!(o.levels, vec![1]);
            assert_eq!(
                nh.source_lines[0],
                format!("\\{}{{NewHeadline}}", d.opts.sections[level - 1])
            );
        }
        assert!(warnings.is_empty());
    }
}
