//! TaskPaper lists: `- task` lines and `project:` lines, nested by leading
//! tabs. Projects may carry trailing `@tag` / `@tag(value)` annotations
//! after the colon.

use regex::Regex;

use crate::editing::change::ChangeRequest;
use crate::editing::model::OutlineModel;
use crate::editing::warnings::WarningSink;
use crate::outline::{NewHeadline, Outline, ParseOrigin};

use super::{InsertContext, MarkupDialect, shift_region_indent};

#[derive(Debug)]
pub struct TaskpaperDialect {
    project_re: Regex,
}

impl TaskpaperDialect {
    pub fn new() -> Self {
        TaskpaperDialect {
            project_re: Regex::new(r"^.+:(\s+@[^ \t(]+(\([^)]*\))?)*$").unwrap(),
        }
    }
}

impl Default for TaskpaperDialect {
    fn default() -> Self {
        TaskpaperDialect::new()
    }
}

impl MarkupDialect for TaskpaperDialect {
    fn name(&self) -> &'static str {
        "taskpaper"
    }

    fn make_outline(
        &mut self,
        lines: &[String],
        _origin: ParseOrigin,
        _warnings: &mut dyn WarningSink,
    ) -> Outline {
        let mut outline = Outline::default();
        for (i, line) in lines.iter().enumerate() {
            let h = line.trim_start_matches('\t');
            let (head, mark) = if let Some(task) = h.strip_prefix("- ") {
                (task, ' ')
            } else if h.ends_with(':') || (h.contains(':') && self.project_re.is_match(h)) {
                // the `contains` test keeps the regex off plain note lines
                (h, 'x')
            } else {
                continue;
            };
            let lev = line.len() - h.len() + 1;
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
        let tabs = "\t".repeat(level - 1);
        NewHeadline::new("NewHeadline", vec![format!("{tabs}- NewHeadline")])
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
        shift_region_indent(model, region, request.level_delta, "\t");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::change::{OpKind, Region};
    use crate::editing::model::SourceBuffer;
    use crate::editing::warnings::CollectedWarnings;
    use pretty_assertions::assert_eq;

    fn parse(d: &mut TaskpaperDialect, text: &str) -> Outline {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        d.make_outline(&lines, ParseOrigin::Document, &mut CollectedWarnings::new())
    }

    #[test]
    fn tasks_and_projects_nest_by_tabs() {
        let mut d = TaskpaperDialect::new();
        let o = parse(
            &mut d,
            "Inbox:\n\t- buy milk\n\t- call back\n\t\tnote about the call\nArchive:",
        );
        assert_eq!(o.levels, vec![1, 2, 2, 1]);
        assert_eq!(o.node_lines, vec![1, 2, 3, 5]);
        assert_eq!(o.tree_lines[0], " x|Inbox:");
        assert_eq!(o.tree_lines[1], "  . |buy milk");
    }

    #[test]
    fn tagged_project_lines_are_projects() {
        let mut d = TaskpaperDialect::new();
        let o = parse(&mut d, "Home: @due(friday) @flagged\nnote with: colon inside");
        assert_eq!(o.len(), 1);
        assert_eq!(o.tree_lines[0], " x|Home: @due(friday) @flagged");
    }

    #[test]
    fn notes_are_not_headlines() {
        let mut d = TaskpaperDialect::new();
        let o = parse(&mut d, "just a note\n\tanother note");
        assert!(o.is_empty());
    }

    #[test]
    fn demote_indents_whole_region() {
        let mut d = TaskpaperDialect::new();
        let lines = "- task\n\tnote under task\n\n- next";
        let outline = parse(&mut d, lines);
        let mut model = OutlineModel::new(SourceBuffer::from_text(lines), outline);
        model.levels[0] = 2;
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 1,
                last_node: 1,
                first_line: 1,
                last_line: 3,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(
            model.source.lines(),
            &["\t- task", "\t\tnote under task", "", "- next"]
        );
    }

    #[test]
    fn promote_dedents_only_where_possible() {
        let mut d = TaskpaperDialect::new();
        let lines = "\t- deep\nflush note";
        let outline = parse(&mut d, lines);
        let mut model = OutlineModel::new(SourceBuffer::from_text(lines), outline);
        model.levels[0] = 1;
        let req = ChangeRequest {
            op: OpKind::Promote,
            level_delta: -1,
            region: Some(Region {
                first_node: 1,
                last_node: 1,
                first_line: 1,
                last_line: 2,
            }),
            cut: None,
        };
        let mut warnings = CollectedWarnings::new();
        d.apply_change(&mut model, &req, &mut warnings);
        assert_eq!(model.source.lines(), &["- deep", "flush note"]);
    }

    #[test]
    fn new_headline_round_trips() {
        let mut d = TaskpaperDialect::new();
        let model = OutlineModel::default();
        let ctx = InsertContext {
            model: &model,
            after_line: 0,
            after_node: 0,
        };
        let mut warnings = CollectedWarnings::new();
        for level in 1..=4 {
            let nh = d.new_headline(level, &ctx, &mut warnings);
            let o = d.make_outline(&nh.source_lines, ParseOrigin::Fragment, &mut CollectedWarnings::new());
            assert_eq!(o.levels, vec![level]);
        }
    }
}
