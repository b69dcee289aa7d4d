use serde::Serialize;

/// Whether a parse runs over the document itself or over a detached fragment
/// (the clipboard during paste). Dialect state captured during parsing —
/// heading-style flags, the set of sectioning commands in use — is refreshed
/// only for [`ParseOrigin::Document`] so that parsing pasted text never
/// clobbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOrigin {
    Document,
    Fragment,
}

/// Result of a full outline parse: three parallel arrays, one entry per
/// headline found in the source.
///
/// `node_lines` holds the 1-based source line where each headline begins and
/// is strictly increasing. `levels` holds 1-based outline depths. Tree
/// validity (levels only decreasing to a previously seen ancestor) is the
/// host's concern, not the parser's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub tree_lines: Vec<String>,
    pub node_lines: Vec<usize>,
    pub levels: Vec<usize>,
    /// True only for the synthetic single-node outline produced when the
    /// source could not be scanned at all (see the python dialect).
    pub invalid: bool,
}

impl Outline {
    pub fn len(&self) -> usize {
        self.node_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_lines.is_empty()
    }

    /// Append one headline, formatting its tree line.
    pub(crate) fn push(&mut self, mark: char, level: usize, head: &str, line: usize) {
        self.tree_lines.push(format_tree_line(mark, level, head));
        self.node_lines.push(line);
        self.levels.push(level);
    }

    /// Single synthetic node standing in for an outline that could not be
    /// derived. The document is left untouched; the user fixes the source
    /// and re-triggers the parse.
    pub(crate) fn invalid_placeholder() -> Self {
        Outline {
            tree_lines: vec![" = |!!!ERROR: OUTLINE IS INVALID".to_string()],
            node_lines: vec![1],
            levels: vec![1],
            invalid: true,
        }
    }
}

/// Render one tree-pane line: a fixed-width mark column, `level - 1`
/// two-character indent units, a `|` separator, then the headline text.
pub fn format_tree_line(mark: char, level: usize, head: &str) -> String {
    format!(" {}{}|{}", mark, ". ".repeat(level.saturating_sub(1)), head)
}

/// A freshly synthesized headline: the text shown in the tree pane and the
/// ready-to-insert source lines that will parse back at the requested level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHeadline {
    pub tree_text: String,
    pub source_lines: Vec<String>,
}

impl NewHeadline {
    pub(crate) fn new(tree_text: impl Into<String>, source_lines: Vec<String>) -> Self {
        NewHeadline {
            tree_text: tree_text.into(),
            source_lines,
        }
    }
}
