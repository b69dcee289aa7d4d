use crate::outline::Outline;

/// An ordered, mutable sequence of source lines, addressed 1-based like the
/// outline contract. The host owns the document; during writeback the engine
/// mutates it in place through [`OutlineModel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<String>,
}

impl SourceBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        SourceBuffer { lines }
    }

    /// Split text into lines. A trailing newline does not produce a final
    /// empty line, matching how editors hand over buffer contents.
    pub fn from_text(text: &str) -> Self {
        SourceBuffer {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at 1-based `lnum`. Panics when out of range.
    pub fn line(&self, lnum: usize) -> &str {
        &self.lines[lnum - 1]
    }

    pub fn set_line(&mut self, lnum: usize, text: impl Into<String>) {
        self.lines[lnum - 1] = text.into();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    fn insert(&mut self, at: usize, new_lines: Vec<String>) {
        let idx = at - 1;
        self.lines.splice(idx..idx, new_lines);
    }

    fn remove(&mut self, lnum: usize) -> String {
        self.lines.remove(lnum - 1)
    }
}

impl From<&str> for SourceBuffer {
    fn from(text: &str) -> Self {
        SourceBuffer::from_text(text)
    }
}

/// Per-document state kept between outline operations: the buffer plus the
/// three parallel node arrays of the last parse.
///
/// The insert/delete primitives below edit the buffer *and* shift the
/// recorded node line numbers in one call; dialect writeback never adjusts
/// `node_lines` by hand.
#[derive(Debug, Clone, Default)]
pub struct OutlineModel {
    pub source: SourceBuffer,
    pub tree_lines: Vec<String>,
    pub node_lines: Vec<usize>,
    pub levels: Vec<usize>,
}

impl OutlineModel {
    pub fn new(source: SourceBuffer, outline: Outline) -> Self {
        let mut model = OutlineModel {
            source,
            ..OutlineModel::default()
        };
        model.refresh(outline);
        model
    }

    /// Replace the node arrays after a full re-parse.
    pub fn refresh(&mut self, outline: Outline) {
        self.tree_lines = outline.tree_lines;
        self.node_lines = outline.node_lines;
        self.levels = outline.levels;
    }

    pub fn node_count(&self) -> usize {
        self.node_lines.len()
    }

    /// 1-based source line of 1-based node `tnum`.
    pub fn node_line(&self, tnum: usize) -> usize {
        self.node_lines[tnum - 1]
    }

    /// Insert lines so the first lands at 1-based `at`, then shift the
    /// recorded line of every node from `first_node` (1-based) onward by the
    /// inserted count.
    pub fn insert_lines(&mut self, at: usize, lines: Vec<String>, first_node: usize) {
        let count = lines.len();
        self.source.insert(at, lines);
        self.shift_nodes(first_node, count as i64);
    }

    /// Delete line `lnum`, shifting nodes from `first_node` onward by -1.
    pub fn delete_line(&mut self, lnum: usize, first_node: usize) {
        self.source.remove(lnum);
        self.shift_nodes(first_node, -1);
    }

    fn shift_nodes(&mut self, first_node: usize, delta: i64) {
        for bnode in self.node_lines.iter_mut().skip(first_node.saturating_sub(1)) {
            *bnode = (*bnode as i64 + delta) as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model(lines: &[&str], node_lines: &[usize]) -> OutlineModel {
        OutlineModel {
            source: SourceBuffer::new(lines.iter().map(|s| s.to_string()).collect()),
            tree_lines: node_lines.iter().map(|_| String::new()).collect(),
            node_lines: node_lines.to_vec(),
            levels: node_lines.iter().map(|_| 1).collect(),
        }
    }

    #[test]
    fn buffer_is_one_indexed() {
        let buf = SourceBuffer::from_text("alpha\nbeta\ngamma");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.line(1), "alpha");
        assert_eq!(buf.line(3), "gamma");
    }

    #[test]
    fn insert_shifts_following_nodes_only() {
        let mut m = model(&["h1", "body", "h2"], &[1, 3]);
        // blank line before line 3, node 2 onward shifts
        m.insert_lines(3, vec![String::new()], 2);
        assert_eq!(m.source.lines(), &["h1", "body", "", "h2"]);
        assert_eq!(m.node_lines, vec![1, 4]);
    }

    #[test]
    fn delete_shifts_following_nodes() {
        let mut m = model(&["h1", "", "h2"], &[1, 3]);
        m.delete_line(2, 2);
        assert_eq!(m.source.lines(), &["h1", "h2"]);
        assert_eq!(m.node_lines, vec![1, 2]);
    }

    #[test]
    fn shift_past_last_node_is_noop() {
        let mut m = model(&["h1", "tail"], &[1]);
        m.insert_lines(3, vec![String::from("x")], 2);
        assert_eq!(m.node_lines, vec![1]);
        assert_eq!(m.source.len(), 3);
    }
}
