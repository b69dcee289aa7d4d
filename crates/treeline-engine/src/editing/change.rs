use std::fmt;

use super::model::OutlineModel;

/// Outline-side structural operations that require source writeback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Promote,
    Demote,
    Cut,
    Paste,
    MoveUp,
    MoveDown,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Promote => "promote",
            OpKind::Demote => "demote",
            OpKind::Cut => "cut",
            OpKind::Paste => "paste",
            OpKind::MoveUp => "move-up",
            OpKind::MoveDown => "move-down",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contiguous span of outline nodes subject to one structural operation,
/// with the matching source line span. Both ends inclusive, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub first_node: usize,
    pub last_node: usize,
    pub first_line: usize,
    pub last_line: usize,
}

/// Source line after which a region was removed during cut/move-up/move-down,
/// plus the index of the node preceding the gap (0 if the gap is before the
/// first node). Dialects that maintain blank separators need this to check
/// whether the lines brought together by the removal now touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutPoint {
    pub line: usize,
    pub node: usize,
}

/// A structural-change request handed down by the host after it has updated
/// the outline-side arrays (levels already reflect the operation).
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    pub op: OpKind,
    pub level_delta: i64,
    pub region: Option<Region>,
    pub cut: Option<CutPoint>,
}

impl ChangeRequest {
    /// Check the recorded boundaries against the model's current node→line
    /// mapping.
    ///
    /// # Panics
    ///
    /// Panics when the request describes lines that no longer match the
    /// node arrays: that means the host handed over stale bookkeeping, and
    /// rewriting the buffer from it would corrupt the document.
    pub fn validate(&self, model: &OutlineModel) {
        if let Some(region) = &self.region {
            assert_eq!(
                region.first_line,
                model.node_line(region.first_node),
                "stale region: first line does not match node {}",
                region.first_node
            );
            let expected_last = if region.last_node < model.node_count() {
                model.node_line(region.last_node + 1) - 1
            } else {
                model.source.len()
            };
            assert_eq!(
                region.last_line, expected_last,
                "stale region: last line does not match node {}",
                region.last_node
            );
        }
        if let Some(cut) = &self.cut {
            let expected = if cut.node < model.node_count() {
                model.node_line(cut.node + 1) - 1
            } else {
                model.source.len()
            };
            assert_eq!(
                cut.line, expected,
                "stale cut point: line does not precede node {}",
                cut.node + 1
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::model::SourceBuffer;

    fn model() -> OutlineModel {
        OutlineModel {
            source: SourceBuffer::from_text("h1\nbody\nh2\ntail"),
            tree_lines: vec![String::new(), String::new()],
            node_lines: vec![1, 3],
            levels: vec![1, 2],
        }
    }

    #[test]
    fn valid_region_passes() {
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 1,
                last_node: 1,
                first_line: 1,
                last_line: 2,
            }),
            cut: None,
        };
        req.validate(&model());
    }

    #[test]
    fn region_to_end_of_buffer_passes() {
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 2,
                last_node: 2,
                first_line: 3,
                last_line: 4,
            }),
            cut: None,
        };
        req.validate(&model());
    }

    #[test]
    #[should_panic(expected = "stale region")]
    fn stale_region_panics() {
        let req = ChangeRequest {
            op: OpKind::Demote,
            level_delta: 1,
            region: Some(Region {
                first_node: 1,
                last_node: 1,
                first_line: 2,
                last_line: 2,
            }),
            cut: None,
        };
        req.validate(&model());
    }

    #[test]
    #[should_panic(expected = "stale cut point")]
    fn stale_cut_point_panics() {
        let req = ChangeRequest {
            op: OpKind::Cut,
            level_delta: 0,
            region: None,
            cut: Some(CutPoint { line: 1, node: 1 }),
        };
        req.validate(&model());
    }
}
