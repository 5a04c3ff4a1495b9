//! Declarative segment-order blueprints.

use crate::model::Necessity;

/// One entry of a blueprint: a segment or a repeatable loop of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlueprintNode {
    Segment {
        tag: String,
        necessity: Necessity,
    },
    Loop {
        necessity: Necessity,
        body: Vec<BlueprintNode>,
    },
}

impl BlueprintNode {
    pub fn mandatory(tag: impl Into<String>) -> Self {
        BlueprintNode::Segment {
            tag: tag.into(),
            necessity: Necessity::Mandatory,
        }
    }

    pub fn optional(tag: impl Into<String>) -> Self {
        BlueprintNode::Segment {
            tag: tag.into(),
            necessity: Necessity::Optional,
        }
    }

    /// A loop that must occur at least once.
    pub fn mandatory_loop(body: Vec<BlueprintNode>) -> Self {
        BlueprintNode::Loop {
            necessity: Necessity::Mandatory,
            body,
        }
    }

    /// A loop that may be absent entirely.
    pub fn optional_loop(body: Vec<BlueprintNode>) -> Self {
        BlueprintNode::Loop {
            necessity: Necessity::Optional,
            body,
        }
    }

    pub fn necessity(&self) -> Necessity {
        match self {
            BlueprintNode::Segment { necessity, .. } | BlueprintNode::Loop { necessity, .. } => {
                *necessity
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            BlueprintNode::Segment { .. } => 0,
            BlueprintNode::Loop { body, .. } => 1 + body.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

/// Expected segment order, cardinality and loop groups of one message kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlueprintSpec {
    nodes: Vec<BlueprintNode>,
}

impl BlueprintSpec {
    pub fn new(nodes: Vec<BlueprintNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[BlueprintNode] {
        &self.nodes
    }

    /// Maximum loop nesting depth (0 for a flat blueprint).
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(BlueprintNode::depth).max().unwrap_or(0)
    }
}

impl From<Vec<BlueprintNode>> for BlueprintSpec {
    fn from(nodes: Vec<BlueprintNode>) -> Self {
        Self::new(nodes)
    }
}

/// Returns true if a pass over `body` from its start can consume `tag` next.
///
/// Leading optional entries are looked through; the first mandatory entry
/// that cannot match stops the search.
pub(crate) fn can_start(body: &[BlueprintNode], tag: &str) -> bool {
    for node in body {
        let matched = match node {
            BlueprintNode::Segment { tag: expected, .. } => expected == tag,
            BlueprintNode::Loop { body, .. } => can_start(body, tag),
        };
        if matched {
            return true;
        }
        if !node.necessity().is_optional() {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use BlueprintNode as N;

    #[test]
    fn test_depth() {
        assert_eq!(BlueprintSpec::default().depth(), 0);

        let spec = BlueprintSpec::new(vec![
            N::mandatory("UNH"),
            N::optional_loop(vec![
                N::mandatory("NAD"),
                N::optional_loop(vec![N::mandatory("CTA")]),
            ]),
            N::mandatory_loop(vec![N::mandatory("LIN")]),
        ]);
        assert_eq!(spec.depth(), 2);
    }

    #[test]
    fn test_can_start() {
        let body = vec![
            N::optional("DTM"),
            N::optional_loop(vec![N::mandatory("NAD")]),
            N::mandatory("LIN"),
            N::mandatory("QTY"),
        ];
        assert!(can_start(&body, "DTM"));
        assert!(can_start(&body, "NAD"));
        assert!(can_start(&body, "LIN"));
        assert!(!can_start(&body, "QTY"));
        assert!(!can_start(&[], "LIN"));
    }
}
