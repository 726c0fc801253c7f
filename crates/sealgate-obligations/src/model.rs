use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Node kinds, in canonical sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationsKind {
    Empty = 0,
    Condition = 1,
    And = 2,
    Or = 3,
}

/// Residual conditions returned alongside a decision.
///
/// `Condition` leaves carry text and no children; `And`/`Or` groups carry
/// children (possibly none) and an optional tag naming the policy or
/// statement they came from. `Empty` constrains nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationsNode {
    pub kind: ObligationsKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ObligationsNode>>,
}

impl Default for ObligationsNode {
    fn default() -> Self {
        Self::empty()
    }
}

impl ObligationsNode {
    pub fn empty() -> Self {
        Self {
            kind: ObligationsKind::Empty,
            tag: String::new(),
            condition: String::new(),
            children: None,
        }
    }

    pub fn condition(condition: impl Into<String>) -> Self {
        Self {
            kind: ObligationsKind::Condition,
            tag: String::new(),
            condition: condition.into(),
            children: None,
        }
    }

    pub fn and(children: Vec<ObligationsNode>) -> Self {
        Self::group(ObligationsKind::And, children)
    }

    pub fn or(children: Vec<ObligationsNode>) -> Self {
        Self::group(ObligationsKind::Or, children)
    }

    fn group(kind: ObligationsKind, children: Vec<ObligationsNode>) -> Self {
        Self {
            kind,
            tag: String::new(),
            condition: String::new(),
            children: Some(children),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ObligationsKind::Empty
    }

    pub fn children(&self) -> &[ObligationsNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// 1 for a condition, the child count for anything else.
    pub fn shallow_length(&self) -> usize {
        match self.kind {
            ObligationsKind::Condition => 1,
            _ => self.children().len(),
        }
    }

    /// Sorts every group's children into canonical order, depth first.
    pub fn deep_sort(&mut self) {
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.deep_sort();
            }
            children.sort_by(canonical_cmp);
        }
    }

    pub fn deep_sorted(mut self) -> Self {
        self.deep_sort();
        self
    }

    /// Condition strings, depth first.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self.kind {
            ObligationsKind::Condition => out.push(self.condition.as_str()),
            _ => {
                for child in self.children() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Drops `Empty` children recursively; a group left without children
    /// collapses into `Empty`.
    pub fn pruned(&self) -> ObligationsNode {
        match self.kind {
            ObligationsKind::Empty => ObligationsNode::empty(),
            ObligationsKind::Condition => self.clone(),
            ObligationsKind::And | ObligationsKind::Or => {
                let kept: Vec<ObligationsNode> = self
                    .children()
                    .iter()
                    .map(ObligationsNode::pruned)
                    .filter(|child| !child.is_empty())
                    .collect();
                if kept.is_empty() {
                    ObligationsNode::empty()
                } else {
                    ObligationsNode {
                        kind: self.kind,
                        tag: self.tag.clone(),
                        condition: String::new(),
                        children: Some(kept),
                    }
                }
            }
        }
    }
}

fn canonical_cmp(a: &ObligationsNode, b: &ObligationsNode) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then_with(|| a.tag.cmp(&b.tag))
        .then_with(|| a.condition.cmp(&b.condition))
        // None sorts before Some(0).
        .then_with(|| {
            let la = a.children.as_ref().map(Vec::len);
            let lb = b.children.as_ref().map(Vec::len);
            la.cmp(&lb)
        })
}

impl fmt::Display for ObligationsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ObligationsKind::Empty => f.write_str("EMPTY"),
            ObligationsKind::Condition => write!(f, "{:?}", self.condition),
            ObligationsKind::And | ObligationsKind::Or => {
                let op = if self.kind == ObligationsKind::And {
                    "AND"
                } else {
                    "OR"
                };
                f.write_str(op)?;
                if !self.tag.is_empty() {
                    write!(f, "[{}]", self.tag)?;
                }
                f.write_str("(")?;
                for (idx, child) in self.children().iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
