use crate::errors::{invalid_obligations, ObligationsError};
use crate::model::{ObligationsKind, ObligationsNode};

/// Translates a single policy condition into SQL text.
pub trait ConditionCompiler {
    fn compile_condition(&self, condition: &str) -> Result<String, ObligationsError>;
}

impl<F> ConditionCompiler for F
where
    F: Fn(&str) -> Result<String, ObligationsError>,
{
    fn compile_condition(&self, condition: &str) -> Result<String, ObligationsError> {
        self(condition)
    }
}

/// Emits each condition verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughCompiler;

impl ConditionCompiler for PassthroughCompiler {
    fn compile_condition(&self, condition: &str) -> Result<String, ObligationsError> {
        Ok(condition.to_string())
    }
}

/// Wraps `s` in parentheses unless it already starts with `(` and ends with `)`.
///
/// Only the first and last byte are inspected, so `(a) OR (b)` is returned
/// unchanged.
pub fn add_outer_parens(s: &str) -> String {
    if s.starts_with('(') && s.ends_with(')') {
        s.to_string()
    } else {
        format!("({s})")
    }
}

/// Compiles an obligations tree into a SQL predicate.
pub fn compile_sql(
    node: &ObligationsNode,
    compiler: &dyn ConditionCompiler,
) -> Result<String, ObligationsError> {
    match node.kind {
        ObligationsKind::Condition => {
            let sql = compiler.compile_condition(&node.condition)?;
            Ok(add_outer_parens(&sql))
        }
        ObligationsKind::And | ObligationsKind::Or => {
            let children = node.children();
            if children.is_empty() {
                return Err(invalid_obligations(&format!(
                    "{:?} group has no children",
                    node.kind
                )));
            }

            let mut pieces = Vec::with_capacity(children.len());
            for child in children.iter().filter(|child| !child.is_empty()) {
                let sql = compile_sql(child, compiler)?;
                pieces.push(add_outer_parens(&sql));
            }
            if pieces.is_empty() {
                return Err(invalid_obligations(&format!(
                    "{:?} group has only empty children",
                    node.kind
                )));
            }

            let joiner = if node.kind == ObligationsKind::And {
                " AND "
            } else {
                " OR "
            };
            let joined = pieces.join(joiner);
            if pieces.len() >= 2 {
                Ok(format!("({joined})"))
            } else {
                Ok(joined)
            }
        }
        ObligationsKind::Empty => Err(invalid_obligations("cannot compile an empty obligation")),
    }
}
