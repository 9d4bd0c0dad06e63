//! Rule condition tree — the boolean gate attached to a rule's action.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Logical combinator for condition groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

/// A boolean expression the managed instance evaluates against each torrent.
///
/// The tree is opaque data here: leaf operators and values use whatever
/// vocabulary the instance's evaluation engine defines. The only inspection
/// this crate performs is collecting referenced field names, which drives the
/// columns shown alongside preview rows. A rule without a condition matches
/// every torrent in its tracker scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    /// A single field comparison.
    Field {
        field: String,
        operator: String,
        value: serde_json::Value,
    },
    /// A combinator over child conditions.
    Group {
        op: LogicalOp,
        conditions: Vec<RuleCondition>,
    },
}

impl RuleCondition {
    /// Collect the set of field names referenced anywhere in the tree.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, into: &mut BTreeSet<String>) {
        match self {
            Self::Field { field, .. } => {
                into.insert(field.clone());
            }
            Self::Group { conditions, .. } => {
                for child in conditions {
                    child.collect_fields(into);
                }
            }
        }
    }
}

impl std::fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field {
                field,
                operator,
                value,
            } => write!(f, "{field} {operator} {value}"),
            Self::Group { op, conditions } => {
                let joiner = match op {
                    LogicalOp::And => " and ",
                    LogicalOp::Or => " or ",
                };
                write!(f, "(")?;
                for (index, child) in conditions.iter().enumerate() {
                    if index > 0 {
                        write!(f, "{joiner}")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: &str) -> RuleCondition {
        RuleCondition::Field {
            field: field.to_string(),
            operator: "eq".to_string(),
            value: serde_json::json!("x"),
        }
    }

    #[test]
    fn should_collect_single_field_from_leaf() {
        let fields = leaf("category").referenced_fields();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains("category"));
    }

    #[test]
    fn should_collect_fields_from_nested_groups() {
        let tree = RuleCondition::Group {
            op: LogicalOp::Or,
            conditions: vec![
                leaf("name"),
                RuleCondition::Group {
                    op: LogicalOp::And,
                    conditions: vec![leaf("category"), leaf("name")],
                },
            ],
        };
        let fields = tree.referenced_fields();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains("name"));
        assert!(fields.contains("category"));
    }

    #[test]
    fn should_collect_nothing_from_empty_group() {
        let tree = RuleCondition::Group {
            op: LogicalOp::And,
            conditions: vec![],
        };
        assert!(tree.referenced_fields().is_empty());
    }

    #[test]
    fn should_display_leaf_and_group() {
        let tree = RuleCondition::Group {
            op: LogicalOp::And,
            conditions: vec![leaf("name"), leaf("category")],
        };
        assert_eq!(tree.to_string(), "(name eq \"x\" and category eq \"x\")");
    }

    #[test]
    fn should_roundtrip_condition_through_serde_json() {
        let tree = RuleCondition::Group {
            op: LogicalOp::Or,
            conditions: vec![leaf("tag"), leaf("name")],
        };
        let json = serde_json::to_string(&tree).unwrap();
        let parsed: RuleCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn should_deserialize_leaf_from_tagged_json() {
        let json = serde_json::json!({
            "kind": "field",
            "field": "category",
            "operator": "eq",
            "value": "movies"
        });
        let parsed: RuleCondition = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed, RuleCondition::Field { field, .. } if field == "category"));
    }
}
