//! Eligibility conditions attached to nodes.

use dialogue_data::{Blackboard, FlagValue};
use serde::{Deserialize, Serialize};

/// Inputs a condition is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ConditionScope<'a> {
    pub blackboard: &'a Blackboard,
    /// How many times the node being checked was entered this session.
    pub visits: u32,
}

/// A condition that must hold for a node to be offered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    /// Flag exists and is truthy.
    FlagSet { key: String },
    FlagUnset { key: String },
    FlagEquals { key: String, value: FlagValue },
    VisitedFewerThan { count: u32 },
    NotVisited,
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn flag_set(key: impl Into<String>) -> Self {
        Condition::FlagSet { key: key.into() }
    }

    pub fn flag_unset(key: impl Into<String>) -> Self {
        Condition::FlagUnset { key: key.into() }
    }

    pub fn flag_equals(key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        Condition::FlagEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    pub fn evaluate(&self, scope: &ConditionScope<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::FlagSet { key } => scope.blackboard.is_set(key),
            Condition::FlagUnset { key } => !scope.blackboard.is_set(key),
            Condition::FlagEquals { key, value } => scope.blackboard.flag(key) == Some(value),
            Condition::VisitedFewerThan { count } => scope.visits < *count,
            Condition::NotVisited => scope.visits == 0,
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(scope)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(scope)),
            Condition::Not { condition } => !condition.evaluate(scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(blackboard: &Blackboard, visits: u32) -> ConditionScope<'_> {
        ConditionScope { blackboard, visits }
    }

    #[test]
    fn test_flag_conditions() {
        let mut board = Blackboard::new();
        board.set_flag("has_key", true);
        board.set_flag("gold", 10_i64);

        let s = scope(&board, 0);
        assert!(Condition::flag_set("has_key").evaluate(&s));
        assert!(!Condition::flag_unset("has_key").evaluate(&s));
        assert!(Condition::flag_unset("has_map").evaluate(&s));
        assert!(Condition::flag_equals("gold", 10_i64).evaluate(&s));
        assert!(!Condition::flag_equals("gold", 11_i64).evaluate(&s));
        // Type matters
        assert!(!Condition::flag_equals("gold", 10.0).evaluate(&s));
    }

    #[test]
    fn test_visit_conditions() {
        let board = Blackboard::new();
        assert!(Condition::NotVisited.evaluate(&scope(&board, 0)));
        assert!(!Condition::NotVisited.evaluate(&scope(&board, 1)));

        let twice = Condition::VisitedFewerThan { count: 2 };
        assert!(twice.evaluate(&scope(&board, 1)));
        assert!(!twice.evaluate(&scope(&board, 2)));
    }

    #[test]
    fn test_combinators() {
        let mut board = Blackboard::new();
        board.set_flag("a", true);
        let s = scope(&board, 0);

        let all = Condition::All {
            conditions: vec![Condition::flag_set("a"), Condition::flag_set("b")],
        };
        let any = Condition::Any {
            conditions: vec![Condition::flag_set("a"), Condition::flag_set("b")],
        };
        assert!(!all.evaluate(&s));
        assert!(any.evaluate(&s));
        assert!(Condition::negate(all).evaluate(&s));

        // Empty combinators
        assert!(Condition::All { conditions: vec![] }.evaluate(&s));
        assert!(!Condition::Any { conditions: vec![] }.evaluate(&s));
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            conditions: Vec<Condition>,
        }

        let source = r#"
conditions = [
    { type = "flag_set", key = "met" },
    { type = "flag_equals", key = "mood", value = "angry" },
    { type = "not", condition = { type = "not_visited" } },
]
"#;
        let w: Wrapper = toml::from_str(source).unwrap();
        assert_eq!(w.conditions[0], Condition::flag_set("met"));
        assert_eq!(w.conditions[1], Condition::flag_equals("mood", "angry"));
        assert_eq!(w.conditions[2], Condition::negate(Condition::NotVisited));
    }
}
