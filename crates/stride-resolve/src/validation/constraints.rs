//! Declarative constraint checking for `constrained*` types.
//!
//! A valid-type entry that resolves to a `constrainedInt`,
//! `constrainedReal`, `constrainedString`, or `constrainedList`
//! declaration bounds the values a port accepts:
//!
//! - numeric: `maximum` / `minimum` (inclusive), `exclusiveMaximum` /
//!   `exclusiveMinimum` (exclusive), `multipleOf`
//! - string: `minLength` / `maxLength` (inclusive element counts)
//! - list: `minItems` / `maxItems`, `uniqueItems` (textual equality),
//!   `allowed` (explicit allow-list membership)
//!
//! Each failed constraint produces exactly one `ConstraintFail` carrying
//! the declared type, port name, constraint text, and offending value
//! text. Checks only fire when the supplied value matches the constrained
//! base kind; a type mismatch is the port checker's business, not ours.

use stride_ast::{Declaration, Error, ErrorKind, Node, NodeKind};

/// Run the constraints of one `constrained*` declaration against a value.
pub fn check_value(
    declared_type: &str,
    port: &str,
    constrained: &Declaration,
    value: &Node,
) -> Vec<Error> {
    match constrained.object_type.as_str() {
        "constrainedInt" => match value.kind {
            NodeKind::Int(v) => check_numeric(declared_type, port, constrained, v as f64, value),
            _ => Vec::new(),
        },
        "constrainedReal" => match value.kind {
            NodeKind::Int(v) => check_numeric(declared_type, port, constrained, v as f64, value),
            NodeKind::Real(v) => check_numeric(declared_type, port, constrained, v, value),
            _ => Vec::new(),
        },
        "constrainedString" => match &value.kind {
            NodeKind::String(s) => check_string(declared_type, port, constrained, s, value),
            _ => Vec::new(),
        },
        "constrainedList" => match &value.kind {
            NodeKind::List(items) => check_list(declared_type, port, constrained, items, value),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn check_numeric(
    declared_type: &str,
    port: &str,
    constrained: &Declaration,
    value: f64,
    node: &Node,
) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut fail = |constraint: String| {
        errors.push(constraint_fail(declared_type, port, &constraint, node));
    };

    if let Some(max) = numeric_property(constrained, "maximum") {
        if value > max {
            fail(format!("maximum: {max}"));
        }
    }
    if let Some(min) = numeric_property(constrained, "minimum") {
        if value < min {
            fail(format!("minimum: {min}"));
        }
    }
    if let Some(max) = numeric_property(constrained, "exclusiveMaximum") {
        if value >= max {
            fail(format!("exclusiveMaximum: {max}"));
        }
    }
    if let Some(min) = numeric_property(constrained, "exclusiveMinimum") {
        if value <= min {
            fail(format!("exclusiveMinimum: {min}"));
        }
    }
    if let Some(divisor) = numeric_property(constrained, "multipleOf") {
        if divisor != 0.0 && (value % divisor) != 0.0 {
            fail(format!("multipleOf: {divisor}"));
        }
    }

    errors
}

fn check_string(
    declared_type: &str,
    port: &str,
    constrained: &Declaration,
    value: &str,
    node: &Node,
) -> Vec<Error> {
    let mut errors = Vec::new();
    let len = value.chars().count() as i64;

    if let Some(min) = integer_property(constrained, "minLength") {
        if len < min {
            errors.push(constraint_fail(
                declared_type,
                port,
                &format!("minLength: {min}"),
                node,
            ));
        }
    }
    if let Some(max) = integer_property(constrained, "maxLength") {
        if len > max {
            errors.push(constraint_fail(
                declared_type,
                port,
                &format!("maxLength: {max}"),
                node,
            ));
        }
    }

    errors
}

fn check_list(
    declared_type: &str,
    port: &str,
    constrained: &Declaration,
    items: &[Node],
    node: &Node,
) -> Vec<Error> {
    let mut errors = Vec::new();
    let count = items.len() as i64;

    if let Some(min) = integer_property(constrained, "minItems") {
        if count < min {
            errors.push(constraint_fail(
                declared_type,
                port,
                &format!("minItems: {min}"),
                node,
            ));
        }
    }
    if let Some(max) = integer_property(constrained, "maxItems") {
        if count > max {
            errors.push(constraint_fail(
                declared_type,
                port,
                &format!("maxItems: {max}"),
                node,
            ));
        }
    }

    if switch_property(constrained, "uniqueItems") {
        let texts: Vec<String> = items.iter().map(node_text).collect();
        let has_duplicate = texts
            .iter()
            .enumerate()
            .any(|(i, t)| texts[..i].contains(t));
        if has_duplicate {
            errors.push(constraint_fail(declared_type, port, "uniqueItems", node));
        }
    }

    if let Some(NodeKind::List(allowed)) = constrained.property("allowed").map(|n| &n.kind) {
        let allowed_texts: Vec<String> = allowed.iter().map(node_text).collect();
        for item in items {
            let text = node_text(item);
            if !allowed_texts.contains(&text) {
                errors.push(constraint_fail(
                    declared_type,
                    port,
                    &format!("allowed: [{}]", allowed_texts.join(", ")),
                    item,
                ));
            }
        }
    }

    errors
}

fn constraint_fail(declared_type: &str, port: &str, constraint: &str, value: &Node) -> Error {
    Error::new(ErrorKind::ConstraintFail, value.loc.clone())
        .with_token(declared_type)
        .with_token(port)
        .with_token(constraint)
        .with_token(node_text(value))
}

fn numeric_property(decl: &Declaration, name: &str) -> Option<f64> {
    match decl.property(name).map(|n| &n.kind) {
        Some(NodeKind::Int(v)) => Some(*v as f64),
        Some(NodeKind::Real(v)) => Some(*v),
        _ => None,
    }
}

fn integer_property(decl: &Declaration, name: &str) -> Option<i64> {
    match decl.property(name).map(|n| &n.kind) {
        Some(NodeKind::Int(v)) => Some(*v),
        _ => None,
    }
}

fn switch_property(decl: &Declaration, name: &str) -> bool {
    matches!(decl.property(name).map(|n| &n.kind), Some(NodeKind::Switch(true)))
}

/// Textual rendering used for value tokens and textual-equality checks.
pub fn node_text(node: &Node) -> String {
    match &node.kind {
        NodeKind::Int(v) => v.to_string(),
        NodeKind::Real(v) => v.to_string(),
        NodeKind::String(s) => s.clone(),
        NodeKind::Switch(true) => "on".to_string(),
        NodeKind::Switch(false) => "off".to_string(),
        NodeKind::Block(b) => b.qualified_name(),
        NodeKind::Bundle(b) => b.qualified_name(),
        NodeKind::List(items) => {
            let inner: Vec<String> = items.iter().map(node_text).collect();
            format!("[{}]", inner.join(", "))
        }
        NodeKind::None => "none".to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ast::Location;

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn int(v: i64) -> Node {
        Node::new(NodeKind::Int(v), loc())
    }

    fn constrained_int(props: &[(&str, i64)]) -> Declaration {
        let mut d = Declaration::new("Bounded", "constrainedInt");
        for (name, v) in props {
            d.set_property(*name, int(*v));
        }
        d
    }

    #[test]
    fn test_maximum_is_inclusive() {
        let c = constrained_int(&[("maximum", 10)]);

        assert!(check_value("signal", "level", &c, &int(10)).is_empty());

        let errors = check_value("signal", "level", &c, &int(11));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ConstraintFail);
        assert_eq!(
            errors[0].tokens,
            vec![
                "signal".to_string(),
                "level".to_string(),
                "maximum: 10".to_string(),
                "11".to_string(),
            ]
        );
    }

    #[test]
    fn test_exclusive_maximum_rejects_bound() {
        let c = constrained_int(&[("exclusiveMaximum", 10)]);

        assert!(check_value("signal", "level", &c, &int(9)).is_empty());
        assert_eq!(check_value("signal", "level", &c, &int(10)).len(), 1);
    }

    #[test]
    fn test_minimum_and_exclusive_minimum() {
        let inclusive = constrained_int(&[("minimum", 2)]);
        assert!(check_value("s", "p", &inclusive, &int(2)).is_empty());
        assert_eq!(check_value("s", "p", &inclusive, &int(1)).len(), 1);

        let exclusive = constrained_int(&[("exclusiveMinimum", 2)]);
        assert_eq!(check_value("s", "p", &exclusive, &int(2)).len(), 1);
        assert!(check_value("s", "p", &exclusive, &int(3)).is_empty());
    }

    #[test]
    fn test_multiple_of() {
        let c = constrained_int(&[("multipleOf", 4)]);

        assert!(check_value("s", "p", &c, &int(8)).is_empty());
        let errors = check_value("s", "p", &c, &int(6));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tokens[2], "multipleOf: 4");
    }

    #[test]
    fn test_string_length_bounds() {
        let mut c = Declaration::new("Name", "constrainedString");
        c.set_property("minLength", int(2));
        c.set_property("maxLength", int(4));

        let value = |s: &str| Node::new(NodeKind::String(s.to_string()), loc());

        assert!(check_value("s", "p", &c, &value("ab")).is_empty());
        assert_eq!(check_value("s", "p", &c, &value("a")).len(), 1);
        assert_eq!(check_value("s", "p", &c, &value("abcde")).len(), 1);
    }

    #[test]
    fn test_min_items() {
        let mut c = Declaration::new("Pair", "constrainedList");
        c.set_property("minItems", int(2));

        let single = Node::new(NodeKind::List(vec![int(1)]), loc());
        let errors = check_value("s", "values", &c, &single);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ConstraintFail);
        assert_eq!(errors[0].tokens[1], "values");
        assert_eq!(errors[0].tokens[2], "minItems: 2");

        let pair = Node::new(NodeKind::List(vec![int(1), int(2)]), loc());
        assert!(check_value("s", "values", &c, &pair).is_empty());
    }

    #[test]
    fn test_unique_items_textual() {
        let mut c = Declaration::new("Set", "constrainedList");
        c.set_property("uniqueItems", Node::new(NodeKind::Switch(true), loc()));

        let dup = Node::new(NodeKind::List(vec![int(3), int(3)]), loc());
        assert_eq!(check_value("s", "p", &c, &dup).len(), 1);

        let uniq = Node::new(NodeKind::List(vec![int(3), int(4)]), loc());
        assert!(check_value("s", "p", &c, &uniq).is_empty());
    }

    #[test]
    fn test_allowed_membership() {
        let mut c = Declaration::new("Choice", "constrainedList");
        c.set_property(
            "allowed",
            Node::new(NodeKind::List(vec![int(1), int(2)]), loc()),
        );

        let ok = Node::new(NodeKind::List(vec![int(1), int(2), int(1)]), loc());
        assert!(check_value("s", "p", &c, &ok).is_empty());

        let bad = Node::new(NodeKind::List(vec![int(1), int(9)]), loc());
        let errors = check_value("s", "p", &c, &bad);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tokens[3], "9");
    }

    #[test]
    fn test_mismatched_base_kind_is_ignored() {
        // Type mismatches are the port checker's report, not a constraint
        // failure.
        let c = constrained_int(&[("maximum", 10)]);
        let value = Node::new(NodeKind::String("high".to_string()), loc());
        assert!(check_value("s", "p", &c, &value).is_empty());
    }
}
