//! Bundle declaration checks: index typing and size agreement.
//!
//! A bundle's declared size must be a foldable integer, and when the
//! declaration carries an initializer its effective element count must
//! equal the declared size. The mismatch is reported once per bundle
//! declaration, carrying both sizes.

use crate::consteval::{
    const_block_data_size, declared_bundle_size, initializer, resolve_node_out_data_type,
    StructuralType,
};
use crate::context::ResolveContext;
use stride_ast::{Declaration, Error, ErrorKind};

/// Validate one bundle declaration.
pub fn check_bundle(decl: &Declaration, ctx: ResolveContext<'_>) -> Vec<Error> {
    let mut errors = Vec::new();

    let Some(size_node) = &decl.size else {
        return errors;
    };

    let size_type = resolve_node_out_data_type(size_node, ctx);
    if !matches!(size_type, StructuralType::Int | StructuralType::Invalid) {
        errors.push(
            Error::new(ErrorKind::IndexMustBeInteger, size_node.loc.clone())
                .with_token(&decl.name)
                .with_token(size_type.name()),
        );
        return errors;
    }

    let declared = match declared_bundle_size(decl, ctx) {
        Ok(size) => size,
        Err(err) => {
            errors.push(err);
            return errors;
        }
    };

    if initializer(decl).is_some() {
        match const_block_data_size(decl, ctx) {
            Ok(actual) if actual != declared => {
                errors.push(
                    Error::new(ErrorKind::BundleSizeMismatch, decl.loc.clone())
                        .with_token(&decl.name)
                        .with_token(declared.to_string())
                        .with_token(actual.to_string()),
                );
            }
            Ok(_) => {}
            Err(err) => errors.push(err),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ast::{Location, Node, NodeKind, ScopeStack};

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn int(v: i64) -> Node {
        Node::new(NodeKind::Int(v), loc())
    }

    fn bundle(name: &str, size: Node, values: Option<Vec<Node>>) -> Declaration {
        let mut d = Declaration::new(name, "signal");
        d.size = Some(Box::new(size));
        if let Some(values) = values {
            d.set_property("value", Node::new(NodeKind::List(values), loc()));
        }
        d
    }

    #[test]
    fn test_matching_sizes_pass() {
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&[], &scope);

        let d = bundle("Out", int(3), Some(vec![int(0), int(0), int(0)]));
        assert!(check_bundle(&d, ctx).is_empty());
    }

    #[test]
    fn test_mismatch_reports_both_sizes() {
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&[], &scope);

        let short = bundle("Out", int(4), Some(vec![int(0), int(0), int(0)]));
        let errors = check_bundle(&short, ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::BundleSizeMismatch);
        assert_eq!(
            errors[0].tokens,
            vec!["Out".to_string(), "4".to_string(), "3".to_string()]
        );

        let long = bundle("Out", int(2), Some(vec![int(0), int(0), int(0)]));
        let errors = check_bundle(&long, ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].tokens,
            vec!["Out".to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[test]
    fn test_no_initializer_skips_size_check() {
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&[], &scope);

        let d = bundle("Out", int(8), None);
        assert!(check_bundle(&d, ctx).is_empty());
    }

    #[test]
    fn test_non_integer_size_reported() {
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&[], &scope);

        let d = bundle(
            "Out",
            Node::new(NodeKind::Real(2.5), loc()),
            Some(vec![int(0)]),
        );
        let errors = check_bundle(&d, ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::IndexMustBeInteger);
        assert_eq!(errors[0].tokens[1], "_RealLiteral");
    }
}
