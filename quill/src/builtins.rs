//! Built-in namespace
//!
//! Host-provided built-ins live in an object bound under a reserved root key
//! in the global scope, so they can never collide with user identifiers. A
//! built-in is addressed as `Identifier([ROOT, name])`.

use crate::ast::{Expr, Identifier, Span, Spanned};

/// Reserved root key of the built-in namespace
pub const ROOT: &str = "7a8d77e7-300a-4580-a4b2-84c20ee3d294";

/// Names registered under [`ROOT`]
pub const REGISTERED: &[&str] = &["print"];

pub fn is_registered(name: &str) -> bool {
    REGISTERED.contains(&name)
}

/// Address of a registered built-in; `None` for an unknown name
pub fn identifier(name: &str, span: Span) -> Option<Identifier> {
    if !is_registered(name) {
        return None;
    }
    Some(Identifier::new(vec![
        Spanned::new(Expr::name(ROOT), span),
        Spanned::new(Expr::name(name), span),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_is_registered() {
        assert!(is_registered("print"));
        assert!(!is_registered("println"));
    }

    #[test]
    fn test_identifier_address() {
        let ident = identifier("print", Span::new(0, 1)).unwrap();
        assert_eq!(ident.address.len(), 2);
        assert_eq!(ident.address[0].node, Expr::name(ROOT));
        assert_eq!(ident.address[1].node, Expr::name("print"));
    }

    #[test]
    fn test_identifier_unknown_name() {
        assert!(identifier("exec", Span::default()).is_none());
    }
}
