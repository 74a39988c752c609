//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntLit(i32),
    /// Double literal
    DoubleLit(f64),
    /// String literal
    StringLit(String),

    /// Storage location read: `a`, `a.b`, `a[0]`, `f(x).y`
    Ident(Identifier),

    /// Assignment to a storage location.
    ///
    /// `return_before_assignment` makes the expression yield the value held
    /// before the write (postfix `x++` / `x--`).
    Assign {
        target: Identifier,
        value: Box<Spanned<Expr>>,
        return_before_assignment: bool,
    },

    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },

    /// List constructor: `[e1, e2]`
    List(Vec<Spanned<Expr>>),

    /// Object constructor: `{k1: v1, k2: v2}`
    Object(Vec<(Spanned<Expr>, Spanned<Expr>)>),

    /// Function call. Accepted by the grammar; the runtime does not evaluate it.
    Call {
        callee: Identifier,
        args: Vec<Spanned<Expr>>,
    },
}

impl Expr {
    /// Node kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLit(_) => "int literal",
            Expr::DoubleLit(_) => "double literal",
            Expr::StringLit(_) => "string literal",
            Expr::Ident(_) => "identifier",
            Expr::Assign { .. } => "assignment",
            Expr::Binary { .. } => "binary operation",
            Expr::List(_) => "list",
            Expr::Object(_) => "object",
            Expr::Call { .. } => "function call",
        }
    }

    /// Plain name segment as the parser emits it for `name` and `.name`
    pub fn name(name: impl Into<String>) -> Self {
        Expr::StringLit(name.into())
    }
}

/// An address: the ordered key expressions naming a storage location.
///
/// The first segment is looked up in the scope chain; each following segment
/// is a member access on the value found so far. An empty address denotes
/// the current scope itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub address: Vec<Spanned<Expr>>,
}

impl Identifier {
    pub fn new(address: Vec<Spanned<Expr>>) -> Self {
        Self { address }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }

    /// Split into (container address, final key), or `None` for an empty address
    pub fn split_last(&self) -> Option<(&Spanned<Expr>, &[Spanned<Expr>])> {
        self.address.split_last()
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Pow => write!(f, "**"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Ne => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    #[test]
    fn test_binop_display() {
        assert_eq!(BinOp::Pow.to_string(), "**");
        assert_eq!(BinOp::Mod.to_string(), "%");
        assert_eq!(BinOp::Le.to_string(), "<=");
    }

    #[test]
    fn test_identifier_split_last() {
        let ident = Identifier::new(vec![
            Spanned::new(Expr::name("a"), Span::new(0, 1)),
            Spanned::new(Expr::IntLit(0), Span::new(2, 3)),
        ]);
        let (last, prefix) = ident.split_last().unwrap();
        assert_eq!(last.node, Expr::IntLit(0));
        assert_eq!(prefix.len(), 1);
        assert!(Identifier::default().split_last().is_none());
    }

    #[test]
    fn test_expr_serializes_to_json() {
        let expr = Expr::Binary {
            op: BinOp::Add,
            left: Box::new(Spanned::new(Expr::IntLit(1), Span::new(0, 1))),
            right: Box::new(Spanned::new(Expr::DoubleLit(2.5), Span::new(4, 7))),
        };
        let json = serde_json::to_string(&expr).unwrap();
        assert!(json.contains("\"Binary\""));
        assert!(json.contains("\"Add\""));
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
