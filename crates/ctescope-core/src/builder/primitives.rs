//! Structural lookups shared by every build mode.

use crate::tree::{NodeKind, SyntaxTree};
use crate::types::Span;

/// The parts of a CTE definition strictly between its first `(` and last `)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerBody {
    pub text: String,
    pub span: Span,
}

/// Extracts the body of a CTE definition without its `name AS ( … )` wrapper.
///
/// Returns `None` when the definition has no parentheses or nothing between
/// them.
pub fn inner_body<T: SyntaxTree>(tree: &T, definition: T::Node) -> Option<InnerBody> {
    let children = tree.children(definition);
    let open = children
        .iter()
        .position(|child| tree.kind(*child) == NodeKind::LeftParen)?;
    let close = children
        .iter()
        .rposition(|child| tree.kind(*child) == NodeKind::RightParen)?;
    if close <= open + 1 {
        return None;
    }

    let inner = &children[open + 1..close];
    let text: String = inner.iter().map(|child| tree.text(*child)).collect();
    let span = inner
        .iter()
        .map(|child| tree.range(*child))
        .reduce(|acc, range| acc.cover(range))?;

    Some(InnerBody { text, span })
}

/// The first comma following `definition` among its siblings.
pub fn separator_comma<T: SyntaxTree>(tree: &T, definition: T::Node) -> Option<T::Node> {
    tree.following_siblings(definition)
        .find(|sibling| tree.kind(*sibling) == NodeKind::Comma)
}

/// The `WITH` keyword among the direct children of `scope`.
pub fn with_keyword<T: SyntaxTree>(tree: &T, scope: T::Node) -> Option<T::Node> {
    tree.first_child_of_kind(scope, NodeKind::WithKeyword)
}

/// The last `)` among the direct children of `definition`.
pub fn closing_paren<T: SyntaxTree>(tree: &T, definition: T::Node) -> Option<T::Node> {
    tree.children(definition)
        .into_iter()
        .rev()
        .find(|child| tree.kind(*child) == NodeKind::RightParen)
}

/// True when the scope's `WITH` keyword is followed by `RECURSIVE`.
pub fn is_recursive<T: SyntaxTree>(tree: &T, scope: T::Node) -> bool {
    let Some(keyword) = with_keyword(tree, scope) else {
        return false;
    };
    tree.following_siblings(keyword)
        .find(|sibling| tree.kind(*sibling) != NodeKind::Whitespace)
        .is_some_and(|sibling| tree.text(sibling).eq_ignore_ascii_case("recursive"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SqlTree;
    use crate::types::Dialect;

    fn first_definition(tree: &SqlTree<'_>) -> crate::tree::NodeId {
        tree.descendants(tree.root())
            .find(|node| tree.kind(*node) == NodeKind::NamedQueryDefinition)
            .unwrap()
    }

    #[test]
    fn test_inner_body_keeps_interior_whitespace() {
        let sql = "WITH a AS (\n  SELECT 1\n) SELECT * FROM a";
        let tree = SqlTree::parse(sql, Dialect::Generic).unwrap();

        let body = inner_body(&tree, first_definition(&tree)).unwrap();
        assert_eq!(body.text, "\n  SELECT 1\n");
        assert_eq!(&sql[body.span.start..body.span.end], "\n  SELECT 1\n");
    }

    #[test]
    fn test_inner_body_missing() {
        for sql in ["WITH a AS () SELECT 1", "WITH a AS SELECT 1", "WITH a AS (SELECT 1"] {
            let tree = SqlTree::parse(sql, Dialect::Generic).unwrap();
            assert!(inner_body(&tree, first_definition(&tree)).is_none(), "{sql}");
        }
    }

    #[test]
    fn test_separator_comma_and_keyword() {
        let sql = "WITH a AS (SELECT 1) , b AS (SELECT 2) SELECT 3";
        let tree = SqlTree::parse(sql, Dialect::Generic).unwrap();
        let definition = first_definition(&tree);

        let comma = separator_comma(&tree, definition).unwrap();
        assert_eq!(tree.range(comma).start, sql.find(',').unwrap());

        let scope = tree.parent(definition).unwrap();
        let keyword = with_keyword(&tree, scope).unwrap();
        assert_eq!(tree.range(keyword), Span::new(0, 4));
        assert!(!is_recursive(&tree, scope));

        let last = tree
            .following_siblings(comma)
            .find(|node| tree.kind(*node) == NodeKind::NamedQueryDefinition)
            .unwrap();
        assert!(separator_comma(&tree, last).is_none());
    }

    #[test]
    fn test_closing_paren_and_recursive() {
        let sql = "with recursive t (n) AS (SELECT 1) SELECT * FROM t";
        let tree = SqlTree::parse(sql, Dialect::Generic).unwrap();
        let definition = first_definition(&tree);

        let paren = closing_paren(&tree, definition).unwrap();
        assert_eq!(tree.range(paren).end, sql.find(" SELECT *").unwrap());
        assert!(is_recursive(&tree, tree.parent(definition).unwrap()));
    }
}
