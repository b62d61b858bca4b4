//! Lenient structural builder producing a [`super::SqlTree`] from tokens.
//!
//! This is not a SQL parser: it recognises just enough structure (WITH clauses,
//! CTE definitions, query bodies, FROM clauses, table references and joins) for
//! scope analysis, and never rejects input. Every token ends up as a leaf.

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::error::ParseError;
use crate::types::{Dialect, Span};

use super::position::OffsetCursor;
use super::sql::{NodeData, NodeId};
use super::NodeKind;

/// Keywords that end a FROM clause.
const CLAUSE_END_KEYWORDS: &[Keyword] = &[
    Keyword::WHERE,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::OFFSET,
    Keyword::QUALIFY,
    Keyword::WINDOW,
    Keyword::UNION,
    Keyword::INTERSECT,
    Keyword::EXCEPT,
    Keyword::FETCH,
    Keyword::RETURNING,
];

const JOIN_MODIFIERS: &[Keyword] = &[
    Keyword::LEFT,
    Keyword::RIGHT,
    Keyword::FULL,
    Keyword::INNER,
    Keyword::OUTER,
    Keyword::CROSS,
    Keyword::NATURAL,
];

/// Parentheses and WITH clauses nested deeper than this are kept as flat
/// tokens, which bounds the recursion of the grammar functions.
const MAX_NESTING_DEPTH: usize = 128;

const QUERY_START_KEYWORDS: &[Keyword] = &[Keyword::SELECT, Keyword::WITH, Keyword::VALUES];

const STATEMENT_KEYWORDS: &[Keyword] = &[
    Keyword::SELECT,
    Keyword::INSERT,
    Keyword::UPDATE,
    Keyword::DELETE,
    Keyword::VALUES,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Word,
    LParen,
    RParen,
    Comma,
    SemiColon,
    Period,
    Trivia,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct RawToken {
    class: TokenClass,
    span: Span,
    /// `NoKeyword` for non-words and quoted identifiers.
    keyword: Keyword,
}

pub(crate) struct TreeBuilder {
    tokens: Vec<RawToken>,
    pos: usize,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    source_len: usize,
    depth: usize,
    /// Node ids stop at this bound; later tokens are dropped from the tree.
    node_limit: u32,
    /// Starts that could not allocate a node; their finishes are skipped.
    unopened: usize,
}

impl TreeBuilder {
    pub(crate) fn new(sql: &str, dialect: Dialect) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(sql, dialect)?,
            pos: 0,
            nodes: Vec::new(),
            stack: Vec::new(),
            source_len: sql.len(),
            depth: 0,
            node_limit: u32::MAX,
            unopened: 0,
        })
    }

    #[cfg(test)]
    fn with_node_limit(mut self, node_limit: u32) -> Self {
        self.node_limit = node_limit;
        self
    }

    pub(crate) fn build(mut self) -> Vec<NodeData> {
        self.nodes.push(NodeData {
            kind: NodeKind::Other,
            span: Span::new(0, self.source_len),
            parent: None,
            slot: 0,
            children: Vec::new(),
        });
        self.stack.push(NodeId(0));
        self.parse_document();

        #[cfg(feature = "tracing")]
        trace!(
            tokens = self.tokens.len(),
            nodes = self.nodes.len(),
            "built syntax tree"
        );

        self.nodes
    }

    // ---- tree plumbing -------------------------------------------------

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId(0))
    }

    fn attach(&mut self, kind: NodeKind, span: Span) -> Option<NodeId> {
        let raw = u32::try_from(self.nodes.len())
            .ok()
            .filter(|raw| *raw < self.node_limit)?;
        let parent = self.current();
        let id = NodeId(raw);
        let slot = self.nodes[parent.index()].children.len();
        self.nodes.push(NodeData {
            kind,
            span,
            parent: Some(parent),
            slot,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        Some(id)
    }

    fn start(&mut self, kind: NodeKind) {
        match self.attach(kind, Span::empty(self.offset())) {
            Some(id) => self.stack.push(id),
            None => self.unopened += 1,
        }
    }

    /// Closes the innermost open node. Trailing whitespace moves up to the
    /// parent so composite ranges always end on a significant token.
    fn finish(&mut self) {
        if self.unopened > 0 {
            self.unopened -= 1;
            return;
        }
        let Some(id) = self.stack.pop() else {
            return;
        };
        let Some(parent) = self.nodes[id.index()].parent else {
            return;
        };

        let mut trailing = Vec::new();
        while let Some(&last) = self.nodes[id.index()].children.last() {
            if self.nodes[last.index()].kind != NodeKind::Whitespace {
                break;
            }
            self.nodes[id.index()].children.pop();
            trailing.push(last);
        }
        for child in trailing.into_iter().rev() {
            let slot = self.nodes[parent.index()].children.len();
            self.nodes[parent.index()].children.push(child);
            let data = &mut self.nodes[child.index()];
            data.parent = Some(parent);
            data.slot = slot;
        }

        let children = &self.nodes[id.index()].children;
        if let (Some(first), Some(last)) = (children.first(), children.last()) {
            let span = Span::new(
                self.nodes[first.index()].span.start,
                self.nodes[last.index()].span.end,
            );
            self.nodes[id.index()].span = span;
        }
    }

    /// Consumes the current token as a leaf of `kind`.
    fn bump(&mut self, kind: NodeKind) {
        if let Some(token) = self.tokens.get(self.pos) {
            let span = token.span;
            self.attach(kind, span);
            self.pos += 1;
        }
    }

    /// Enters one level of nesting, or returns false at the depth limit.
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn bump_trivia(&mut self) {
        while self.at(TokenClass::Trivia) {
            self.bump(NodeKind::Whitespace);
        }
    }

    // ---- lookahead -----------------------------------------------------

    fn peek(&self) -> Option<&RawToken> {
        self.tokens.get(self.pos)
    }

    /// The `n`th non-trivia token from the current position.
    fn peek_significant(&self, n: usize) -> Option<&RawToken> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|token| token.class != TokenClass::Trivia)
            .nth(n)
    }

    fn offset(&self) -> usize {
        self.peek()
            .map(|token| token.span.start)
            .unwrap_or(self.source_len)
    }

    fn at(&self, class: TokenClass) -> bool {
        self.peek().is_some_and(|token| token.class == class)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek()
            .is_some_and(|token| token.class == TokenClass::Word && token.keyword == keyword)
    }

    fn at_any_keyword(&self, keywords: &[Keyword]) -> bool {
        self.peek().is_some_and(|token| {
            token.class == TokenClass::Word && keywords.contains(&token.keyword)
        })
    }

    fn at_stop(&self, nested: bool) -> bool {
        match self.peek() {
            None => true,
            Some(token) => {
                token.class == TokenClass::SemiColon
                    || (nested && token.class == TokenClass::RParen)
            }
        }
    }

    fn at_clause_end(&self) -> bool {
        self.at_any_keyword(CLAUSE_END_KEYWORDS)
    }

    fn at_join_start(&self) -> bool {
        if self.at_keyword(Keyword::JOIN) {
            return true;
        }
        // `LEFT(...)` and `RIGHT(...)` are string functions, not joins.
        self.at_any_keyword(JOIN_MODIFIERS)
            && self
                .peek_significant(1)
                .is_some_and(|next| next.class != TokenClass::LParen)
    }

    fn at_identifier_word(&self) -> bool {
        self.peek().is_some_and(|token| {
            token.class == TokenClass::Word && token.keyword == Keyword::NoKeyword
        })
    }

    /// True when the current `(` opens a query rather than an expression list.
    fn paren_starts_query(&self) -> bool {
        self.peek_significant(1).is_some_and(|next| {
            next.class == TokenClass::LParen
                || (next.class == TokenClass::Word && QUERY_START_KEYWORDS.contains(&next.keyword))
        })
    }

    /// A `WITH` in the middle of a statement opens a scope only when it reads
    /// `WITH [RECURSIVE] name AS` or `WITH name (`; this keeps `WITH TIME ZONE`
    /// and `WITH ORDINALITY` as plain tokens.
    fn looks_like_with_clause(&self) -> bool {
        let Some(first) = self.peek_significant(1) else {
            return false;
        };
        if first.class != TokenClass::Word {
            return false;
        }
        if first.keyword == Keyword::RECURSIVE {
            return true;
        }
        self.peek_significant(2).is_some_and(|second| {
            second.class == TokenClass::LParen
                || (second.class == TokenClass::Word && second.keyword == Keyword::AS)
        })
    }

    fn at_cte_name(&self) -> bool {
        self.at(TokenClass::Word) && !self.at_any_keyword(STATEMENT_KEYWORDS)
    }

    // ---- grammar -------------------------------------------------------

    fn parse_document(&mut self) {
        loop {
            self.bump_trivia();
            let Some(&token) = self.peek() else {
                break;
            };
            match token.class {
                TokenClass::SemiColon => self.bump(NodeKind::Other),
                TokenClass::RParen => self.bump(NodeKind::RightParen),
                _ => self.parse_query(false),
            }
        }
    }

    fn parse_query(&mut self, nested: bool) {
        self.bump_trivia();
        if self.at_stop(nested) {
            return;
        }
        if self.at_keyword(Keyword::WITH) {
            self.parse_with_query(nested);
        } else {
            self.parse_select(nested);
        }
    }

    fn parse_with_query(&mut self, nested: bool) {
        if !self.enter() {
            self.bump(NodeKind::Other);
            return;
        }
        self.start(NodeKind::WithQueryWrapper);
        self.start(NodeKind::WithClause);
        self.bump(NodeKind::WithKeyword);
        self.bump_trivia();
        if self.at_keyword(Keyword::RECURSIVE) {
            self.bump(NodeKind::Other);
        }

        loop {
            self.bump_trivia();
            if self.at_stop(nested) || !self.at_cte_name() {
                break;
            }
            self.parse_cte();
            self.bump_trivia();
            if !self.at(TokenClass::Comma) {
                break;
            }
            self.bump(NodeKind::Comma);
        }
        self.finish();

        self.bump_trivia();
        if !self.at_stop(nested) {
            self.parse_select(nested);
        }
        self.finish();
        self.leave();
    }

    /// `name [(columns)] AS [[NOT] MATERIALIZED] ( query )`
    fn parse_cte(&mut self) {
        self.start(NodeKind::NamedQueryDefinition);
        self.bump(NodeKind::Identifier);
        self.bump_trivia();

        if self.at(TokenClass::LParen) && !self.paren_starts_query() {
            // Column list; wrapped so the body's parenthesis is the first
            // one among the definition's children.
            self.start(NodeKind::Other);
            self.parse_group();
            self.finish();
            self.bump_trivia();
        }

        while self.at_any_keyword(&[Keyword::AS, Keyword::NOT, Keyword::MATERIALIZED]) {
            self.bump(NodeKind::Other);
            self.bump_trivia();
        }

        if self.at(TokenClass::LParen) {
            self.bump(NodeKind::LeftParen);
            self.parse_query(true);
            self.bump_trivia();
            if self.at(TokenClass::RParen) {
                self.bump(NodeKind::RightParen);
            }
        }
        self.finish();
    }

    fn parse_select(&mut self, nested: bool) {
        self.start(NodeKind::SelectStatement);
        loop {
            self.bump_trivia();
            if self.at_stop(nested) {
                break;
            }
            if self.at_keyword(Keyword::FROM) {
                self.parse_from(nested);
            } else {
                self.parse_token(nested);
            }
        }
        self.finish();
    }

    fn parse_from(&mut self, nested: bool) {
        self.start(NodeKind::FromClause);
        self.bump(NodeKind::Other);
        loop {
            self.bump_trivia();
            if self.at_stop(nested) || self.at_clause_end() {
                break;
            }
            if self.at_join_start() {
                self.parse_join(nested);
                continue;
            }
            match self.peek().map(|token| token.class) {
                Some(TokenClass::Comma) => self.bump(NodeKind::Comma),
                Some(TokenClass::RParen) => self.bump(NodeKind::RightParen),
                _ => self.parse_table_factor(),
            }
        }
        self.finish();
    }

    fn parse_join(&mut self, nested: bool) {
        self.start(NodeKind::JoinExpression);
        while self.at_any_keyword(JOIN_MODIFIERS) {
            self.bump(NodeKind::Other);
            self.bump_trivia();
        }
        if self.at_keyword(Keyword::JOIN) || self.at_keyword(Keyword::APPLY) {
            self.bump(NodeKind::Other);
        }

        self.bump_trivia();
        if !self.at_stop(nested) && !self.at_clause_end() && !self.at(TokenClass::Comma) {
            self.parse_table_factor();
        }

        self.bump_trivia();
        if self.at_keyword(Keyword::ON) || self.at_keyword(Keyword::USING) {
            self.bump(NodeKind::Other);
            loop {
                self.bump_trivia();
                if self.at_stop(nested)
                    || self.at_clause_end()
                    || self.at_join_start()
                    || self.at(TokenClass::Comma)
                {
                    break;
                }
                self.parse_token(nested);
            }
        }
        self.finish();
    }

    /// A relation in a FROM list: `name[.name]* [(args)] [[AS] alias]` or a
    /// parenthesised subquery with an optional alias.
    fn parse_table_factor(&mut self) {
        let Some(&token) = self.peek() else {
            return;
        };
        match token.class {
            TokenClass::LParen => {
                self.parse_paren();
                self.parse_alias();
            }
            TokenClass::Word if token.keyword == Keyword::LATERAL => self.bump(NodeKind::Other),
            TokenClass::Word => {
                self.start(NodeKind::TableReference);
                self.bump(NodeKind::Identifier);
                while self.at(TokenClass::Period) {
                    self.bump(NodeKind::Other);
                    if self.at(TokenClass::Word) {
                        self.bump(NodeKind::Identifier);
                    }
                }
                if self.at(TokenClass::LParen) {
                    self.parse_group();
                }
                self.parse_alias();
                self.finish();
            }
            _ => self.bump(NodeKind::Other),
        }
    }

    fn parse_alias(&mut self) {
        self.bump_trivia();
        if self.at_keyword(Keyword::AS) {
            self.bump(NodeKind::Other);
            self.bump_trivia();
            if self.at(TokenClass::Word) {
                self.bump(NodeKind::Identifier);
            }
        } else if self.at_identifier_word() {
            self.bump(NodeKind::Identifier);
        }
    }

    fn parse_paren(&mut self) {
        if !self.enter() {
            self.bump(NodeKind::LeftParen);
            return;
        }
        if self.paren_starts_query() {
            self.start(NodeKind::QueryExpression);
            self.bump(NodeKind::LeftParen);
            self.parse_query(true);
            self.bump_trivia();
            if self.at(TokenClass::RParen) {
                self.bump(NodeKind::RightParen);
            }
            self.finish();
        } else {
            self.parse_group();
        }
        self.leave();
    }

    /// Parenthesised expression list; its tokens attach to the current node.
    fn parse_group(&mut self) {
        self.bump(NodeKind::LeftParen);
        loop {
            self.bump_trivia();
            if self.at_stop(true) {
                break;
            }
            self.parse_token(true);
        }
        if self.at(TokenClass::RParen) {
            self.bump(NodeKind::RightParen);
        }
    }

    /// One expression-level token; always consumes at least one token.
    fn parse_token(&mut self, nested: bool) {
        let Some(&token) = self.peek() else {
            return;
        };
        match token.class {
            TokenClass::LParen => self.parse_paren(),
            TokenClass::Word if token.keyword == Keyword::WITH && self.looks_like_with_clause() => {
                self.parse_with_query(nested)
            }
            TokenClass::Word if token.keyword == Keyword::NoKeyword => {
                self.bump(NodeKind::Identifier)
            }
            TokenClass::Comma => self.bump(NodeKind::Comma),
            TokenClass::RParen => self.bump(NodeKind::RightParen),
            _ => self.bump(NodeKind::Other),
        }
    }
}

fn tokenize(sql: &str, dialect: Dialect) -> Result<Vec<RawToken>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    let mut tokenizer = Tokenizer::new(sqlparser_dialect.as_ref(), sql);
    let tokens: Vec<TokenWithSpan> = tokenizer.tokenize_with_location()?;

    let mut cursor = OffsetCursor::new(sql);
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        let start = cursor.offset(
            token.span.start.line as usize,
            token.span.start.column as usize,
        );
        let end = cursor.offset(token.span.end.line as usize, token.span.end.column as usize);
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };
        if end <= start {
            continue;
        }

        let (class, keyword) = classify_token(&token.token);
        out.push(RawToken {
            class,
            span: Span::new(start, end),
            keyword,
        });
    }

    Ok(out)
}

fn classify_token(token: &Token) -> (TokenClass, Keyword) {
    match token {
        Token::Word(word) if word.quote_style.is_some() => (TokenClass::Word, Keyword::NoKeyword),
        Token::Word(word) => (TokenClass::Word, word.keyword),
        Token::LParen => (TokenClass::LParen, Keyword::NoKeyword),
        Token::RParen => (TokenClass::RParen, Keyword::NoKeyword),
        Token::Comma => (TokenClass::Comma, Keyword::NoKeyword),
        Token::SemiColon => (TokenClass::SemiColon, Keyword::NoKeyword),
        Token::Period => (TokenClass::Period, Keyword::NoKeyword),
        Token::Whitespace(_) => (TokenClass::Trivia, Keyword::NoKeyword),
        _ => (TokenClass::Other, Keyword::NoKeyword),
    }
}

#[cfg(test)]
mod tests {
    use super::TreeBuilder;
    use crate::tree::{NodeKind, SqlTree, SyntaxTree};
    use crate::types::{Dialect, Span};

    fn parse(sql: &str) -> SqlTree<'_> {
        SqlTree::parse(sql, Dialect::Generic).expect("tokenize")
    }

    fn kinds_of<'a>(tree: &SqlTree<'a>, kind: NodeKind) -> Vec<&'a str> {
        tree.descendants(tree.root())
            .filter(|node| tree.kind(*node) == kind)
            .map(|node| &tree.source()[tree.range(node).start..tree.range(node).end])
            .collect()
    }

    #[test]
    fn test_with_clause_structure() {
        let sql = "WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b;";
        let tree = parse(sql);

        assert_eq!(
            kinds_of(&tree, NodeKind::NamedQueryDefinition),
            vec!["a AS (SELECT 1)", "b AS (SELECT * FROM a)"]
        );
        assert_eq!(
            kinds_of(&tree, NodeKind::WithClause),
            vec!["WITH a AS (SELECT 1), b AS (SELECT * FROM a)"]
        );
        assert_eq!(
            kinds_of(&tree, NodeKind::WithQueryWrapper),
            vec!["WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b"]
        );
        assert_eq!(kinds_of(&tree, NodeKind::WithKeyword), vec!["WITH"]);
    }

    #[test]
    fn test_composite_nodes_exclude_trailing_whitespace() {
        let sql = "WITH a AS (\n  SELECT 1\n)\nSELECT * FROM a  \n;";
        let tree = parse(sql);

        let selects = kinds_of(&tree, NodeKind::SelectStatement);
        assert_eq!(selects, vec!["SELECT 1", "SELECT * FROM a"]);
    }

    #[test]
    fn test_column_list_is_wrapped() {
        let sql = "WITH a (x, y) AS (SELECT 1, 2) SELECT x FROM a";
        let tree = parse(sql);

        let definition = tree
            .descendants(tree.root())
            .find(|node| tree.kind(*node) == NodeKind::NamedQueryDefinition)
            .unwrap();
        let first_paren = tree
            .first_child_of_kind(definition, NodeKind::LeftParen)
            .unwrap();
        assert_eq!(tree.range(first_paren).start, sql.find("(SELECT").unwrap());
    }

    #[test]
    fn test_materialized_and_recursive() {
        let sql = "WITH RECURSIVE t AS NOT MATERIALIZED (SELECT 1) SELECT * FROM t";
        let tree = parse(sql);
        assert_eq!(
            kinds_of(&tree, NodeKind::NamedQueryDefinition),
            vec!["t AS NOT MATERIALIZED (SELECT 1)"]
        );
    }

    #[test]
    fn test_from_clause_and_joins() {
        let sql = "SELECT * FROM s.orders o LEFT JOIN users AS u ON o.uid = u.id, items";
        let tree = parse(sql);

        assert_eq!(
            kinds_of(&tree, NodeKind::TableReference),
            vec!["s.orders o", "users AS u", "items"]
        );
        assert_eq!(
            kinds_of(&tree, NodeKind::JoinExpression),
            vec!["LEFT JOIN users AS u ON o.uid = u.id"]
        );
        assert_eq!(
            kinds_of(&tree, NodeKind::FromClause),
            vec!["FROM s.orders o LEFT JOIN users AS u ON o.uid = u.id, items"]
        );
    }

    #[test]
    fn test_from_clause_stops_at_where() {
        let sql = "SELECT * FROM a WHERE x IN (SELECT y FROM b)";
        let tree = parse(sql);

        assert_eq!(
            kinds_of(&tree, NodeKind::FromClause),
            vec!["FROM a", "FROM b"]
        );
        assert_eq!(
            kinds_of(&tree, NodeKind::QueryExpression),
            vec!["(SELECT y FROM b)"]
        );
    }

    #[test]
    fn test_keyword_named_relation_is_identifier() {
        let sql = "WITH data AS (SELECT 1) SELECT * FROM data";
        let tree = parse(sql);
        assert_eq!(kinds_of(&tree, NodeKind::TableReference), vec!["data"]);
    }

    #[test]
    fn test_with_time_zone_is_not_a_scope() {
        let sql = "SELECT CAST(x AS TIMESTAMP WITH TIME ZONE) FROM t";
        let tree = parse(sql);
        assert!(kinds_of(&tree, NodeKind::WithClause).is_empty());
    }

    #[test]
    fn test_insert_with_nested_scope() {
        let sql = "INSERT INTO archive WITH a AS (SELECT 1) SELECT * FROM a";
        let tree = parse(sql);
        assert_eq!(
            kinds_of(&tree, NodeKind::NamedQueryDefinition),
            vec!["a AS (SELECT 1)"]
        );
    }

    #[test]
    fn test_unbalanced_input_is_accepted() {
        for sql in [
            "WITH",
            "WITH a AS (",
            "WITH a AS (SELECT 1",
            "WITH a AS (SELECT 1),",
            ") SELECT (",
            "SELECT * FROM (SELECT 1",
            "WITH a AS (SELECT 1)) SELECT 2",
        ] {
            let tree = parse(sql);
            let rebuilt: String = tree
                .descendants(tree.root())
                .filter(|node| tree.children(*node).is_empty())
                .map(|node| tree.text(node))
                .collect();
            assert_eq!(rebuilt, sql, "leaves must cover {sql:?}");
        }
    }

    #[test]
    fn test_tokenizer_error() {
        let err = SqlTree::parse("SELECT 'unterminated", Dialect::Postgres).unwrap_err();
        assert_eq!(err.dialect, Some(Dialect::Postgres));
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let depth = 5_000;
        let sql = format!(
            "WITH a AS (SELECT {}1{}) SELECT * FROM a",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let tree = parse(&sql);

        let rebuilt: String = tree
            .descendants(tree.root())
            .filter(|node| tree.children(*node).is_empty())
            .map(|node| tree.text(node))
            .collect();
        assert_eq!(rebuilt, sql);

        let deepest = tree
            .descendants(tree.root())
            .map(|node| tree.ancestors(node).count())
            .max()
            .unwrap();
        assert!(deepest < depth, "tree depth {deepest} follows input nesting");
    }

    #[test]
    fn test_deep_with_nesting_is_flattened() {
        let sql = "WITH a AS ".repeat(2_000) + "(SELECT 1) SELECT 1";
        let tree = parse(&sql);
        let wrappers = kinds_of(&tree, NodeKind::WithQueryWrapper);
        assert!(!wrappers.is_empty());
        assert!(wrappers.len() <= super::MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_node_limit_stops_attaching() {
        let sql = "WITH a AS (SELECT 1) SELECT * FROM a";
        let nodes = TreeBuilder::new(sql, Dialect::Generic)
            .unwrap()
            .with_node_limit(6)
            .build();

        assert_eq!(nodes.len(), 6);
        for (index, node) in nodes.iter().enumerate() {
            assert!(node.children.iter().all(|child| child.index() < nodes.len()));
            if let Some(parent) = node.parent {
                assert!(parent.index() < index);
            }
        }
        assert_eq!(nodes[0].span, Span::new(0, sql.len()));
    }
}
