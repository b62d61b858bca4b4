//! Assembles standalone SQL and source highlight spans from a set of CTEs.
//!
//! Text and spans describe the same content in two coordinate systems: `sql`
//! is freshly composed, while every span points into the original document.

use crate::analyzer::CteEntry;
use crate::tree::{NodeKind, SyntaxTree};
use crate::types::{BuildMode, Span};

mod primitives;

pub use primitives::{
    closing_paren, inner_body, is_recursive, separator_comma, with_keyword, InnerBody,
};

/// Standalone SQL plus the source ranges it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildResult {
    pub sql: String,
    pub highlight_spans: Vec<Span>,
}

/// Builds SQL text and highlight spans under one [`BuildMode`].
///
/// `ctes` are emitted in the order given; callers that want the target CTE in
/// the output include it themselves.
pub struct QueryAssembler<'t, T: SyntaxTree> {
    tree: &'t T,
    mode: BuildMode,
}

impl<'t, T: SyntaxTree> QueryAssembler<'t, T> {
    pub fn new(tree: &'t T, mode: BuildMode) -> Self {
        Self { tree, mode }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn build(
        &self,
        ctes: &[CteEntry<T::Node>],
        target: T::Node,
        all_ctes: &[CteEntry<T::Node>],
    ) -> BuildResult {
        BuildResult {
            sql: self.build_sql(ctes, target, all_ctes),
            highlight_spans: self.build_highlight_ranges(ctes, target),
        }
    }

    pub fn build_sql(
        &self,
        ctes: &[CteEntry<T::Node>],
        target: T::Node,
        all_ctes: &[CteEntry<T::Node>],
    ) -> String {
        let Some((last, leading)) = ctes.split_last() else {
            return terminate(
                self.target_text(target, all_ctes),
                self.target_ends_in_comment(target, all_ctes),
            );
        };

        let (parts, ends_in_comment) = match self.mode {
            BuildMode::FullCte | BuildMode::ProgressiveCte => {
                let mut parts = self.with_clause(ctes);
                parts.push(self.target_text(target, all_ctes));
                (parts, self.target_ends_in_comment(target, all_ctes))
            }
            BuildMode::SingleCteInner => {
                (vec![self.inner_text(last)], self.inner_ends_in_comment(last))
            }
            BuildMode::DependenciesWithTargetInner => {
                let mut parts = self.with_clause(leading);
                parts.push(self.inner_text(last));
                (parts, self.inner_ends_in_comment(last))
            }
        };

        terminate(parts.join("\n"), ends_in_comment)
    }

    pub fn build_highlight_ranges(
        &self,
        ctes: &[CteEntry<T::Node>],
        target: T::Node,
    ) -> Vec<Span> {
        let Some((last, leading)) = ctes.split_last() else {
            return vec![self.tree.range(target)];
        };

        match self.mode {
            BuildMode::FullCte => {
                let mut spans = self.full_spans(ctes);
                if !ctes.iter().any(|entry| entry.definition == target) {
                    spans.push(self.tree.range(target));
                }
                spans
            }
            BuildMode::ProgressiveCte => self.progressive_spans(ctes),
            BuildMode::SingleCteInner => ctes.iter().map(|entry| self.inner_span(entry)).collect(),
            BuildMode::DependenciesWithTargetInner => {
                let mut spans = self.full_spans(leading);
                spans.push(self.inner_span(last));
                spans
            }
        }
    }

    /// `WITH` followed by each CTE's text, one per line, comma separated.
    fn with_clause(&self, ctes: &[CteEntry<T::Node>]) -> Vec<String> {
        let Some(first) = ctes.first() else {
            return Vec::new();
        };
        let keyword = match self.tree.parent(first.definition) {
            Some(scope) if is_recursive(self.tree, scope) => "WITH RECURSIVE",
            _ => "WITH",
        };

        let count = ctes.len();
        ctes.iter()
            .enumerate()
            .map(|(position, entry)| {
                let mut line = String::new();
                if position == 0 {
                    line.push_str(keyword);
                    line.push(' ');
                }
                line.push_str(self.tree.text(entry.definition));
                if position + 1 < count {
                    line.push(',');
                }
                line
            })
            .collect()
    }

    /// The final statement for a target: its text, or a select over it when
    /// the target is itself a CTE.
    fn target_text(&self, target: T::Node, all_ctes: &[CteEntry<T::Node>]) -> String {
        if let Some(entry) = all_ctes.iter().find(|entry| entry.definition == target) {
            return select_all_from(&entry.name);
        }
        if self.tree.kind(target) == NodeKind::NamedQueryDefinition {
            let name = self
                .tree
                .children(target)
                .first()
                .map(|node| self.tree.text(*node).to_string())
                .unwrap_or_default();
            return select_all_from(&name);
        }
        self.tree.text(target).to_string()
    }

    fn inner_text(&self, entry: &CteEntry<T::Node>) -> String {
        inner_body(self.tree, entry.definition)
            .map(|body| body.text)
            .unwrap_or_else(|| select_all_from(&entry.name))
    }

    fn target_ends_in_comment(&self, target: T::Node, all_ctes: &[CteEntry<T::Node>]) -> bool {
        let synthetic = self.tree.kind(target) == NodeKind::NamedQueryDefinition
            || all_ctes.iter().any(|entry| entry.definition == target);
        !synthetic && self.ends_in_line_comment(target, self.tree.range(target))
    }

    fn inner_ends_in_comment(&self, entry: &CteEntry<T::Node>) -> bool {
        inner_body(self.tree, entry.definition)
            .is_some_and(|body| self.ends_in_line_comment(entry.definition, body.span))
    }

    /// Whether the last non-blank token of `node` within `span` is a line
    /// comment. String literals and block comments never count.
    fn ends_in_line_comment(&self, node: T::Node, span: Span) -> bool {
        self.tree
            .descendants(node)
            .filter(|leaf| self.tree.children(*leaf).is_empty())
            .filter(|leaf| {
                let range = self.tree.range(*leaf);
                !range.is_empty() && range.start >= span.start && range.end <= span.end
            })
            .filter(|leaf| !self.tree.text(*leaf).trim().is_empty())
            .last()
            .is_some_and(|leaf| {
                self.tree.kind(leaf) == NodeKind::Whitespace
                    && !self.tree.text(leaf).starts_with("/*")
            })
    }

    fn inner_span(&self, entry: &CteEntry<T::Node>) -> Span {
        inner_body(self.tree, entry.definition)
            .map(|body| body.span)
            .unwrap_or_else(|| self.tree.range(entry.definition))
    }

    /// Full span for each CTE, with the separator comma after every one but
    /// the last in the document. The CTE defined first is widened back to the
    /// `WITH` keyword.
    ///
    /// Spans are source ranges, so "first" and "last" go by definition index,
    /// not by the emission order of `ctes`.
    fn full_spans(&self, ctes: &[CteEntry<T::Node>]) -> Vec<Span> {
        let first = ctes.iter().map(|entry| entry.index).min();
        let last = ctes.iter().map(|entry| entry.index).max();

        let mut spans = Vec::with_capacity(ctes.len() * 2);
        for entry in ctes {
            spans.push(self.definition_span(entry, Some(entry.index) == first));
            if Some(entry.index) != last {
                if let Some(comma) = separator_comma(self.tree, entry.definition) {
                    spans.push(self.tree.range(comma));
                }
            }
        }
        spans
    }

    /// The CTE with the highest index shows only its body; every other CTE is
    /// shown in full with its trailing comma. The one defined just before the
    /// focus also covers its closing `)`.
    fn progressive_spans(&self, ctes: &[CteEntry<T::Node>]) -> Vec<Span> {
        let Some(focus) = ctes.iter().map(|entry| entry.index).max() else {
            return Vec::new();
        };
        let first = ctes.iter().map(|entry| entry.index).min();
        let preceding = ctes
            .iter()
            .map(|entry| entry.index)
            .filter(|index| *index < focus)
            .max();

        let mut spans = Vec::with_capacity(ctes.len() * 2);
        for entry in ctes {
            if entry.index == focus {
                spans.push(self.inner_span(entry));
                continue;
            }

            let mut span = self.definition_span(entry, Some(entry.index) == first);
            if Some(entry.index) == preceding {
                if let Some(paren) = closing_paren(self.tree, entry.definition) {
                    span.end = span.end.max(self.tree.range(paren).end);
                }
            }
            spans.push(span);
            if let Some(comma) = separator_comma(self.tree, entry.definition) {
                spans.push(self.tree.range(comma));
            }
        }
        spans
    }

    fn definition_span(&self, entry: &CteEntry<T::Node>, first: bool) -> Span {
        let span = self.tree.range(entry.definition);
        if !first {
            return span;
        }
        self.tree
            .parent(entry.definition)
            .and_then(|scope| with_keyword(self.tree, scope))
            .map(|keyword| span.cover(self.tree.range(keyword)))
            .unwrap_or(span)
    }
}

fn select_all_from(name: &str) -> String {
    format!("SELECT * FROM {name}")
}

/// Ensures the statement ends with `;`.
///
/// After a trailing line comment the `;` goes on its own line, even when the
/// comment text itself ends with one.
fn terminate(sql: String, ends_in_line_comment: bool) -> String {
    let trimmed = sql.trim_end();
    if ends_in_line_comment {
        return format!("{trimmed}\n;");
    }
    if trimmed.ends_with(';') {
        return trimmed.to_string();
    }
    format!("{trimmed};")
}
