//! Dependency analysis: from a cursor offset to the CTEs a query needs.
//!
//! The analyzer works against any [`SyntaxTree`]. It locates the `WITH` clause
//! nearest to the cursor, lists the CTEs it defines, picks the query under the
//! cursor and resolves the transitive closure of CTE names that query uses.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::error::NotApplicable;
use crate::tree::SyntaxTree;
use crate::types::{issue_codes, CteOrdering, Issue};

mod dependencies;
mod scope;

pub use dependencies::{find_references, forward_references, order_required, resolve_dependencies};
pub use scope::{enumerate_ctes, locate_scope, locate_target_query};

/// A CTE definition inside a `WITH` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteEntry<N> {
    /// Literal text of the defining identifier, quotes included.
    pub name: String,
    /// The named-query-definition node.
    pub definition: N,
    /// Zero-based position among the scope's CTEs, in document order.
    pub index: usize,
}

/// Result of analyzing one cursor position.
///
/// A single-use view over the tree it was computed from.
#[derive(Debug, Clone)]
pub struct ScopeAnalysis<N> {
    /// Every CTE in the scope, in document order.
    pub all_ctes: Vec<CteEntry<N>>,
    /// CTEs the target depends on, in the requested emission order.
    pub required_ctes: Vec<CteEntry<N>>,
    /// The query (or CTE definition) the cursor resolved to.
    pub target_query: N,
    /// The `WITH` clause node.
    pub scope_node: N,
    /// Duplicate-name and forward-reference warnings.
    pub issues: Vec<Issue>,
}

impl<N: Copy + PartialEq> ScopeAnalysis<N> {
    /// The CTE whose definition is the target, if the target is a CTE.
    pub fn target_cte(&self) -> Option<&CteEntry<N>> {
        self.all_ctes
            .iter()
            .find(|entry| entry.definition == self.target_query)
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.required_ctes
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }
}

/// Knobs for [`analyze_scope_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub ordering: CteOrdering,
}

/// Analyzes `caret` with document-order emission.
pub fn analyze_scope<T: SyntaxTree>(
    tree: &T,
    caret: usize,
) -> Result<ScopeAnalysis<T::Node>, NotApplicable> {
    analyze_scope_with_options(tree, caret, &AnalysisOptions::default())
}

pub fn analyze_scope_with_options<T: SyntaxTree>(
    tree: &T,
    caret: usize,
    options: &AnalysisOptions,
) -> Result<ScopeAnalysis<T::Node>, NotApplicable> {
    let scope_node = locate_scope(tree, caret)?;
    let all_ctes = enumerate_ctes(tree, scope_node)?;
    let target_query = locate_target_query(tree, caret, scope_node);

    let available: HashSet<String> = all_ctes.iter().map(|entry| entry.name.clone()).collect();
    let mut visited = HashSet::new();
    let names = resolve_dependencies(tree, target_query, &all_ctes, &available, &mut visited);
    let required_ctes = order_required(tree, &all_ctes, &names, options.ordering);

    let mut issues = duplicate_names(tree, &all_ctes);
    if options.ordering == CteOrdering::DocumentOrder {
        issues.extend(forward_references(tree, &required_ctes));
    }

    #[cfg(feature = "tracing")]
    debug!(
        caret,
        cte_count = all_ctes.len(),
        required = required_ctes.len(),
        issues = issues.len(),
        "analyzed CTE scope"
    );

    Ok(ScopeAnalysis {
        all_ctes,
        required_ctes,
        target_query,
        scope_node,
        issues,
    })
}

/// Warns about every definition whose name was already used in the scope.
fn duplicate_names<T: SyntaxTree>(tree: &T, all_ctes: &[CteEntry<T::Node>]) -> Vec<Issue> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut issues = Vec::new();

    for entry in all_ctes {
        match first_seen.get(entry.name.as_str()) {
            Some(first) => issues.push(
                Issue::warning(
                    issue_codes::DUPLICATE_CTE_NAME,
                    format!(
                        "CTE '{}' is defined more than once; references resolve to definition #{}",
                        entry.name,
                        first + 1
                    ),
                )
                .with_span(tree.range(entry.definition)),
            ),
            None => {
                first_seen.insert(&entry.name, entry.index);
            }
        }
    }

    issues
}
