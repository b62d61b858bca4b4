//! Reference collection and recursive dependency resolution.

use std::collections::HashSet;

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::tree::{NodeKind, SyntaxTree};
use crate::types::{issue_codes, CteOrdering, Issue};

use super::CteEntry;

/// Collects the text of every identifier under a FROM clause, table reference
/// or join expression inside `node`.
///
/// This is a syntactic collection, not name binding: aliases and join
/// condition columns are collected too. Callers intersect the result with the
/// CTE names in scope.
pub fn find_references<T: SyntaxTree>(tree: &T, node: T::Node) -> HashSet<String> {
    let mut refs = HashSet::new();
    let mut stack = vec![(node, false)];

    while let Some((current, in_relation)) = stack.pop() {
        let kind = tree.kind(current);
        if in_relation && kind == NodeKind::Identifier {
            refs.insert(tree.text(current).to_string());
        }

        let in_relation = in_relation || kind.is_relation_context();
        stack.extend(
            tree.children(current)
                .into_iter()
                .map(|child| (child, in_relation)),
        );
    }

    refs
}

/// Resolves the CTE names `node` depends on, directly or transitively.
///
/// `visited` is shared across the whole expansion: a name is expanded at most
/// once, so self references and cycles terminate. Each name resolves to the
/// first definition with that name in `ctes`. Expansion runs off a worklist,
/// so long dependency chains do not grow the call stack.
pub fn resolve_dependencies<T: SyntaxTree>(
    tree: &T,
    node: T::Node,
    ctes: &[CteEntry<T::Node>],
    available: &HashSet<String>,
    visited: &mut HashSet<String>,
) -> HashSet<String> {
    let mut resolved = HashSet::new();
    let mut pending = vec![node];

    while let Some(current) = pending.pop() {
        for name in find_references(tree, current) {
            if !available.contains(&name) || visited.contains(&name) {
                continue;
            }
            visited.insert(name.clone());

            #[cfg(feature = "tracing")]
            trace!(cte = %name, "expanding CTE dependency");

            if let Some(entry) = ctes.iter().find(|entry| entry.name == name) {
                pending.push(entry.definition);
            }
            resolved.insert(name);
        }
    }

    resolved
}

/// Selects the entries of `all_ctes` named in `names`.
///
/// Only the first definition of a duplicated name is kept. With
/// [`CteOrdering::DocumentOrder`] the result follows document order; with
/// [`CteOrdering::DependencyOrder`] every CTE follows the CTEs it references,
/// with document order between unrelated ones and cycles broken at the first
/// revisit.
pub fn order_required<T: SyntaxTree>(
    tree: &T,
    all_ctes: &[CteEntry<T::Node>],
    names: &HashSet<String>,
    ordering: CteOrdering,
) -> Vec<CteEntry<T::Node>> {
    let mut seen = HashSet::new();
    let selected: Vec<CteEntry<T::Node>> = all_ctes
        .iter()
        .filter(|entry| names.contains(&entry.name) && seen.insert(entry.name.as_str()))
        .cloned()
        .collect();

    match ordering {
        CteOrdering::DocumentOrder => selected,
        CteOrdering::DependencyOrder => dependency_order(tree, selected),
    }
}

fn dependency_order<T: SyntaxTree>(
    tree: &T,
    selected: Vec<CteEntry<T::Node>>,
) -> Vec<CteEntry<T::Node>> {
    let edges: Vec<Vec<usize>> = selected
        .iter()
        .map(|entry| referenced_positions(tree, entry, &selected))
        .collect();

    let mut entered = vec![false; selected.len()];
    let mut order = Vec::with_capacity(selected.len());
    for position in 0..selected.len() {
        place(position, &edges, &mut entered, &mut order);
    }

    order
        .into_iter()
        .map(|position| selected[position].clone())
        .collect()
}

/// Appends `position` to `order` after everything it depends on.
///
/// Depth-first post-order over an explicit stack; a position already entered
/// is skipped, which breaks cycles at the first revisit.
fn place(
    position: usize,
    edges: &[Vec<usize>],
    entered: &mut [bool],
    order: &mut Vec<usize>,
) {
    if entered[position] {
        return;
    }
    entered[position] = true;
    let mut stack = vec![(position, 0)];

    while let Some((current, next_edge)) = stack.pop() {
        match edges[current].get(next_edge) {
            Some(&dependency) => {
                stack.push((current, next_edge + 1));
                if !entered[dependency] {
                    entered[dependency] = true;
                    stack.push((dependency, 0));
                }
            }
            None => order.push(current),
        }
    }
}

/// Positions within `list` of the other entries `entry` references, ascending.
fn referenced_positions<T: SyntaxTree>(
    tree: &T,
    entry: &CteEntry<T::Node>,
    list: &[CteEntry<T::Node>],
) -> Vec<usize> {
    let refs = find_references(tree, entry.definition);
    list.iter()
        .enumerate()
        .filter(|(_, other)| other.name != entry.name && refs.contains(&other.name))
        .map(|(position, _)| position)
        .collect()
}

/// Warns when a CTE in `required` uses one that is emitted after it.
pub fn forward_references<T: SyntaxTree>(
    tree: &T,
    required: &[CteEntry<T::Node>],
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (position, entry) in required.iter().enumerate() {
        for later in referenced_positions(tree, entry, required) {
            if later <= position {
                continue;
            }
            issues.push(
                Issue::warning(
                    issue_codes::FORWARD_CTE_REFERENCE,
                    format!(
                        "CTE '{}' references '{}', which is defined after it",
                        entry.name, required[later].name
                    ),
                )
                .with_span(tree.range(entry.definition)),
            );
        }
    }

    issues
}
