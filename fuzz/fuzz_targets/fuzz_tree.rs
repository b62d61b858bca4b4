//! Fuzz target for the lenient tree builder.
//!
//! Checks that non-empty node ranges nest inside their parents and that `node_at`
//! resolves every offset.

#![no_main]

use ctescope_core::{Dialect, SqlTree, SyntaxTree};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(sql) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tree) = SqlTree::parse(sql, Dialect::Generic) else {
        return;
    };

    for node in tree.descendants(tree.root()) {
        let range = tree.range(node);
        assert!(range.start <= range.end && range.end <= sql.len());
        if range.is_empty() {
            continue;
        }
        if let Some(parent) = tree.parent(node) {
            let outer = tree.range(parent);
            assert!(outer.start <= range.start && range.end <= outer.end);
        }
    }

    for offset in 0..=sql.len() {
        let _ = tree.node_at(offset);
    }
});
