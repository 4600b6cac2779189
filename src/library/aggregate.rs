//! Folder aggregates: total size and earliest modified time of the leaves
//! below each group.

use crate::library::surface::{NodeId, Surface};

/// Recompute `size` (sum) and `modified` (minimum) of every group in `groups`
/// from its descendant leaves. Groups without leaves are left untouched.
///
/// Writes go through the surface change channel, which is flushed before it
/// is disconnected so every summary reflects the final attributes.
///
/// Returns the number of groups updated.
pub fn aggregate_groups(surface: &mut Surface, groups: &[NodeId]) -> usize {
    let totals: Vec<(NodeId, u64, f64)> = groups
        .iter()
        .filter(|id| surface.get(**id).is_some_and(|n| n.is_group()))
        .filter_map(|&group| {
            let leaves = surface.descendant_leaves(group);
            if leaves.is_empty() {
                return None;
            }
            let (size, modified) = leaves.iter().fold((0u64, f64::INFINITY), |(size, modified), leaf| {
                let node = surface.node(*leaf);
                (
                    size.saturating_add(node.size.unwrap_or(0)),
                    modified.min(node.modified.unwrap_or(f64::INFINITY)),
                )
            });
            Some((group, size, modified))
        })
        .collect();

    surface.connect(totals.iter().map(|(id, _, _)| *id));
    for &(group, size, modified) in &totals {
        surface.set_size(group, size);
        if modified.is_finite() {
            surface.set_modified(group, modified);
        }
    }
    let delivered = surface.disconnect();
    tracing::debug!(groups = totals.len(), records = delivered, "folder aggregates updated");
    totals.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::format::format_size;
    use crate::model::Item;
    use std::sync::Arc;

    fn leaf(surface: &mut Surface, parent: NodeId, size: u64, modified: f64) -> NodeId {
        let item = Arc::new(Item::new("x", "x").with_size(size).with_modified(modified));
        let id = surface.create_leaf(item, "x");
        surface.append(Some(parent), id);
        id
    }

    #[test]
    fn sums_sizes_and_takes_earliest_time() {
        let mut s = Surface::new();
        let a = s.create_group("A");
        let b = s.create_group("B");
        s.append(None, a);
        s.append(Some(a), b);
        leaf(&mut s, b, 100, 1000.0);
        leaf(&mut s, b, 250, 500.0);

        let updated = aggregate_groups(&mut s, &[a, b]);
        assert_eq!(updated, 2);
        for group in [a, b] {
            assert_eq!(s.node(group).size, Some(350));
            assert_eq!(s.node(group).modified, Some(500.0));
        }
    }

    #[test]
    fn summaries_follow_final_attributes() {
        let mut s = Surface::new();
        let a = s.create_group("A");
        leaf(&mut s, a, 2048, 10.0);
        aggregate_groups(&mut s, &[a]);
        let summary = s.node(a).summary.clone().unwrap();
        assert_eq!(summary.size, format_size(2048));
        assert!(s.pending_records().is_empty());
    }

    #[test]
    fn empty_groups_are_skipped() {
        let mut s = Surface::new();
        let empty = s.create_group("empty");
        s.set_size(empty, 7);
        assert_eq!(aggregate_groups(&mut s, &[empty]), 0);
        assert_eq!(s.node(empty).size, Some(7));
        assert!(s.node(empty).summary.is_none());
    }
}
