//! Turns per-frame visible sets into enter/leave transitions.

use std::collections::HashSet;

use crate::library::surface::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered(NodeId),
    Left(NodeId),
}

#[derive(Debug, Default, Clone)]
pub struct ViewportTracker {
    visible: HashSet<NodeId>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.visible.contains(&node)
    }

    /// Replace the visible set. Leaves are reported before entries, each
    /// group in node order.
    pub fn update(&mut self, visible: impl IntoIterator<Item = NodeId>) -> Vec<Transition> {
        let now: HashSet<NodeId> = visible.into_iter().collect();

        let mut left: Vec<NodeId> = self.visible.difference(&now).copied().collect();
        let mut entered: Vec<NodeId> = now.difference(&self.visible).copied().collect();
        left.sort();
        entered.sort();

        self.visible = now;
        left.into_iter()
            .map(Transition::Left)
            .chain(entered.into_iter().map(Transition::Entered))
            .collect()
    }

    /// Forget everything without emitting transitions.
    pub fn reset(&mut self) {
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::surface::Surface;

    fn nodes(n: usize) -> Vec<NodeId> {
        let mut s = Surface::new();
        (0..n).map(|i| s.create_group(format!("g{}", i))).collect()
    }

    #[test]
    fn only_changes_are_reported() {
        let ids = nodes(3);
        let mut tracker = ViewportTracker::new();
        assert_eq!(
            tracker.update([ids[0], ids[1]]),
            vec![Transition::Entered(ids[0]), Transition::Entered(ids[1])]
        );
        assert!(tracker.update([ids[1], ids[0]]).is_empty());
        assert_eq!(
            tracker.update([ids[1], ids[2]]),
            vec![Transition::Left(ids[0]), Transition::Entered(ids[2])]
        );
        assert!(tracker.is_visible(ids[2]));
    }

    #[test]
    fn reset_is_silent() {
        let ids = nodes(1);
        let mut tracker = ViewportTracker::new();
        tracker.update([ids[0]]);
        tracker.reset();
        assert_eq!(tracker.update([ids[0]]), vec![Transition::Entered(ids[0])]);
    }
}
