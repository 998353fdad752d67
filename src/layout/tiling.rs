use ratatui::layout::Direction as Axis;
use ratatui::prelude::Rect;

use super::Direction;

/// Default split strategy applied to future insertions. Changing the
/// mode never rearranges existing geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TilingMode {
    #[default]
    Horizontal,
    Vertical,
    Tabbed,
}

/// Explicit placement for directional inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone)]
pub enum LayoutNode<Id: Copy + Eq> {
    Leaf(Id),
    Split {
        axis: Axis,
        children: Vec<LayoutNode<Id>>,
        weights: Vec<f32>,
    },
    /// A tab group: all children occupy the node's rect, only the active
    /// one is visible.
    Tabbed {
        children: Vec<LayoutNode<Id>>,
        active: usize,
    },
}

impl<Id: Copy + Eq> LayoutNode<Id> {
    pub fn leaf(id: Id) -> Self {
        Self::Leaf(id)
    }

    pub fn unwrap_leaf(&self) -> Option<Id> {
        match self {
            LayoutNode::Leaf(id) => Some(*id),
            _ => None,
        }
    }

    pub fn contains(&self, id: Id) -> bool {
        match self {
            LayoutNode::Leaf(current) => *current == id,
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                children.iter().any(|child| child.contains(id))
            }
        }
    }

    /// All leaf ids, visible or not, depth-first.
    pub fn leaves(&self) -> Vec<Id> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<Id>) {
        match self {
            LayoutNode::Leaf(id) => out.push(*id),
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            LayoutNode::Leaf(_) => 1,
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                children.iter().map(LayoutNode::leaf_count).sum()
            }
        }
    }

    /// Compute the visible regions of the subtree. Hidden tab members
    /// produce no region; the returned rects tile `area` exactly.
    pub fn layout(&self, area: Rect) -> Vec<(Id, Rect)> {
        let mut out = Vec::new();
        self.layout_recursive(area, &mut out);
        out
    }

    fn layout_recursive(&self, area: Rect, out: &mut Vec<(Id, Rect)>) {
        match self {
            LayoutNode::Leaf(id) => out.push((*id, area)),
            LayoutNode::Split {
                axis,
                children,
                weights,
            } => {
                let rects = split_rects_weighted(*axis, area, weights, children.len());
                for (child, rect) in children.iter().zip(rects) {
                    child.layout_recursive(rect, out);
                }
            }
            LayoutNode::Tabbed { children, active } => {
                if let Some(child) = children.get(*active) {
                    child.layout_recursive(area, out);
                }
            }
        }
    }

    /// Replace the `target` leaf with a two-way split placing `insert`
    /// on the requested side. Returns false when `target` is not in the
    /// subtree.
    pub fn insert_leaf(&mut self, target: Id, insert: Id, position: InsertPosition) -> bool {
        match self {
            LayoutNode::Leaf(current) => {
                if *current != target {
                    return false;
                }
                let (axis, children) = match position {
                    InsertPosition::Left => (
                        Axis::Horizontal,
                        vec![LayoutNode::leaf(insert), LayoutNode::leaf(*current)],
                    ),
                    InsertPosition::Right => (
                        Axis::Horizontal,
                        vec![LayoutNode::leaf(*current), LayoutNode::leaf(insert)],
                    ),
                    InsertPosition::Top => (
                        Axis::Vertical,
                        vec![LayoutNode::leaf(insert), LayoutNode::leaf(*current)],
                    ),
                    InsertPosition::Bottom => (
                        Axis::Vertical,
                        vec![LayoutNode::leaf(*current), LayoutNode::leaf(insert)],
                    ),
                };
                *self = LayoutNode::Split {
                    axis,
                    children,
                    weights: vec![1.0, 1.0],
                };
                true
            }
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                for child in children.iter_mut() {
                    if child.insert_leaf(target, insert, position) {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Add `insert` to the tab group holding `target`, creating the
    /// group when `target` is a plain leaf. The new tab becomes active.
    pub fn insert_tab(&mut self, target: Id, insert: Id) -> bool {
        match self {
            LayoutNode::Leaf(current) => {
                if *current != target {
                    return false;
                }
                *self = LayoutNode::Tabbed {
                    children: vec![LayoutNode::leaf(*current), LayoutNode::leaf(insert)],
                    active: 1,
                };
                true
            }
            LayoutNode::Tabbed { children, active } => {
                if children
                    .iter()
                    .any(|child| child.unwrap_leaf() == Some(target))
                {
                    children.push(LayoutNode::leaf(insert));
                    *active = children.len() - 1;
                    return true;
                }
                for child in children.iter_mut() {
                    if child.insert_tab(target, insert) {
                        return true;
                    }
                }
                false
            }
            LayoutNode::Split { children, .. } => {
                for child in children.iter_mut() {
                    if child.insert_tab(target, insert) {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Remove the leaf holding `id`. Freed space is absorbed by the
    /// remaining siblings; splits and tab groups left with a single
    /// child collapse into it.
    pub fn remove_leaf(&mut self, id: Id) -> bool {
        let removed = match self {
            LayoutNode::Leaf(_) => false,
            LayoutNode::Split {
                children, weights, ..
            } => {
                let mut removed = false;
                let mut index = 0;
                while index < children.len() {
                    if children[index].unwrap_leaf() == Some(id) {
                        children.remove(index);
                        if index < weights.len() {
                            weights.remove(index);
                        }
                        removed = true;
                        break;
                    }
                    if children[index].remove_leaf(id) {
                        removed = true;
                        if children[index].is_childless() {
                            children.remove(index);
                            if index < weights.len() {
                                weights.remove(index);
                            }
                        }
                        break;
                    }
                    index += 1;
                }
                removed
            }
            LayoutNode::Tabbed { children, active } => {
                let mut removed = false;
                let mut index = 0;
                while index < children.len() {
                    if children[index].unwrap_leaf() == Some(id) {
                        children.remove(index);
                        removed = true;
                        break;
                    }
                    if children[index].remove_leaf(id) {
                        removed = true;
                        if children[index].is_childless() {
                            children.remove(index);
                        } else {
                            index = usize::MAX; // inner removal; keep active as is
                        }
                        break;
                    }
                    index += 1;
                }
                if removed && index != usize::MAX {
                    // Removing a tab at or before the active one shifts
                    // activation onto its predecessor.
                    if index <= *active {
                        *active = active.saturating_sub(1);
                    }
                    if *active >= children.len() {
                        *active = children.len().saturating_sub(1);
                    }
                }
                removed
            }
        };
        if removed {
            self.collapse_single_child();
        }
        removed
    }

    fn is_childless(&self) -> bool {
        match self {
            LayoutNode::Leaf(_) => false,
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                children.is_empty()
            }
        }
    }

    fn collapse_single_child(&mut self) {
        let only = match self {
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. }
                if children.len() == 1 =>
            {
                Some(children.remove(0))
            }
            _ => None,
        };
        if let Some(only) = only {
            *self = only;
        }
    }

    /// Path of child indices from this node to the leaf holding `id`.
    fn path_to_leaf(&self, id: Id, path: &mut Vec<usize>) -> bool {
        match self {
            LayoutNode::Leaf(current) => *current == id,
            LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                for (index, child) in children.iter().enumerate() {
                    path.push(index);
                    if child.path_to_leaf(id, path) {
                        return true;
                    }
                    path.pop();
                }
                false
            }
        }
    }

    fn leaf_id_mut(&mut self, path: &[usize]) -> Option<&mut Id> {
        let mut current = self;
        for &index in path {
            current = match current {
                LayoutNode::Split { children, .. } | LayoutNode::Tabbed { children, .. } => {
                    children.get_mut(index)?
                }
                LayoutNode::Leaf(_) => return None,
            };
        }
        match current {
            LayoutNode::Leaf(id) => Some(id),
            _ => None,
        }
    }

    /// Activate every tab group along the path to `id`, making the leaf
    /// visible. No-op for leaves outside any tab group.
    pub fn reveal_leaf(&mut self, id: Id) -> bool {
        match self {
            LayoutNode::Leaf(current) => *current == id,
            LayoutNode::Split { children, .. } => {
                children.iter_mut().any(|child| child.reveal_leaf(id))
            }
            LayoutNode::Tabbed { children, active } => {
                for (index, child) in children.iter_mut().enumerate() {
                    if child.reveal_leaf(id) {
                        *active = index;
                        return true;
                    }
                }
                false
            }
        }
    }
}

/// The spatial layout engine: a partition tree of visible cells that
/// auto-tiles on insertion and removal, answers directional neighbor
/// queries, and swaps cell assignments.
#[derive(Debug, Clone)]
pub struct TilingLayout<Id: Copy + Eq> {
    root: Option<LayoutNode<Id>>,
    mode: TilingMode,
}

impl<Id: Copy + Eq> Default for TilingLayout<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq> TilingLayout<Id> {
    pub fn new() -> Self {
        Self {
            root: None,
            mode: TilingMode::default(),
        }
    }

    pub fn with_mode(mode: TilingMode) -> Self {
        Self { root: None, mode }
    }

    pub fn mode(&self) -> TilingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TilingMode) {
        self.mode = mode;
    }

    pub fn root(&self) -> Option<&LayoutNode<Id>> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.as_ref().map_or(0, LayoutNode::leaf_count)
    }

    pub fn leaves(&self) -> Vec<Id> {
        self.root.as_ref().map_or_else(Vec::new, LayoutNode::leaves)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.root.as_ref().is_some_and(|root| root.contains(id))
    }

    /// Insert a new cell by splitting the `target` leaf (or the whole
    /// canvas when there is no target) according to the current mode.
    /// Always succeeds.
    pub fn insert(&mut self, id: Id, target: Option<Id>) {
        let Some(root) = self.root.as_mut() else {
            self.root = Some(LayoutNode::leaf(id));
            return;
        };
        match self.mode {
            TilingMode::Tabbed => {
                if let Some(target) = target
                    && root.insert_tab(target, id)
                {
                    return;
                }
                self.root = Some(match self.root.take() {
                    Some(LayoutNode::Tabbed {
                        mut children,
                        active: _,
                    }) => {
                        children.push(LayoutNode::leaf(id));
                        let active = children.len() - 1;
                        LayoutNode::Tabbed { children, active }
                    }
                    Some(other) => LayoutNode::Tabbed {
                        children: vec![other, LayoutNode::leaf(id)],
                        active: 1,
                    },
                    None => LayoutNode::leaf(id),
                });
            }
            TilingMode::Horizontal | TilingMode::Vertical => {
                let position = match self.mode {
                    TilingMode::Horizontal => InsertPosition::Right,
                    _ => InsertPosition::Bottom,
                };
                if let Some(target) = target
                    && root.insert_leaf(target, id, position)
                {
                    return;
                }
                self.split_root(id, position);
            }
        }
    }

    /// Insert next to a specific leaf on an explicit side.
    pub fn insert_at(&mut self, target: Id, id: Id, position: InsertPosition) -> bool {
        match self.root.as_mut() {
            Some(root) => root.insert_leaf(target, id, position),
            None => {
                self.root = Some(LayoutNode::leaf(id));
                true
            }
        }
    }

    /// Split the whole canvas, placing the new cell on the given side of
    /// everything currently open.
    pub fn split_root(&mut self, id: Id, position: InsertPosition) {
        let Some(old) = self.root.take() else {
            self.root = Some(LayoutNode::leaf(id));
            return;
        };
        let (axis, children) = match position {
            InsertPosition::Left => (Axis::Horizontal, vec![LayoutNode::leaf(id), old]),
            InsertPosition::Right => (Axis::Horizontal, vec![old, LayoutNode::leaf(id)]),
            InsertPosition::Top => (Axis::Vertical, vec![LayoutNode::leaf(id), old]),
            InsertPosition::Bottom => (Axis::Vertical, vec![old, LayoutNode::leaf(id)]),
        };
        self.root = Some(LayoutNode::Split {
            axis,
            children,
            weights: vec![1.0, 1.0],
        });
    }

    /// Remove a cell; the remaining siblings absorb its space. Removing
    /// the last cell empties the canvas.
    pub fn remove(&mut self, id: Id) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        if root.unwrap_leaf() == Some(id) {
            self.root = None;
            return true;
        }
        root.remove_leaf(id)
    }

    /// Exchange the positions of two cells without touching the rest of
    /// the tree.
    pub fn swap(&mut self, a: Id, b: Id) -> bool {
        if a == b {
            return self.contains(a);
        }
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let mut path_a = Vec::new();
        let mut path_b = Vec::new();
        if !root.path_to_leaf(a, &mut path_a) || !root.path_to_leaf(b, &mut path_b) {
            return false;
        }
        if let Some(slot) = root.leaf_id_mut(&path_a) {
            *slot = b;
        }
        if let Some(slot) = root.leaf_id_mut(&path_b) {
            *slot = a;
        }
        true
    }

    /// Make a hidden tab member visible by activating its tab group(s).
    pub fn reveal(&mut self, id: Id) -> bool {
        self.root
            .as_mut()
            .is_some_and(|root| root.reveal_leaf(id))
    }

    /// Visible regions tiling `area`.
    pub fn regions(&self, area: Rect) -> Vec<(Id, Rect)> {
        self.root
            .as_ref()
            .map_or_else(Vec::new, |root| root.layout(area))
    }

    /// Nearest visible neighbor of `id` in the given compass direction,
    /// or `None` at the edge of the grid. Hidden tab members are neither
    /// origins nor candidates.
    pub fn find_in_direction(&self, id: Id, direction: Direction, area: Rect) -> Option<Id> {
        let regions = self.regions(area);
        let (_, current) = regions.iter().find(|(other, _)| *other == id)?;
        let current = *current;
        let mut best: Option<(Id, (u32, u32))> = None;
        for &(other, rect) in &regions {
            if other == id || !direction.is_beyond(current, rect) {
                continue;
            }
            let key = direction.distance_key(current, rect);
            if best.is_none_or(|(_, best_key)| key < best_key) {
                best = Some((other, key));
            }
        }
        best.map(|(id, _)| id)
    }
}

fn split_rects_weighted(axis: Axis, area: Rect, weights: &[f32], child_count: usize) -> Vec<Rect> {
    let count = child_count.max(1);
    let weights = if weights.len() == child_count {
        weights.to_vec()
    } else {
        vec![1.0; child_count]
    };
    let total_weight: f32 = weights.iter().sum::<f32>().max(1.0);
    let total = match axis {
        Axis::Horizontal => area.width,
        Axis::Vertical => area.height,
    };
    let mut sizes = Vec::with_capacity(count);
    let mut used: u16 = 0;
    for (index, weight) in weights.iter().enumerate() {
        let size = if index + 1 == count {
            total.saturating_sub(used)
        } else {
            let portion = ((*weight / total_weight) * f32::from(total)).floor() as u16;
            used = used.saturating_add(portion);
            portion
        };
        sizes.push(size);
    }
    build_rects_from_sizes(axis, area, &sizes)
}

fn build_rects_from_sizes(axis: Axis, area: Rect, sizes: &[u16]) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(sizes.len());
    let mut cursor_x = area.x;
    let mut cursor_y = area.y;
    for size in sizes {
        let rect = match axis {
            Axis::Horizontal => {
                let rect = Rect {
                    x: cursor_x,
                    y: area.y,
                    width: *size,
                    height: area.height,
                };
                cursor_x = cursor_x.saturating_add(*size);
                rect
            }
            Axis::Vertical => {
                let rect = Rect {
                    x: area.x,
                    y: cursor_y,
                    width: area.width,
                    height: *size,
                };
                cursor_y = cursor_y.saturating_add(*size);
                rect
            }
        };
        rects.push(rect);
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 24,
        }
    }

    fn tiles_exactly(regions: &[(u32, Rect)], area: Rect) {
        let total: u32 = regions
            .iter()
            .map(|(_, rect)| u32::from(rect.width) * u32::from(rect.height))
            .sum();
        assert_eq!(total, u32::from(area.width) * u32::from(area.height));
        for (index, (_, a)) in regions.iter().enumerate() {
            for (_, b) in regions.iter().skip(index + 1) {
                assert!(
                    a.intersection(*b).is_empty(),
                    "regions overlap: {a:?} {b:?}"
                );
            }
        }
    }

    #[test]
    fn insert_splits_target_and_remove_collapses() {
        let mut layout: TilingLayout<u32> = TilingLayout::new();
        layout.insert(1, None);
        assert_eq!(layout.leaf_count(), 1);
        layout.insert(2, Some(1));
        assert_eq!(layout.leaf_count(), 2);
        tiles_exactly(&layout.regions(area()), area());

        assert!(layout.remove(2));
        assert_eq!(layout.leaf_count(), 1);
        // Sole survivor absorbs the full canvas.
        assert_eq!(layout.regions(area()), vec![(1, area())]);

        assert!(layout.remove(1));
        assert!(layout.is_empty());
        assert!(layout.regions(area()).is_empty());
    }

    #[test]
    fn nested_splits_tile_without_gaps() {
        let mut layout: TilingLayout<u32> = TilingLayout::new();
        layout.insert(1, None);
        layout.insert(2, Some(1));
        layout.set_mode(TilingMode::Vertical);
        layout.insert(3, Some(2));
        layout.set_mode(TilingMode::Horizontal);
        layout.insert(4, Some(1));
        assert_eq!(layout.leaf_count(), 4);
        tiles_exactly(&layout.regions(area()), area());

        assert!(layout.remove(3));
        tiles_exactly(&layout.regions(area()), area());
        assert_eq!(layout.leaf_count(), 3);
    }

    #[test]
    fn directional_query_finds_nearest_in_row() {
        let mut layout: TilingLayout<u32> = TilingLayout::new();
        layout.insert(1, None);
        layout.insert(2, Some(1));
        layout.set_mode(TilingMode::Vertical);
        layout.insert(3, Some(2));
        // 1 | (2 over 3)
        assert_eq!(layout.find_in_direction(1, Direction::Right, area()), Some(2));
        assert_eq!(layout.find_in_direction(2, Direction::Left, area()), Some(1));
        assert_eq!(layout.find_in_direction(2, Direction::Down, area()), Some(3));
        assert_eq!(layout.find_in_direction(3, Direction::Up, area()), Some(2));
        // Edge queries return none.
        assert_eq!(layout.find_in_direction(1, Direction::Left, area()), None);
        assert_eq!(layout.find_in_direction(1, Direction::Up, area()), None);
        assert_eq!(layout.find_in_direction(3, Direction::Down, area()), None);
    }

    #[test]
    fn swap_exchanges_geometry_only() {
        let mut layout: TilingLayout<u32> = TilingLayout::new();
        layout.insert(1, None);
        layout.insert(2, Some(1));
        let before = layout.regions(area());
        assert!(layout.swap(1, 2));
        let after = layout.regions(area());
        let rect_of = |regions: &[(u32, Rect)], id: u32| {
            regions.iter().find(|(other, _)| *other == id).unwrap().1
        };
        assert_eq!(rect_of(&before, 1), rect_of(&after, 2));
        assert_eq!(rect_of(&before, 2), rect_of(&after, 1));
        // Unknown ids refuse to swap.
        assert!(!layout.swap(1, 99));
    }

    #[test]
    fn tabbed_insert_shows_only_active() {
        let mut layout: TilingLayout<u32> = TilingLayout::with_mode(TilingMode::Tabbed);
        layout.insert(1, None);
        layout.insert(2, Some(1));
        layout.insert(3, Some(1));
        assert_eq!(layout.leaf_count(), 3);
        let regions = layout.regions(area());
        assert_eq!(regions, vec![(3, area())]);

        // Revealing an earlier tab swaps visibility.
        assert!(layout.reveal(1));
        assert_eq!(layout.regions(area()), vec![(1, area())]);

        // Removing the active tab activates its predecessor.
        assert!(layout.reveal(3));
        assert!(layout.remove(3));
        assert_eq!(layout.regions(area()), vec![(2, area())]);
        assert_eq!(layout.leaf_count(), 2);
    }

    #[test]
    fn mode_change_does_not_rearrange_existing_cells() {
        let mut layout: TilingLayout<u32> = TilingLayout::new();
        layout.insert(1, None);
        layout.insert(2, Some(1));
        let before = layout.regions(area());
        layout.set_mode(TilingMode::Vertical);
        assert_eq!(layout.regions(area()), before);
    }

    #[test]
    fn weighted_split_covers_full_axis() {
        let rects = split_rects_weighted(
            Axis::Horizontal,
            Rect {
                x: 0,
                y: 0,
                width: 11,
                height: 1,
            },
            &[1.0, 1.0],
            2,
        );
        assert_eq!(rects[0].width + rects[1].width, 11);
        assert_eq!(rects[1].x, rects[0].width);
    }
}
