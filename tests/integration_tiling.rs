use std::cell::RefCell;
use std::rc::Rc;

use ratatui::prelude::Rect;

use pane_shell::error::HookResult;
use pane_shell::pane::{Pane, PaneId, PaneRef};
use pane_shell::ui::{BasicElement, ElementRef, FocusHub};
use pane_shell::{
    Direction, Dispatcher, FocusCoordinator, NavigationFeedback, PaneManager, ShellConfig,
};

struct GridPane {
    name: String,
    root: Rc<BasicElement>,
}

impl GridPane {
    fn build(hub: &Rc<FocusHub>, name: &str) -> PaneRef {
        let root = BasicElement::container(hub);
        root.set_label(name);
        root.set_focusable(true);
        Rc::new(RefCell::new(Self {
            name: name.to_string(),
            root,
        }))
    }
}

impl Pane for GridPane {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> HookResult {
        Ok(())
    }

    fn dispose(&mut self) -> HookResult {
        Ok(())
    }

    fn set_active(&mut self, _active: bool) -> HookResult {
        Ok(())
    }

    fn root(&self) -> ElementRef {
        self.root.as_element()
    }
}

fn new_manager() -> (PaneManager, Rc<FocusHub>) {
    let hub = FocusHub::new();
    let dispatcher = Dispatcher::new();
    let coordinator = Rc::new(RefCell::new(FocusCoordinator::new(dispatcher.clone())));
    let manager = PaneManager::new(
        coordinator,
        dispatcher,
        NavigationFeedback::new(ShellConfig::default()),
    );
    (manager, hub)
}

fn assert_tiles_exactly(regions: &[(PaneId, Rect)], area: Rect) {
    let covered: u32 = regions
        .iter()
        .map(|(_, rect)| u32::from(rect.width) * u32::from(rect.height))
        .sum();
    assert_eq!(
        covered,
        u32::from(area.width) * u32::from(area.height),
        "regions must cover the canvas exactly"
    );
    for (index, (_, a)) in regions.iter().enumerate() {
        for (_, b) in regions.iter().skip(index + 1) {
            assert!(a.intersection(*b).is_empty(), "regions overlap: {a:?} {b:?}");
        }
    }
}

#[test]
fn leaf_count_matches_open_panes_across_open_close_sequences() {
    let (mut manager, hub) = new_manager();
    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d", "e"] {
        ids.push(manager.open_pane(GridPane::build(&hub, name)));
        assert_eq!(manager.layout().leaf_count(), manager.open_count());
        assert_tiles_exactly(&manager.regions(), manager.area());
    }
    for id in [ids[1], ids[3]] {
        assert!(manager.close_pane(id));
        assert_eq!(manager.layout().leaf_count(), manager.open_count());
        assert_tiles_exactly(&manager.regions(), manager.area());
    }
    manager.close_all();
    assert_eq!(manager.layout().leaf_count(), 0);
    assert!(manager.regions().is_empty());
    assert_eq!(manager.focused_pane(), None);
}

#[test]
fn end_to_end_navigate_move_close() {
    let (mut manager, hub) = new_manager();

    // One pane fills the canvas.
    let p1 = manager.open_pane(GridPane::build(&hub, "p1"));
    assert_eq!(manager.layout().leaf_count(), 1);
    assert_eq!(manager.regions(), vec![(p1, manager.area())]);

    // A second pane auto-splits and takes focus.
    let p2 = manager.open_pane(GridPane::build(&hub, "p2"));
    assert_eq!(manager.layout().leaf_count(), 2);
    assert_eq!(manager.focused_pane(), Some(p2));
    assert_tiles_exactly(&manager.regions(), manager.area());

    // Navigate left lands on the first pane.
    assert!(manager.navigate_focus(Direction::Left));
    assert_eq!(manager.focused_pane(), Some(p1));

    // Moving right swaps the two cells but keeps focus on the mover.
    let rect_of = |manager: &PaneManager, id: PaneId| {
        manager
            .regions()
            .into_iter()
            .find(|(other, _)| *other == id)
            .map(|(_, rect)| rect)
            .unwrap()
    };
    let p1_before = rect_of(&manager, p1);
    let p2_before = rect_of(&manager, p2);
    assert!(manager.move_pane(Direction::Right));
    assert_eq!(rect_of(&manager, p1), p2_before);
    assert_eq!(rect_of(&manager, p2), p1_before);
    assert_eq!(manager.focused_pane(), Some(p1));

    // Closing the unfocused pane hands the whole canvas to the survivor
    // without moving focus.
    assert!(manager.close_pane(p2));
    assert_eq!(manager.layout().leaf_count(), 1);
    assert_eq!(manager.regions(), vec![(p1, manager.area())]);
    assert_eq!(manager.focused_pane(), Some(p1));
}

#[test]
fn navigation_at_every_edge_is_a_feedback_noop() {
    let (mut manager, hub) = new_manager();
    let only = manager.open_pane(GridPane::build(&hub, "solo"));
    for direction in [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ] {
        let before = manager.regions();
        assert!(!manager.navigate_focus(direction));
        assert_eq!(manager.focused_pane(), Some(only));
        assert_eq!(manager.regions(), before);
        assert_eq!(manager.feedback_mut().take_signal(), Some(direction));
        assert_eq!(manager.feedback_mut().take_signal(), None);
    }
}

#[test]
fn move_at_edge_leaves_topology_unchanged() {
    let (mut manager, hub) = new_manager();
    manager.open_pane(GridPane::build(&hub, "left"));
    let right = manager.open_pane(GridPane::build(&hub, "right"));
    assert_eq!(manager.focused_pane(), Some(right));

    let before = manager.regions();
    assert!(!manager.move_pane(Direction::Right));
    assert_eq!(manager.regions(), before);
    assert_eq!(manager.feedback_mut().take_signal(), Some(Direction::Right));
}
