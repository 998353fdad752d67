use std::cell::RefCell;
use std::rc::Rc;

use pane_shell::error::HookResult;
use pane_shell::pane::{Pane, PaneRef};
use pane_shell::ui::{
    BasicElement, ControlState, ElementKind, ElementRef, FocusChange, FocusHub, UiElement,
};
use pane_shell::{
    Dispatcher, FocusCoordinator, NavigationFeedback, PaneManager, ShellConfig,
};

struct ContentPane {
    name: String,
    root: Rc<BasicElement>,
}

impl ContentPane {
    /// A pane whose subtree holds one list input.
    fn with_input(hub: &Rc<FocusHub>, name: &str) -> (PaneRef, Rc<BasicElement>) {
        let root = BasicElement::container(hub);
        root.set_label(name);
        root.set_focusable(true);
        let input = BasicElement::new(hub, ElementKind::List);
        input.set_state(ControlState::List {
            selected: Some(0),
            scroll_offset: 0,
        });
        BasicElement::add_child(&root, &input);
        let pane: PaneRef = Rc::new(RefCell::new(Self {
            name: name.to_string(),
            root,
        }));
        (pane, input)
    }

    /// A pane with nothing focusable inside, root included.
    fn barren(hub: &Rc<FocusHub>, name: &str) -> PaneRef {
        let root = BasicElement::container(hub);
        root.set_label(name);
        root.set_focusable(false);
        Rc::new(RefCell::new(Self {
            name: name.to_string(),
            root,
        }))
    }
}

impl Pane for ContentPane {
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

struct Shell {
    manager: PaneManager,
    coordinator: Rc<RefCell<FocusCoordinator>>,
    dispatcher: Dispatcher,
    hub: Rc<FocusHub>,
    main_window: Rc<BasicElement>,
}

fn new_shell() -> Shell {
    let hub = FocusHub::new();
    let dispatcher = Dispatcher::new();
    let coordinator = Rc::new(RefCell::new(FocusCoordinator::new(dispatcher.clone())));
    {
        let coordinator = Rc::clone(&coordinator);
        hub.subscribe(move |element, change| match change {
            FocusChange::Gained => coordinator.borrow_mut().on_focus_gained(element),
            FocusChange::Lost => coordinator.borrow_mut().on_focus_lost(element),
        });
    }
    let main_window = BasicElement::container(&hub);
    main_window.set_label("main-window");
    main_window.set_focusable(true);
    coordinator
        .borrow_mut()
        .set_main_window(&main_window.as_element());
    let manager = PaneManager::new(
        Rc::clone(&coordinator),
        dispatcher.clone(),
        NavigationFeedback::new(ShellConfig::default()),
    );
    Shell {
        manager,
        coordinator,
        dispatcher,
        hub,
        main_window,
    }
}

fn focused_is(hub: &Rc<FocusHub>, element: &Rc<BasicElement>) -> bool {
    hub.focused()
        .is_some_and(|focused| Rc::ptr_eq(&focused, &element.as_element()))
}

#[test]
fn opening_a_pane_focuses_its_first_focusable_descendant() {
    let mut shell = new_shell();
    let (pane, input) = ContentPane::with_input(&shell.hub, "tasks");
    shell.manager.open_pane(pane);

    // Focus application is deferred to the next dispatch pass.
    assert!(shell.hub.focused().is_none());
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &input));

    // The coordinator attributed the record to the owning pane.
    let record = shell.coordinator.borrow().last_record_for("tasks");
    assert!(record.is_some_and(|record| record.pane_name() == Some("tasks")));
}

#[test]
fn switching_panes_round_trips_control_state() {
    let mut shell = new_shell();
    let (first, first_input) = ContentPane::with_input(&shell.hub, "tasks");
    let (second, second_input) = ContentPane::with_input(&shell.hub, "notes");

    let first_id = shell.manager.open_pane(first);
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &first_input));

    // The user changes the selection while the pane holds focus.
    first_input.set_state(ControlState::List {
        selected: Some(3),
        scroll_offset: 1,
    });

    shell.manager.open_pane(second);
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &second_input));

    // Coming back restores both focus and the captured input state.
    first_input.set_state(ControlState::List {
        selected: Some(0),
        scroll_offset: 0,
    });
    shell.manager.focus_pane(first_id);
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &first_input));
    assert_eq!(
        first_input.capture_state(),
        Some(ControlState::List {
            selected: Some(3),
            scroll_offset: 1,
        })
    );
}

#[test]
fn restoration_with_zero_history_falls_back_to_main_window() {
    let mut shell = new_shell();
    let pane = ContentPane::barren(&shell.hub, "empty");
    shell.manager.open_pane(pane);
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &shell.main_window));
}

#[test]
fn restoration_waits_for_the_subtree_to_load() {
    let mut shell = new_shell();
    let (pane, input) = ContentPane::with_input(&shell.hub, "slow");
    input.set_loaded(false);

    shell.manager.open_pane(pane);
    shell.dispatcher.run_until_idle();
    // The candidate exists but is not ready; nothing is focused yet and
    // nothing panicked.
    assert!(shell.hub.focused().is_none());

    // The ready signal re-enters the whole restoration.
    input.set_loaded(true);
    shell.dispatcher.run_until_idle();
    assert!(focused_is(&shell.hub, &input));
}

#[test]
fn deferred_restoration_is_abandoned_when_the_pane_closes_first() {
    let mut shell = new_shell();
    let (pane, input) = ContentPane::with_input(&shell.hub, "gone");
    input.set_loaded(false);

    let id = shell.manager.open_pane(pane);
    shell.dispatcher.run_until_idle();
    assert!(shell.hub.focused().is_none());

    assert!(shell.manager.close_pane(id));
    input.set_loaded(true);
    shell.dispatcher.run_until_idle();
    // The weak pane handle resolved to nothing; the retry dissolved.
    assert!(shell.hub.focused().is_none());
}

#[test]
fn shared_name_history_survives_until_the_last_instance_closes() {
    let shell = new_shell();
    let (first, first_input) = ContentPane::with_input(&shell.hub, "twin");
    let (second, _second_input) = ContentPane::with_input(&shell.hub, "twin");

    shell.coordinator.borrow_mut().track_pane(&first);
    shell.coordinator.borrow_mut().track_pane(&second);
    assert!(first_input.focus());
    assert!(shell.coordinator.borrow().last_record_for("twin").is_some());

    shell.coordinator.borrow_mut().untrack_pane(&first);
    assert_eq!(shell.coordinator.borrow().tracked_instances("twin"), 1);
    assert!(shell.coordinator.borrow().last_record_for("twin").is_some());

    shell.coordinator.borrow_mut().untrack_pane(&second);
    assert_eq!(shell.coordinator.borrow().tracked_instances("twin"), 0);
    assert!(shell.coordinator.borrow().last_record_for("twin").is_none());
}
