use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use pane_shell::error::HookResult;
use pane_shell::modal::{Modal, ModalRef, ModalStack, OverlayHost};
use pane_shell::pane::{Pane, PaneRef};
use pane_shell::ui::{
    BasicElement, ControlState, ElementKind, ElementRef, FocusChange, FocusHub, UiElement,
};
use pane_shell::{
    theme, tracing_sub, Direction, Dispatcher, FocusCoordinator, NavigationFeedback, PaneManager,
    ShellConfig, TilingMode,
};

#[derive(Parser)]
#[command(name = "pane-shell", about = "Tiling pane shell demo")]
struct Options {
    /// Disable the edge-navigation flash.
    #[arg(long)]
    no_visual_feedback: bool,

    /// Ring the terminal bell when navigation hits the grid edge.
    #[arg(long)]
    audio_feedback: bool,

    /// Edge flash duration in milliseconds.
    #[arg(long)]
    feedback_duration_ms: Option<u64>,
}

impl Options {
    fn config(&self) -> ShellConfig {
        let mut config = ShellConfig {
            enable_visual_feedback: !self.no_visual_feedback,
            enable_audio_feedback: self.audio_feedback,
            ..ShellConfig::default()
        };
        if let Some(duration) = self.feedback_duration_ms {
            config.feedback_duration_ms = duration;
        }
        config
    }
}

fn main() -> io::Result<()> {
    let options = Options::parse();
    tracing_sub::init_default();

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &options);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

struct App {
    manager: PaneManager,
    modals: Rc<RefCell<ModalStack>>,
    dispatcher: Dispatcher,
    hub: Rc<FocusHub>,
    background_enabled: Rc<Cell<bool>>,
    next_pane: usize,
}

impl App {
    fn new(config: ShellConfig) -> Self {
        let dispatcher = Dispatcher::new();
        let hub = FocusHub::new();
        let coordinator = Rc::new(RefCell::new(FocusCoordinator::new(dispatcher.clone())));

        // Forward the hub's raw focus signals into the coordinator.
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

        let background_enabled = Rc::new(Cell::new(true));
        let overlay_host = Rc::new(DemoOverlayHost {
            background_enabled: Rc::clone(&background_enabled),
        });
        let modals = Rc::new(RefCell::new(ModalStack::new(
            overlay_host,
            Rc::clone(&coordinator),
            dispatcher.clone(),
        )));

        let feedback = NavigationFeedback::new(config);
        let manager = PaneManager::new(coordinator, dispatcher.clone(), feedback);

        let mut app = Self {
            manager,
            modals,
            dispatcher,
            hub,
            background_enabled,
            next_pane: 0,
        };
        app.open_demo_pane();
        app.open_demo_pane();
        app
    }

    fn open_demo_pane(&mut self) {
        self.next_pane += 1;
        let pane = DemoPane::build(&self.hub, self.next_pane);
        self.manager.open_pane(pane);
    }

    fn open_demo_modal(&mut self) {
        let depth = self.modals.borrow().depth() + 1;
        let modal: ModalRef = Rc::new(RefCell::new(DemoModal::new(&self.hub, depth)));
        ModalStack::show_modal(&self.modals, modal);
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if ModalStack::handle_key(&self.modals, key) {
            return false;
        }
        if !self.background_enabled.get() {
            // Background input is blocked while modals are up, except
            // the nested-modal demo key.
            if key.code == KeyCode::Char('m') {
                self.open_demo_modal();
            }
            return false;
        }
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::CONTROL) => return true,
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => self.open_demo_pane(),
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                self.manager.close_focused_pane();
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.manager.navigate_focus(Direction::Left);
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                self.manager.navigate_focus(Direction::Right);
            }
            (KeyCode::Up, KeyModifiers::NONE) => {
                self.manager.navigate_focus(Direction::Up);
            }
            (KeyCode::Down, KeyModifiers::NONE) => {
                self.manager.navigate_focus(Direction::Down);
            }
            (KeyCode::Left, KeyModifiers::SHIFT) => {
                self.manager.move_pane(Direction::Left);
            }
            (KeyCode::Right, KeyModifiers::SHIFT) => {
                self.manager.move_pane(Direction::Right);
            }
            (KeyCode::Up, KeyModifiers::SHIFT) => {
                self.manager.move_pane(Direction::Up);
            }
            (KeyCode::Down, KeyModifiers::SHIFT) => {
                self.manager.move_pane(Direction::Down);
            }
            (KeyCode::Char('t'), KeyModifiers::NONE) => {
                let next = match self.manager.mode() {
                    TilingMode::Horizontal => TilingMode::Vertical,
                    TilingMode::Vertical => TilingMode::Tabbed,
                    TilingMode::Tabbed => TilingMode::Horizontal,
                };
                self.manager.set_mode(next);
            }
            (KeyCode::Char('m'), KeyModifiers::NONE) => self.open_demo_modal(),
            (KeyCode::Char('j'), KeyModifiers::NONE) => self.bump_selection(1),
            (KeyCode::Char('k'), KeyModifiers::NONE) => self.bump_selection(-1),
            _ => {}
        }
        false
    }

    /// Move the focused element's list selection, demonstrating the
    /// control state that focus records capture and restore.
    fn bump_selection(&mut self, delta: isize) {
        let Some(element) = self.hub.focused() else {
            return;
        };
        if element.kind() != ElementKind::List {
            return;
        }
        let (selected, scroll_offset) = match element.capture_state() {
            Some(ControlState::List {
                selected,
                scroll_offset,
            }) => (selected.unwrap_or(0), scroll_offset),
            _ => (0, 0),
        };
        let selected = selected.saturating_add_signed(delta).min(DEMO_ITEMS - 1);
        element.restore_state(&ControlState::List {
            selected: Some(selected),
            scroll_offset,
        });
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, options: &Options) -> io::Result<()> {
    let mut app = App::new(options.config());
    loop {
        app.dispatcher.run_until_idle();
        for event in app.manager.take_events() {
            tracing::debug!(event = ?event, "pane event");
        }
        for event in app.modals.borrow_mut().take_events() {
            tracing::debug!(event = ?event, "modal event");
        }
        if app.manager.feedback_mut().take_bell() {
            use std::io::Write;
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }

        terminal.draw(|frame| render(frame, &mut app))?;

        if event::poll(Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(&key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }
    let status_height = 1;
    let canvas = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height.saturating_sub(status_height),
    };
    app.manager.set_area(canvas);

    let focused = app.manager.focused_pane();
    let flash = app.manager.feedback().active_flash();
    for (id, rect) in app.manager.regions() {
        if rect.width == 0 || rect.height == 0 {
            continue;
        }
        let is_focused = focused == Some(id);
        let mut border = if is_focused {
            Style::default()
                .fg(theme::pane_border_focused())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::pane_border())
        };
        if is_focused && let Some(flash) = flash {
            border = border.fg(flash.color);
        }
        let title = app
            .manager
            .pane_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());
        let block = Block::bordered().title(title).border_style(border);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        render_pane_body(frame, app, id, inner);
    }

    if app.modals.borrow().is_open() {
        render_modal(frame, app, canvas);
    }

    let status = format!(
        " arrows: focus | shift+arrows: move | ^N open | ^W close | t mode ({:?}) | m modal | j/k select | ^Q quit",
        app.manager.mode()
    );
    let status_rect = Rect {
        x: area.x,
        y: area.y + canvas.height,
        width: area.width,
        height: status_height,
    };
    frame.render_widget(
        Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM)),
        status_rect,
    );
}

fn render_pane_body(frame: &mut Frame, app: &App, id: pane_shell::PaneId, area: Rect) {
    let Some(pane) = app.manager.pane(id) else {
        return;
    };
    let root = pane.borrow().root();
    let selected = root
        .children()
        .into_iter()
        .find(|child| child.kind() == ElementKind::List)
        .and_then(|list| match list.capture_state() {
            Some(ControlState::List { selected, .. }) => selected,
            _ => None,
        })
        .unwrap_or(0);
    let mut lines = Vec::new();
    for item in 0..DEMO_ITEMS {
        let marker = if item == selected { "> " } else { "  " };
        lines.push(format!("{marker}item {item}"));
    }
    frame.render_widget(Paragraph::new(lines.join("\n")), area);
}

fn render_modal(frame: &mut Frame, app: &App, canvas: Rect) {
    let depth = app.modals.borrow().depth();
    let name = app
        .modals
        .borrow()
        .top()
        .map(|modal| modal.borrow().name().to_string())
        .unwrap_or_default();
    let width = canvas.width.saturating_sub(8).min(44).max(20);
    let height = 7;
    let rect = Rect {
        x: canvas.x + (canvas.width.saturating_sub(width)) / 2,
        y: canvas.y + (canvas.height.saturating_sub(height)) / 2,
        width: width.min(canvas.width),
        height: height.min(canvas.height),
    };
    frame.render_widget(Clear, rect);
    let block = Block::bordered()
        .title(name)
        .style(Style::default().fg(theme::modal_fg()).bg(theme::modal_bg()));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    let body = format!(
        "Modal depth: {depth}\n\nEnter accepts, Esc cancels.\n'm' nests another modal."
    );
    frame.render_widget(Paragraph::new(body), inner);
}

const DEMO_ITEMS: usize = 6;

/// Overlay chrome for the demo: the terminal renderer paints the
/// backdrop itself, so the overlay wrapper is the modal content and
/// closing needs no animation.
struct DemoOverlayHost {
    background_enabled: Rc<Cell<bool>>,
}

impl OverlayHost for DemoOverlayHost {
    fn attach_overlay(&self, content: &ElementRef) -> ElementRef {
        Rc::clone(content)
    }

    fn detach_overlay(&self, _overlay: &ElementRef) {}

    fn set_background_input_enabled(&self, enabled: bool) {
        self.background_enabled.set(enabled);
    }

    fn animate_close(&self, _overlay: &ElementRef, done: Box<dyn FnOnce()>) {
        done();
    }
}

struct DemoPane {
    name: String,
    root: Rc<BasicElement>,
}

impl DemoPane {
    fn build(hub: &Rc<FocusHub>, index: usize) -> PaneRef {
        let name = format!("pane-{index}");
        let root = BasicElement::container(hub);
        root.set_label(&name);
        root.set_focusable(true);
        let list = BasicElement::new(hub, ElementKind::List);
        list.set_state(ControlState::List {
            selected: Some(0),
            scroll_offset: 0,
        });
        BasicElement::add_child(&root, &list);
        Rc::new(RefCell::new(Self { name, root }))
    }
}

impl Pane for DemoPane {
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

struct DemoModal {
    name: String,
    root: Rc<BasicElement>,
    button: Rc<BasicElement>,
}

impl DemoModal {
    fn new(hub: &Rc<FocusHub>, depth: usize) -> Self {
        let name = format!("confirm-{depth}");
        let root = BasicElement::container(hub);
        root.set_label(&name);
        let button = BasicElement::new(hub, ElementKind::Button);
        button.set_label("ok");
        BasicElement::add_child(&root, &button);
        Self { name, root, button }
    }
}

impl Modal for DemoModal {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> ElementRef {
        self.root.as_element()
    }

    fn show(&mut self) {
        // Grab focus after the stack has saved the previous target, so
        // dismissing the dialog restores it.
        self.button.focus();
    }

    fn hide(&mut self) {}

    fn dispose(&mut self) {}

    fn on_accept(&mut self) -> bool {
        true
    }

    fn on_cancel(&mut self) -> bool {
        true
    }
}
