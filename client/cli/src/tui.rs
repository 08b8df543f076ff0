use crate::api::{self, ApiClient, ApiError, GalleryApi, ImageDetail, ImagePage};
use crate::config::Config;
use crate::controller::{GalleryController, GalleryView, PendingFetch};
use crate::display;
use crate::query::FilterCriteria;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use tokio::sync::mpsc;

/// Text filter being typed into.
#[derive(Clone, Copy, PartialEq, Eq)]
enum InputTarget {
    Search,
    Category,
    Tags,
}

impl InputTarget {
    fn label(&self) -> &'static str {
        match self {
            InputTarget::Search => "search",
            InputTarget::Category => "category",
            InputTarget::Tags => "tag",
        }
    }

    fn read(&self, filters: &FilterCriteria) -> String {
        match self {
            InputTarget::Search => filters.search.clone(),
            InputTarget::Category => filters.category.clone(),
            InputTarget::Tags => filters.tags.clone(),
        }
    }

    fn write(&self, filters: &mut FilterCriteria, value: String) {
        match self {
            InputTarget::Search => filters.search = value,
            InputTarget::Category => filters.category = value,
            InputTarget::Tags => filters.tags = value,
        }
    }
}

#[derive(Clone, PartialEq)]
enum Screen {
    Browse,
    Input(InputTarget, String),
    LoadingDetail(String),
    Detail(Box<ImageDetail>),
    DetailError(String),
    Finished,
}

/// Completions coming back from spawned requests.
enum Msg {
    Listing(u64, Result<ImagePage, ApiError>),
    Detail(String, Result<ImageDetail, ApiError>),
    Options(Vec<String>, Vec<String>),
}

struct App {
    screen: Screen,
    config: Config,
    controller: GalleryController<ApiClient>,
    selected: usize,
    categories: Vec<String>,
    tags: Vec<String>,
    tx: mpsc::UnboundedSender<Msg>,
}

impl App {
    /// Run a listing request off the event loop; the result comes back as
    /// `Msg::Listing` and is applied only if still the latest.
    fn spawn_listing(&self, pending: PendingFetch) {
        let api = self.controller.api().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.list(&pending.query).await;
            let _ = tx.send(Msg::Listing(pending.seq, result));
        });
    }

    fn spawn_detail(&self, id: String) {
        let api = self.controller.api().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.detail(&id).await;
            let _ = tx.send(Msg::Detail(id, result));
        });
    }

    fn spawn_options(&self) {
        let api = self.controller.api().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (categories, tags) = api::filter_options(&api).await;
            let _ = tx.send(Msg::Options(categories, tags));
        });
    }

    fn apply_filters(&mut self, filters: FilterCriteria) {
        let pending = self.controller.request_filters(filters);
        self.selected = 0;
        self.spawn_listing(pending);
    }

    fn go_to_page(&mut self, page: u32) {
        let pending = self.controller.request_page(page);
        self.selected = 0;
        self.spawn_listing(pending);
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Listing(seq, result) => {
                self.controller.complete_fetch(seq, result);
                let len = self.controller.items().len();
                if self.selected >= len {
                    self.selected = len.saturating_sub(1);
                }
            }
            Msg::Detail(id, result) => {
                // Ignore answers for a detail the user already left.
                if self.screen != Screen::LoadingDetail(id) {
                    return;
                }
                self.screen = match result {
                    Ok(detail) => Screen::Detail(Box::new(detail)),
                    Err(e) => Screen::DetailError(e.user_message("Failed to fetch image")),
                };
            }
            Msg::Options(categories, tags) => {
                self.categories = categories;
                self.tags = tags;
            }
        }
    }

    fn on_key(&mut self, code: KeyCode) {
        match self.screen.clone() {
            Screen::Browse => self.on_browse_key(code),
            Screen::Input(target, mut buffer) => match code {
                KeyCode::Esc => self.screen = Screen::Browse,
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.screen = Screen::Input(target, buffer);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    self.screen = Screen::Input(target, buffer);
                }
                KeyCode::Enter => {
                    let mut filters = self.controller.filters().clone();
                    target.write(&mut filters, buffer.trim().to_string());
                    self.screen = Screen::Browse;
                    self.apply_filters(filters);
                }
                _ => {}
            },
            Screen::LoadingDetail(_) | Screen::Detail(_) | Screen::DetailError(_) => match code {
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                    self.screen = Screen::Browse;
                }
                KeyCode::Char('q') => self.screen = Screen::Finished,
                _ => {}
            },
            Screen::Finished => {}
        }
    }

    fn on_browse_key(&mut self, code: KeyCode) {
        let filters = self.controller.filters().clone();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::Finished,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.controller.items().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Right | KeyCode::Char('n') => {
                if let Some(pager) = self.controller.pager().filter(|p| p.next_enabled) {
                    self.go_to_page(pager.page + 1);
                }
            }
            KeyCode::Left | KeyCode::Char('p') => {
                if let Some(pager) = self.controller.pager().filter(|p| p.previous_enabled) {
                    self.go_to_page(pager.page - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(image) = self.controller.items().get(self.selected) {
                    let id = image.id.clone();
                    self.screen = Screen::LoadingDetail(id.clone());
                    self.spawn_detail(id);
                }
            }
            KeyCode::Char('/') => self.start_input(InputTarget::Search),
            KeyCode::Char('c') => self.start_input(InputTarget::Category),
            KeyCode::Char('t') => self.start_input(InputTarget::Tags),
            KeyCode::Char('f') => self.apply_filters(FilterCriteria {
                featured: filters.featured.cycle(),
                ..filters
            }),
            KeyCode::Char('s') => self.apply_filters(FilterCriteria {
                sort_by: filters.sort_by.next(),
                ..filters
            }),
            KeyCode::Char('o') => self.apply_filters(FilterCriteria {
                sort_order: filters.sort_order.toggle(),
                ..filters
            }),
            KeyCode::Char('x') => self.apply_filters(FilterCriteria::default()),
            KeyCode::Char('r') => {
                if self.controller.error().is_some() {
                    let pending = self.controller.request_retry();
                    self.spawn_listing(pending);
                }
            }
            _ => {}
        }
    }

    fn start_input(&mut self, target: InputTarget) {
        let current = target.read(self.controller.filters());
        self.screen = Screen::Input(target, current);
    }
}

pub async fn run_browser(config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App {
        screen: Screen::Browse,
        controller: GalleryController::new(client, config.page_limit),
        config,
        selected: 0,
        categories: Vec::new(),
        tags: Vec::new(),
        tx,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut rx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Msg>,
) -> anyhow::Result<()> {
    app.spawn_options();
    let initial = app.controller.begin_fetch();
    app.spawn_listing(initial);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.handle(msg);
        }

        if app.screen == Screen::Finished {
            return Ok(());
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                app.on_key(key.code);
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let area = f.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0)])
        .split(area);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("image gallery", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    match &app.screen {
        Screen::Browse | Screen::Input(_, _) => browse_lines(app, &mut lines),
        Screen::LoadingDetail(id) => {
            lines.push(Line::from(format!("loading image {}...", id)));
        }
        Screen::Detail(image) => {
            for (label, value) in display::detail_rows(image, &app.config) {
                lines.push(Line::from(format!("{:>12}: {}", label, value)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("[b] back to gallery  [q] quit"));
        }
        Screen::DetailError(e) => {
            lines.push(Line::from(format!("! {}", e)));
            lines.push(Line::from(""));
            lines.push(Line::from("[b] back to gallery  [q] quit"));
        }
        Screen::Finished => {
            lines.push(Line::from("goodbye"));
        }
    }

    let paragraph = Paragraph::new(lines);
    f.render_widget(paragraph, layout[0]);
}

fn browse_lines(app: &App, lines: &mut Vec<Line<'_>>) {
    let filters = app.controller.filters();
    lines.push(Line::from(format!(
        "search: {}  category: {}  tag: {}  featured: {}  sort: {} {}",
        or_any(&filters.search),
        or_any(&filters.category),
        or_any(&filters.tags),
        filters.featured,
        filters.sort_by.as_param(),
        filters.sort_order.as_param(),
    )));
    if !app.categories.is_empty() {
        lines.push(Line::from(format!("categories: {}", app.categories.join(", "))));
    }
    if !app.tags.is_empty() {
        lines.push(Line::from(format!("tags: {}", app.tags.join(", "))));
    }
    lines.push(Line::from(""));

    match app.controller.view() {
        GalleryView::Spinner => {
            lines.push(Line::from("loading..."));
        }
        GalleryView::Error { message } => {
            lines.push(Line::from(format!("! Error: {}", message)));
            lines.push(Line::from(""));
            lines.push(Line::from("[r] try again  [x] clear filters  [q] quit"));
        }
        GalleryView::Empty => {
            lines.push(Line::from("No images found"));
            lines.push(Line::from(""));
            lines.push(Line::from("upload one with: gallery upload <file> --title <title>"));
        }
        GalleryView::Grid {
            items,
            pager,
            stale,
        } => {
            for (i, image) in items.iter().enumerate() {
                let marker = if i == app.selected { ">" } else { " " };
                lines.push(Line::from(format!("{} {}", marker, display::card_line(image))));
            }
            lines.push(Line::from(""));
            if let Some(pager) = pager {
                let prev = if pager.previous_enabled { "[p] previous" } else { "   previous" };
                let next = if pager.next_enabled { "[n] next" } else { "   next" };
                lines.push(Line::from(format!(
                    "{}   page {} of {}   {}",
                    prev, pager.page, pager.total_pages, next
                )));
            }
            if stale {
                lines.push(Line::from("refreshing..."));
            }
        }
    }

    lines.push(Line::from(""));
    match &app.screen {
        Screen::Input(target, buffer) => {
            lines.push(Line::from(format!("> {}: {}_", target.label(), buffer)));
            lines.push(Line::from("[enter] apply  [esc] cancel"));
        }
        _ => {
            lines.push(Line::from(
                "[/] search [c] category [t] tag [f] featured [s] sort [o] order [x] clear [enter] open [q] quit",
            ));
        }
    }
}

fn or_any(value: &str) -> &str {
    if value.is_empty() {
        "any"
    } else {
        value
    }
}
