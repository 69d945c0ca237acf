use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use inventory_ledger::{
    indexed_view, Inventory, InventoryView, Ledger, MovementKind, MovementRecord, ProductFilter,
    SessionContext,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Ledger,
    Stock,
    Products,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Ledger => Page::Stock,
            Page::Stock => Page::Products,
            Page::Products => Page::Ledger,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Ledger => Page::Products,
            Page::Stock => Page::Ledger,
            Page::Products => Page::Stock,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Ledger => "Ledger",
            Page::Stock => "Stock",
            Page::Products => "Products",
        }
    }
}

pub struct App<'a> {
    inventory: &'a Inventory,
    session: SessionContext,
    pub view: InventoryView,
    /// Ledger positions of the rows on screen, most recent first
    pub rows: Vec<usize>,
    pub state: TableState,
    pub stock_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter: ProductFilter,
    /// Last refresh failure, shown in the status bar
    pub error: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(inventory: &'a Inventory, session: SessionContext) -> Result<Self> {
        let view = inventory.refresh(&session)?;

        let mut app = Self {
            inventory,
            session,
            view,
            rows: Vec::new(),
            state: TableState::default(),
            stock_state: TableState::default(),
            current_page: Page::Ledger,
            show_detail: false,
            filter: ProductFilter::All,
            error: None,
        };
        app.rebuild_rows();
        app.clamp_stock_selection();
        Ok(app)
    }

    /// Reload from the store; failures are kept on screen, not fatal
    pub fn refresh(&mut self) {
        match self.inventory.refresh(&self.session) {
            Ok(view) => {
                self.view = view;
                self.error = None;
                self.rebuild_rows();
                self.clamp_stock_selection();
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Keep the Stock highlight inside the table after it changes size
    fn clamp_stock_selection(&mut self) {
        let len = self.view.stock.len();
        let selected = match self.stock_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.stock_state.select(selected);
    }

    fn rebuild_rows(&mut self) {
        self.rows = indexed_view(&self.view.ledger, &self.filter)
            .into_iter()
            .map(|(index, _)| index)
            .collect();

        if self.rows.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn apply_filter(&mut self, filter: ProductFilter) {
        self.filter = filter;
        self.rebuild_rows();
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(ProductFilter::All);
    }

    /// Step through ALL → first product → ... → last product → ALL
    pub fn cycle_filter(&mut self, forward: bool) {
        let products: Vec<_> = self.view.products.iter().cloned().collect();
        if products.is_empty() {
            return;
        }

        let position = match &self.filter {
            ProductFilter::All => None,
            ProductFilter::Product(name) => products.iter().position(|p| p == name),
        };

        let next = match (position, forward) {
            (None, true) => Some(0),
            (None, false) => Some(products.len() - 1),
            (Some(i), true) if i + 1 < products.len() => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        };

        let filter = match next {
            Some(i) => ProductFilter::Product(products[i].clone()),
            None => ProductFilter::All,
        };
        self.apply_filter(filter);
    }

    /// Filter the ledger by the product highlighted on the Stock page
    pub fn open_selected_stock(&mut self) {
        if let Some(stock) = self.stock_state.selected().and_then(|i| self.view.stock.get(i)) {
            let filter = ProductFilter::Product(stock.product.clone());
            self.apply_filter(filter);
            self.current_page = Page::Ledger;
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_record(&self) -> Option<(usize, &MovementRecord)> {
        let index = *self.state.selected().and_then(|i| self.rows.get(i))?;
        self.view.ledger.get(index).map(|record| (index, record))
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_len(&self) -> usize {
        match self.current_page {
            Page::Stock => self.view.stock.len(),
            _ => self.rows.len(),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Stock => &mut self.stock_state,
            _ => &mut self.state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.active_state();
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.active_len() > 0 {
            self.active_state().select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.active_len();
        if len > 0 {
            self.active_state().select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Enter if app.current_page == Page::Stock => app.open_selected_stock(),
            KeyCode::Enter => app.toggle_detail(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    app.previous_page();
                } else {
                    app.next_page();
                }
            }
            KeyCode::BackTab => app.previous_page(),
            KeyCode::Char('r') => app.refresh(),
            KeyCode::Char('f') => app.cycle_filter(true),
            KeyCode::Char('F') => app.cycle_filter(false),
            KeyCode::Char('c') => app.clear_filter(),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => app.first(),
            KeyCode::End => app.last(),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Ledger {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        render_ledger(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Ledger => render_ledger(f, chunks[1], app),
            Page::Stock => render_stock(f, chunks[1], app),
            Page::Products => render_products(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn kind_color(kind: MovementKind) -> Color {
    match kind {
        MovementKind::Entry => Color::Green,
        MovementKind::Exit => Color::Red,
        MovementKind::Registration => Color::Cyan,
    }
}

fn net_color(net: f64) -> Color {
    if net < 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Ledger, Page::Stock, Page::Products];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let totals = app.view.totals;
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Products: {}", app.view.product_count()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(format!("↑ {}", totals.inflow), Style::default().fg(Color::Green)));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(format!("↓ {}", totals.outflow), Style::default().fg(Color::Red)));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("= {}", totals.net),
        Style::default().fg(net_color(totals.net)).add_modifier(Modifier::BOLD),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["#", "Data", "Produto", "Tipo", "Quantidade", "Motivo"]);

    let ledger: &Ledger = &app.view.ledger;
    let rows = app.rows.iter().filter_map(|&index| {
        let record = ledger.get(index)?;
        let color = kind_color(record.kind);
        let wire = record.to_row();

        Some(Row::new(vec![
            Cell::from(index.to_string()),
            Cell::from(wire.data),
            Cell::from(truncate(&record.product, 28)),
            Cell::from(wire.tipo).style(Style::default().fg(color)),
            Cell::from(wire.quantidade).style(Style::default().fg(color)),
            Cell::from(truncate(&record.note, 30)),
        ]))
    });

    let totals = app.view.totals_for(&app.filter);
    let title = format!(
        " Ledger - {} (in {} | out {} | net {}) ",
        app.filter.label(),
        totals.inflow,
        totals.outflow,
        totals.net
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(17),
            Constraint::Length(30),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_stock(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Produto", "Entradas", "Saídas", "Saldo"]);

    let rows = app.view.stock.iter().map(|stock| {
        let net_style = Style::default().fg(net_color(stock.totals.net));
        let net = if stock.is_negative() {
            format!("{} ⚠", stock.totals.net)
        } else {
            stock.totals.net.to_string()
        };

        Row::new(vec![
            Cell::from(stock.product.to_string()),
            Cell::from(stock.totals.inflow.to_string()).style(Style::default().fg(Color::Green)),
            Cell::from(stock.totals.outflow.to_string()).style(Style::default().fg(Color::Red)),
            Cell::from(net).style(net_style.add_modifier(Modifier::BOLD)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Stock by Product (Enter to open ledger) "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.stock_state);
}

fn render_products(f: &mut Frame, area: Rect, app: &App) {
    let products: &BTreeSet<_> = &app.view.products;

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {} registered products", app.view.product_count()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for product in products {
        let marker = match &app.filter {
            ProductFilter::Product(name) if name == product => {
                Span::styled("  → ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            }
            _ => Span::raw("    "),
        };
        content.push(Line::from(vec![marker, Span::raw(product.to_string())]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Hint: f / F cycle the product filter, c clears it",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Products "),
    );

    f.render_widget(paragraph, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Movement Details ");

    let Some((index, record)) = app.selected_record() else {
        f.render_widget(Paragraph::new("No movement selected").block(block), area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };
    let wire = record.to_row();
    let product_net = app
        .view
        .totals_for(&ProductFilter::parse(&record.product))
        .net;

    let content = vec![
        Line::from(""),
        Line::from(vec![label("  Row: "), Span::raw(index.to_string())]),
        Line::from(""),
        Line::from(vec![label("  Date: "), Span::raw(wire.data)]),
        Line::from(""),
        Line::from(vec![label("  Product: "), Span::raw(record.product.clone())]),
        Line::from(""),
        Line::from(vec![
            label("  Type: "),
            Span::styled(wire.tipo, Style::default().fg(kind_color(record.kind))),
        ]),
        Line::from(""),
        Line::from(vec![label("  Quantity: "), Span::raw(wire.quantidade)]),
        Line::from(""),
        Line::from(vec![
            label("  Product net: "),
            Span::styled(product_net.to_string(), Style::default().fg(net_color(product_net))),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![label("  NOTE")]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&record.note, 35),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(error) = &app.error {
        status_spans.push(Span::styled(
            format!(" ❌ {} ", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw(" | "));
    } else {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected, app.rows.len()),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if let ProductFilter::Product(name) = &app.filter {
        status_spans.push(Span::styled(
            format!("Filter: {}", name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear) | "));
    }

    for (key, action, color) in [
        ("f/F", " Filter | ", Color::Yellow),
        ("r", " Refresh | ", Color::Yellow),
        ("Enter", " Details | ", Color::Yellow),
        ("Tab", " Page | ", Color::Yellow),
        ("q", " Quit", Color::Red),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(color)));
        status_spans.push(Span::raw(action));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join("\n  ")
}
