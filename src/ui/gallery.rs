use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::gallery::{Card, GalleryContainer};
use crate::observer::{self, Bounds, Viewport};
use crate::site::nav::{self, MobileMenu, Navbar};

/// Pixels per terminal row, so page geometry matches the observer's pixel margins
pub const ROW_PX: f64 = 16.0;
const CARD_ROWS: u16 = 6;
const INTRO_ROWS: u16 = 3;

pub const NAV_LINKS: [&str; 5] = ["index.html", "about.html", "projects.html", "contact.html", "#projects"];

// Terminal host for the gallery: container, page geometry and navigation chrome
pub struct GalleryState {
    cards: Vec<Card>,
    hidden: bool,
    empty_visible: bool,
    scroll_rows: usize,
    viewport_rows: u16,
    navbar: Navbar,
    menu: MobileMenu,
    menu_state: ListState,
    current_path: String,
}

pub enum GalleryAction {
    Exit,
    OpenContactForm,
    /// A menu link was chosen
    Navigate(String),
}

impl GalleryState {
    pub fn new(current_path: impl Into<String>) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0));

        Self {
            cards: Vec::new(),
            hidden: false,
            empty_visible: false,
            scroll_rows: 0,
            viewport_rows: 0,
            navbar: Navbar::new(0.0),
            menu: MobileMenu::new(),
            menu_state,
            current_path: current_path.into(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn is_empty_state_visible(&self) -> bool {
        self.empty_visible
    }

    pub fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    pub fn menu(&self) -> &MobileMenu {
        &self.menu
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.scroll_rows as f64 * ROW_PX,
            self.viewport_rows as f64 * ROW_PX,
        )
    }

    pub fn set_viewport_rows(&mut self, rows: u16) {
        self.viewport_rows = rows;
        self.scroll_rows = self.scroll_rows.min(self.max_scroll());
    }

    fn content_rows(&self) -> usize {
        Self::card_top_row(self.cards.len())
    }

    fn max_scroll(&self) -> usize {
        self.content_rows().saturating_sub(self.viewport_rows as usize)
    }

    pub fn scroll_by(&mut self, rows: i64) {
        let target = if rows < 0 {
            self.scroll_rows.saturating_sub(rows.unsigned_abs() as usize)
        } else {
            self.scroll_rows.saturating_add(rows as usize)
        };
        self.scroll_to(target);
    }

    pub fn scroll_to(&mut self, row: usize) {
        self.scroll_rows = row.min(self.max_scroll());
        self.navbar.on_scroll(self.viewport().scroll_y);
    }

    fn card_top_row(index: usize) -> usize {
        (CARD_ROWS as usize)
            .saturating_mul(index)
            .saturating_add(INTRO_ROWS as usize)
    }

    /// Scroll to an in-page anchor: `#projects` or `#<card id>`. Returns false for other links.
    pub fn jump_to_anchor(&mut self, href: &str) -> bool {
        let viewport = self.viewport();
        let target_top = self.anchor_top(href).map(|top| top - viewport.scroll_y);
        // the navbar has its own rows, so nothing is hidden under it
        match nav::anchor_scroll_target(href, target_top, viewport.scroll_y, 0.0) {
            Some(y) => {
                self.scroll_to((y.max(0.0) / ROW_PX) as usize);
                true
            }
            None => false,
        }
    }

    // Document top of an anchor target
    fn anchor_top(&self, href: &str) -> Option<f64> {
        let row = match href.strip_prefix('#')? {
            "projects" => 0,
            id => Self::card_top_row(self.cards.iter().position(|card| card.id == id)?),
        };
        Some(row as f64 * ROW_PX)
    }

    pub fn toggle_menu(&mut self) {
        self.menu.toggle();
    }

    fn next_link(&mut self) {
        let i = match self.menu_state.selected() {
            Some(i) if i + 1 < NAV_LINKS.len() => i + 1,
            _ => 0,
        };
        self.menu_state.select(Some(i));
    }

    fn previous_link(&mut self) {
        let i = match self.menu_state.selected() {
            Some(0) | None => NAV_LINKS.len() - 1,
            Some(i) => i - 1,
        };
        self.menu_state.select(Some(i));
    }

    fn selected_link(&self) -> Option<&'static str> {
        self.menu_state.selected().and_then(|i| NAV_LINKS.get(i).copied())
    }
}

impl GalleryContainer for GalleryState {
    fn clear(&mut self) {
        self.cards.clear();
        self.hidden = false;
        self.empty_visible = false;
        self.scroll_rows = 0;
    }

    fn append(&mut self, card: Card) {
        self.cards.push(card);
    }

    fn show_empty_state(&mut self) {
        self.cards.clear();
        self.hidden = true;
        self.empty_visible = true;
    }

    fn card_mut(&mut self, id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    fn card_ids(&self) -> Vec<String> {
        self.cards.iter().map(|card| card.id.clone()).collect()
    }
}

impl observer::Layout for GalleryState {
    fn bounds(&self, id: &str) -> Option<Bounds> {
        let index = self.cards.iter().position(|card| card.id == id)?;
        Some(Bounds::new(
            Self::card_top_row(index) as f64 * ROW_PX,
            CARD_ROWS as f64 * ROW_PX,
        ))
    }
}

pub fn render_gallery<B: Backend>(frame: &mut Frame<B>, state: &mut GalleryState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    state.set_viewport_rows(chunks[1].height);

    render_navbar(frame, state, chunks[0]);

    if state.hidden {
        render_empty_state(frame, state, chunks[1]);
    } else {
        render_cards(frame, state, chunks[1]);
    }

    let buttons = Paragraph::new(
        "<Up/Down> Scroll | <PgUp/PgDn> Page | <M> Menu | <C> Contact | <Q> Quit",
    )
    .block(Block::default().borders(Borders::TOP))
    .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    if state.menu.is_open() {
        render_menu(frame, state, size);
    }
}

fn render_navbar<B: Backend>(frame: &mut Frame<B>, state: &GalleryState, area: Rect) {
    let style = if state.navbar.is_scrolled() {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::White)
    };

    let page = nav::current_page(&state.current_path);
    let mut spans = vec![Span::styled(
        "Eastern Energy  ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (href, active) in nav::active_links(&state.current_path, NAV_LINKS) {
        let link_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(href, link_style));
        spans.push(Span::raw("  "));
    }

    let navbar = Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::BOTTOM).title(page))
        .style(style);
    frame.render_widget(navbar, area);
}

fn render_cards<B: Backend>(frame: &mut Frame<B>, state: &GalleryState, area: Rect) {
    let scroll = state.scroll_rows as i64;
    let bottom = area.height as i64;

    let intro_top = -scroll;
    if intro_top + INTRO_ROWS as i64 > 0 {
        if let Some(rect) = clip(area, intro_top, INTRO_ROWS) {
            let intro = Paragraph::new(vec![
                Spans::from(Span::styled("Our Projects", Style::default().add_modifier(Modifier::BOLD))),
                Spans::from("Recent installations, newest first."),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(intro, rect);
        }
    }

    for (index, card) in state.cards.iter().enumerate() {
        let top = GalleryState::card_top_row(index) as i64 - scroll;
        if top >= bottom || top + (CARD_ROWS as i64) <= 0 {
            continue;
        }
        if let Some(rect) = clip(area, top, CARD_ROWS) {
            render_card(frame, card, rect);
        }
    }
}

// Portion of a `height`-row block starting `top` rows into `area` that is on screen
fn clip(area: Rect, top: i64, height: u16) -> Option<Rect> {
    let start = top.max(0);
    let end = (top + height as i64).min(area.height as i64);
    if end <= start {
        return None;
    }
    Some(Rect::new(area.x, area.y + start as u16, area.width, (end - start) as u16))
}

fn render_card<B: Backend>(frame: &mut Frame<B>, card: &Card, area: Rect) {
    let text_style = if card.is_revealed() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let image_line = if card.image.fallback {
        Spans::from(vec![
            Span::raw("Image: "),
            Span::styled(card.image.src.as_str(), Style::default().fg(Color::Red)),
            Span::raw(" (fallback)"),
        ])
    } else {
        Spans::from(format!("Image: {}", card.image.src))
    };

    let body = Paragraph::new(vec![
        Spans::from(Span::styled(
            card.category.as_str(),
            Style::default().fg(Color::Cyan),
        )),
        Spans::from(card.description.as_str()),
        image_line,
    ])
    .block(
        Block::default()
            .title(Span::styled(card.title.as_str(), Style::default().add_modifier(Modifier::BOLD)))
            .borders(Borders::ALL),
    )
    .style(text_style)
    .wrap(Wrap { trim: true });

    frame.render_widget(body, area);
}

fn render_empty_state<B: Backend>(frame: &mut Frame<B>, state: &GalleryState, area: Rect) {
    if !state.empty_visible {
        return;
    }
    let empty = Paragraph::new(vec![
        Spans::from(""),
        Spans::from("No projects to show yet."),
        Spans::from("Check back soon for our latest work."),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(empty, area);
}

fn render_menu<B: Backend>(frame: &mut Frame<B>, state: &mut GalleryState, size: Rect) {
    let popup_area = centered_rect(40, 40, size);

    let items: Vec<ListItem> = nav::active_links(&state.current_path, NAV_LINKS)
        .into_iter()
        .map(|(href, active)| {
            let marker = if active { " *" } else { "" };
            ListItem::new(format!("{}{}", href, marker))
        })
        .collect();

    let menu = List::new(items)
        .block(Block::default().title("Menu").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(Clear, popup_area);
    frame.render_stateful_widget(menu, popup_area, &mut state.menu_state);
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn handle_input(state: &mut GalleryState) -> Result<Option<GalleryAction>> {
    // Wake up so settled scroll positions get evaluated
    if !event::poll(Duration::from_millis(100))? {
        return Ok(None);
    }

    if let Event::Key(key) = event::read()? {
        if state.menu.is_open() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('m') => state.menu.clicked(false),
                KeyCode::Down => state.next_link(),
                KeyCode::Up => state.previous_link(),
                KeyCode::Enter => {
                    state.menu.link_clicked();
                    if let Some(href) = state.selected_link() {
                        if state.jump_to_anchor(href) {
                            return Ok(None);
                        }
                        return Ok(Some(GalleryAction::Navigate(href.to_string())));
                    }
                }
                _ => {}
            }
            return Ok(None);
        }

        let page = state.viewport_rows.max(1) as i64;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(GalleryAction::Exit)),
            KeyCode::Char('m') => state.toggle_menu(),
            KeyCode::Char('c') => return Ok(Some(GalleryAction::OpenContactForm)),
            KeyCode::Down | KeyCode::Char('j') => state.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => state.scroll_by(-1),
            KeyCode::PageDown | KeyCode::Char(' ') => state.scroll_by(page),
            KeyCode::PageUp => state.scroll_by(-page),
            KeyCode::Home => state.scroll_to(0),
            _ => {}
        }
    }
    Ok(None)
}
