use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::site::forms::{Form, FormKind, RESET_AFTER};
use crate::site::phone::format_phone;

pub enum ContactFormAction {
    Cancel,
    Submit,
}

#[derive(Clone, PartialEq, Copy)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Message,
}

impl ContactField {
    fn key(&self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Message => "message",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ContactField::Name => "Name",
            ContactField::Email => "Email",
            ContactField::Phone => "Phone",
            ContactField::Message => "Message",
        }
    }
}

const FIELDS: [ContactField; 4] = [
    ContactField::Name,
    ContactField::Email,
    ContactField::Phone,
    ContactField::Message,
];

pub struct ContactFormState {
    pub form: Form,
    pub current_field: ContactField,
    pub editing: bool,
    pub status: Option<String>,
    sent_at: Option<Instant>,
}

impl ContactFormState {
    pub fn new() -> Self {
        Self {
            form: Form::new(FormKind::Contact, "Send Message"),
            current_field: ContactField::Name,
            editing: false,
            status: None,
            sent_at: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ContactField::Name => ContactField::Email,
            ContactField::Email => ContactField::Phone,
            ContactField::Phone => ContactField::Message,
            ContactField::Message => ContactField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ContactField::Name => ContactField::Message,
            ContactField::Email => ContactField::Name,
            ContactField::Phone => ContactField::Email,
            ContactField::Message => ContactField::Phone,
        };
    }

    pub fn value(&self, field: ContactField) -> &str {
        self.form.fields.get(field.key()).map(String::as_str).unwrap_or("")
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field = self.current_field;
        let mut value = self.value(field).to_string();

        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => return,
        }

        // Phone input is re-formatted on every keystroke
        if field == ContactField::Phone {
            value = format_phone(&value);
        }

        self.form.set(field.key(), value);
    }

    /// The button shows its sent state until [`RESET_AFTER`] has passed
    pub fn mark_submitted(&mut self) {
        self.sent_at = Some(Instant::now());
    }

    fn restore_button_if_due(&mut self) {
        if self.sent_at.is_some_and(|at| at.elapsed() >= RESET_AFTER) {
            self.form.button.restore();
            self.sent_at = None;
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.value(ContactField::Name).is_empty() && !self.value(ContactField::Email).is_empty()
    }
}

impl Default for ContactFormState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_contact_form<B: Backend>(f: &mut Frame<B>, state: &mut ContactFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let button_style = if state.form.button.highlighted {
        Style::default().fg(Color::White).bg(Color::Blue)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let title = Paragraph::new(Spans::from(vec![
        Span::raw("Contact Us  "),
        Span::styled(format!("[{}]", state.form.button.text), button_style),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_fields(f, state, chunks[1]);

    let help_text = if let Some(status) = &state.status {
        status.clone()
    } else if state.editing {
        "Enter - Save field | Esc - Cancel editing".to_string()
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Send | Esc - Back".to_string()
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_fields<B: Backend>(f: &mut Frame<B>, state: &ContactFormState, area: Rect) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|field| {
            let selected = *field == state.current_field;
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value = state.value(*field);

            let content = if selected && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::styled(format!("{}|", value), Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::raw(value.to_string()),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Your Details"));

    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut ContactFormState) -> Result<Option<ContactFormAction>> {
    state.restore_button_if_due();

    // Wake up periodically so the button reset gets drawn
    if !event::poll(Duration::from_millis(250))? {
        return Ok(None);
    }

    if let Event::Key(key) = event::read()? {
        state.status = None;
        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(ContactFormAction::Cancel));
                }
            }
            KeyCode::Enter => {
                state.toggle_editing();
            }
            KeyCode::Up if !state.editing => {
                state.previous_field();
            }
            KeyCode::Down if !state.editing => {
                state.next_field();
            }
            KeyCode::Char('s') if !state.editing => {
                if state.form.button.disabled {
                    return Ok(None);
                }
                if state.is_valid() {
                    return Ok(Some(ContactFormAction::Submit));
                }
                state.status = Some("Name and email are required".to_string());
            }
            _ if state.editing => {
                state.edit_current_field(key.code);
            }
            _ => {}
        }
    }

    Ok(None)
}
