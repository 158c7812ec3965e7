//! HTML rendering of the gallery container and its cards.

use super::GalleryContainer;
use super::card::Card;

const DEFAULT_GALLERY_ID: &str = "projects-gallery";
const DEFAULT_EMPTY_ID: &str = "projects-empty";

/// Gallery container that renders to static markup
pub struct HtmlGallery {
    gallery_id: String,
    cards: Vec<Card>,
    hidden: bool,
    empty_state: Option<EmptyState>,
}

/// Optional sibling shown when there is nothing to display
pub struct EmptyState {
    pub id: String,
    pub markup: String,
    pub visible: bool,
}

impl EmptyState {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            id: DEFAULT_EMPTY_ID.to_string(),
            markup: markup.into(),
            visible: false,
        }
    }
}

impl HtmlGallery {
    pub fn new() -> Self {
        Self {
            gallery_id: DEFAULT_GALLERY_ID.to_string(),
            cards: Vec::new(),
            hidden: false,
            empty_state: None,
        }
    }

    pub fn with_empty_state(mut self, empty_state: EmptyState) -> Self {
        self.empty_state = Some(empty_state);
        self
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_empty_state_visible(&self) -> bool {
        self.empty_state.as_ref().is_some_and(|e| e.visible)
    }

    /// Markup for the gallery element followed by the empty-state element
    pub fn render(&self) -> String {
        let mut content = String::new();

        if self.hidden {
            content.push_str(&format!(
                "<div id=\"{}\" class=\"projects-gallery\" style=\"display: none;\">\n",
                escape(&self.gallery_id)
            ));
        } else {
            content.push_str(&format!(
                "<div id=\"{}\" class=\"projects-gallery\">\n",
                escape(&self.gallery_id)
            ));
        }
        for card in &self.cards {
            content.push_str(&render_card(card));
        }
        content.push_str("</div>\n");

        if let Some(empty) = &self.empty_state {
            let display = if empty.visible { "block" } else { "none" };
            content.push_str(&format!(
                "<div id=\"{}\" class=\"projects-empty\" style=\"display: {};\">\n{}\n</div>\n",
                escape(&empty.id),
                display,
                empty.markup
            ));
        }

        content
    }
}

impl Default for HtmlGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryContainer for HtmlGallery {
    fn clear(&mut self) {
        self.cards.clear();
        self.hidden = false;
        if let Some(empty) = &mut self.empty_state {
            empty.visible = false;
        }
    }

    fn append(&mut self, card: Card) {
        self.cards.push(card);
    }

    fn show_empty_state(&mut self) {
        self.cards.clear();
        self.hidden = true;
        if let Some(empty) = &mut self.empty_state {
            empty.visible = true;
        }
    }

    fn card_mut(&mut self, id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    fn card_ids(&self) -> Vec<String> {
        self.cards.iter().map(|card| card.id.clone()).collect()
    }
}

/// One card's markup
pub fn render_card(card: &Card) -> String {
    let mut content = String::new();

    content.push_str(&format!(
        "<div class=\"{}\" id=\"{}\" style=\"transition-delay: {};\">\n",
        card.classes().join(" "),
        escape(&card.id),
        card.transition_delay_css()
    ));

    content.push_str("  <div class=\"project-image\">\n");
    let image_class = card.image.classes().join(" ");
    let class_attr = if image_class.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", image_class)
    };
    let loading = if card.image.lazy { " loading=\"lazy\"" } else { "" };
    // The browser still swaps on its own if the image breaks after rendering.
    let onerror = if card.image.fallback {
        String::new()
    } else {
        format!(
            " onerror=\"this.onerror=null; this.src='{}'; this.classList.add('{}');\"",
            escape(&card.image.fallback_src),
            super::card::FALLBACK_IMAGE_CLASS
        )
    };
    content.push_str(&format!(
        "    <img src=\"{}\" alt=\"{}\"{}{}{}>\n",
        escape(&card.image.src),
        escape(&card.image.alt),
        class_attr,
        loading,
        onerror
    ));
    content.push_str(&format!(
        "    <span class=\"project-category\">{}</span>\n",
        escape(&card.category)
    ));
    content.push_str("  </div>\n");

    content.push_str("  <div class=\"project-content\">\n");
    content.push_str(&format!("    <h3>{}</h3>\n", escape(&card.title)));
    content.push_str(&format!("    <p>{}</p>\n", escape(&card.description)));
    content.push_str("  </div>\n");

    content.push_str("</div>\n");
    content
}

/// Escape text for use in element content and double- or single-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
