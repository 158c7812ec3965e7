use std::time::Duration;

use crate::models::ProjectRecord;

pub const CARD_CLASS: &str = "project-card";
pub const REVEAL_CLASS: &str = "reveal";
pub const REVEALED_CLASS: &str = "revealed";
pub const FALLBACK_IMAGE_CLASS: &str = "fallback-image";

/// The image slot of a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub src: String,
    pub alt: String,
    /// Substituted when `src` fails; also set on `src` once it is in use
    pub fallback_src: String,
    pub fallback: bool,
    pub lazy: bool,
}

impl CardImage {
    /// Swap to the fallback image. Returns false if already swapped.
    pub fn use_fallback(&mut self) -> bool {
        if self.fallback {
            return false;
        }
        self.src = self.fallback_src.clone();
        self.fallback = true;
        true
    }

    pub fn classes(&self) -> Vec<&'static str> {
        if self.fallback {
            vec![FALLBACK_IMAGE_CLASS]
        } else {
            Vec::new()
        }
    }
}

/// Rendered unit for one project record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: CardImage,
    /// Position in the gallery times the stagger increment
    pub transition_delay: Duration,
    revealed: bool,
}

impl Card {
    pub fn from_record(
        record: ProjectRecord,
        index: usize,
        stagger: Duration,
        fallback_image: &str,
    ) -> Self {
        let mut image = CardImage {
            src: record.image.clone().unwrap_or_default(),
            alt: record.title.clone(),
            fallback_src: fallback_image.to_string(),
            fallback: false,
            lazy: true,
        };
        if image.src.trim().is_empty() {
            image.use_fallback();
        }

        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            category: record.category,
            image,
            transition_delay: stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX)),
            revealed: false,
        }
    }

    /// CSS transition delay, e.g. `0.3s`
    pub fn transition_delay_css(&self) -> String {
        format!("{}s", self.transition_delay.as_secs_f64())
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Set the reveal flag. Returns true only the first time.
    pub fn mark_revealed(&mut self) -> bool {
        let first = !self.revealed;
        self.revealed = true;
        first
    }

    pub fn use_fallback_image(&mut self) -> bool {
        self.image.use_fallback()
    }

    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec![CARD_CLASS, REVEAL_CLASS];
        if self.revealed {
            classes.push(REVEALED_CLASS);
        }
        classes
    }
}
