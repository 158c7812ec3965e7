//! Project gallery: fetch the projects document, order it, render cards.
//!
//! [`GalleryLoader::load_and_render`] never fails. Transport and parse errors
//! are logged and end in the same empty state as a document with no records.

pub mod card;
pub mod html;
pub mod images;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::LoadError;
use crate::models::ProjectList;
use crate::observer::{RevealObserver, Revealed};
use crate::source::{self, ProjectSource, RetryPolicy};

pub use card::{Card, CardImage};
pub use html::{EmptyState, HtmlGallery};
pub use images::ImageResolver;

/// The element the gallery renders into
pub trait GalleryContainer {
    /// Remove every card and show the gallery again if the empty state was up
    fn clear(&mut self);

    fn append(&mut self, card: Card);

    /// Remove every card, hide the gallery and reveal the empty-state element if any
    fn show_empty_state(&mut self);

    fn card_mut(&mut self, id: &str) -> Option<&mut Card>;

    /// Ids of the rendered cards, in display order
    fn card_ids(&self) -> Vec<String>;

    /// Set a card's reveal flag. Returns true the first time only.
    fn reveal(&mut self, id: &str) -> bool {
        self.card_mut(id).is_some_and(Card::mark_revealed)
    }
}

/// What a load ended in
#[derive(Debug)]
pub enum LoadOutcome {
    /// Number of cards rendered
    Rendered(usize),
    Empty,
    /// Logged and presented as the empty state
    Failed(LoadError),
}

impl LoadOutcome {
    pub fn is_empty_state(&self) -> bool {
        !matches!(self, LoadOutcome::Rendered(_))
    }
}

pub struct GalleryLoader {
    source: Box<dyn ProjectSource>,
    policy: RetryPolicy,
    stagger: Duration,
    fallback_image: String,
    images: Option<ImageResolver>,
}

impl GalleryLoader {
    pub fn new(source: Box<dyn ProjectSource>) -> Self {
        let defaults = Config::default();
        Self {
            source,
            policy: RetryPolicy::default(),
            stagger: defaults.stagger(),
            fallback_image: defaults.fallback_image,
            images: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, LoadError> {
        let source = source::from_config(config)?;
        let mut loader = Self::new(source)
            .with_policy(RetryPolicy::from_config(config))
            .with_stagger(config.stagger())
            .with_fallback_image(config.fallback_image.clone());

        if config.check_images {
            let client = reqwest::Client::builder().timeout(config.fetch_timeout()).build()?;
            loader = loader.with_image_resolver(ImageResolver::new(client, &config.site_root));
        }

        Ok(loader)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn with_fallback_image(mut self, fallback_image: impl Into<String>) -> Self {
        self.fallback_image = fallback_image.into();
        self
    }

    pub fn with_image_resolver(mut self, images: ImageResolver) -> Self {
        self.images = Some(images);
        self
    }

    /// Fetch, sort and render the gallery into `container`, registering each card with `observer`
    pub async fn load_and_render<C>(&self, container: &mut C, observer: &mut RevealObserver) -> LoadOutcome
    where
        C: GalleryContainer + ?Sized,
    {
        let projects = match source::fetch_with_policy(self.source.as_ref(), self.policy).await {
            Ok(projects) => projects,
            Err(err) => {
                error!(location = self.source.location(), error = %err, "Error loading projects");
                release_cards(container, observer);
                container.show_empty_state();
                return LoadOutcome::Failed(err);
            }
        };

        if projects.is_empty() {
            info!(location = self.source.location(), "no projects to show");
            release_cards(container, observer);
            container.show_empty_state();
            return LoadOutcome::Empty;
        }

        let count = self.render(projects, container, observer).await;
        LoadOutcome::Rendered(count)
    }

    async fn render<C>(&self, projects: ProjectList, container: &mut C, observer: &mut RevealObserver) -> usize
    where
        C: GalleryContainer + ?Sized,
    {
        for record in projects.non_iso_dates() {
            warn!(id = %record.id, date = %record.date, "date is not ISO 8601, ordering may be wrong");
        }

        let projects = projects.sorted_newest_first();
        let count = projects.len();

        release_cards(container, observer);
        container.clear();
        for (index, record) in projects.into_iter().enumerate() {
            let mut card = Card::from_record(record, index, self.stagger, &self.fallback_image);
            if let Some(images) = &self.images {
                images.resolve(&mut card).await;
            }
            let id = card.id.clone();
            container.append(card);
            observer.observe(id);
        }

        count
    }
}

// Cards about to be removed must not keep their reveal state for the next render
fn release_cards<C>(container: &C, observer: &mut RevealObserver)
where
    C: GalleryContainer + ?Sized,
{
    for id in container.card_ids() {
        observer.forget(&id);
    }
}

/// Apply pending reveal notifications to the container. Returns how many cards changed.
pub fn apply_reveals<C>(container: &mut C, rx: &mut mpsc::UnboundedReceiver<Revealed>) -> usize
where
    C: GalleryContainer + ?Sized,
{
    let mut changed = 0;
    while let Ok(Revealed { id }) = rx.try_recv() {
        if container.reveal(&id) {
            changed += 1;
        }
    }
    changed
}
