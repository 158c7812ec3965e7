//! Project gallery and page behaviors for the company website.
//!
//! The gallery loader fetches `data/projects.json`, orders the projects
//! newest first and renders one card per project into a
//! [`gallery::GalleryContainer`]. Cards reveal themselves through the
//! [`observer::RevealObserver`] as they scroll into view.

pub mod config;
pub mod error;
pub mod gallery;
pub mod models;
pub mod observer;
pub mod site;
pub mod source;
pub mod ui;

pub use error::{LoadError, SubmitError};
pub use gallery::{GalleryContainer, GalleryLoader, LoadOutcome};
