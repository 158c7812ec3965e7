//! Page-level interactions around the gallery.

pub mod debounce;
pub mod forms;
pub mod nav;
pub mod phone;
pub mod upload;

pub use debounce::Debouncer;
pub use forms::{Form, FormHandler, FormKind, FormSubmission, SmtpRelay, SubmissionRelay};
pub use nav::{MobileMenu, Navbar};
pub use phone::format_phone;
