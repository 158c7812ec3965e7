//! Navigation state: mobile menu, navbar scroll style, anchor scrolling and active links.

/// Scroll offset past which the navbar switches to its compact style
pub const NAVBAR_SCROLL_THRESHOLD: f64 = 50.0;

const DEFAULT_PAGE: &str = "index.html";

/// Mobile menu button and panel, plus the body scroll lock they control
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MobileMenu {
    open: bool,
}

impl MobileMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Body scrolling is locked while the menu is open
    pub fn body_scroll_locked(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn link_clicked(&mut self) {
        self.open = false;
    }

    /// A click landed somewhere; closes the menu unless it hit the menu or its button
    pub fn clicked(&mut self, inside_menu_or_button: bool) {
        if !inside_menu_or_button {
            self.open = false;
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Navbar {
    scrolled: bool,
}

impl Navbar {
    /// Initial state for the page's starting scroll offset
    pub fn new(scroll_y: f64) -> Self {
        let mut navbar = Self::default();
        navbar.on_scroll(scroll_y);
        navbar
    }

    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.scrolled = scroll_y > NAVBAR_SCROLL_THRESHOLD;
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }
}

/// Where to scroll for an in-page anchor, or `None` when the link should behave normally.
///
/// `target_top` is the target's viewport-relative top, `None` if no element matches.
pub fn anchor_scroll_target(
    href: &str,
    target_top: Option<f64>,
    page_offset: f64,
    navbar_height: f64,
) -> Option<f64> {
    if href == "#" || !href.starts_with('#') {
        return None;
    }
    target_top.map(|top| top + page_offset - navbar_height)
}

/// File name of the current page, `index.html` for directory paths
pub fn current_page(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => DEFAULT_PAGE,
    }
}

/// For each link href, whether it points at the current page
pub fn active_links<'a, I>(path: &str, hrefs: I) -> Vec<(&'a str, bool)>
where
    I: IntoIterator<Item = &'a str>,
{
    let page = current_page(path);
    hrefs.into_iter().map(|href| (href, href == page)).collect()
}
