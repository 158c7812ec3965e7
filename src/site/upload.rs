/// Label shown in a file upload box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadLabel {
    /// The box's own prompt, as authored in the page
    Original(String),
    Selected { name: String, detail: String },
}

/// Label for the current selection; `None` restores the original prompt
pub fn upload_label(original: &str, selected: Option<(&str, u64)>) -> UploadLabel {
    match selected {
        Some((name, size)) => UploadLabel::Selected {
            name: name.to_string(),
            detail: format!("{:.2} MB - Click to change", size as f64 / 1024.0 / 1024.0),
        },
        None => UploadLabel::Original(original.to_string()),
    }
}

/// Whether a file is being dragged over the box
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropZone {
    highlighted: bool,
}

impl DropZone {
    pub fn drag_over(&mut self) {
        self.highlighted = true;
    }

    pub fn drag_leave(&mut self) {
        self.highlighted = false;
    }

    pub fn drop_files(&mut self) {
        self.highlighted = false;
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}
