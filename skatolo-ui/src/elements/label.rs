//! Caption label for controllers
//!
//! Holds the text and the box size a controller reserves for it. Fonts and
//! drawing are up to the host.

/// A non-interactive caption
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Display text as set by the user
    text: String,
    /// Size [width, height]
    size: [f32; 2],
    /// Show the text in upper case
    upper_case: bool,
    /// Whether label is visible
    visible: bool,
}

impl Label {
    /// Create a new label
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: [100.0, 24.0],
            upper_case: true,
            visible: true,
        }
    }

    /// Set the label size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    /// Get the label text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set the label text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Text with casing applied
    pub fn text_formatted(&self) -> String {
        if self.upper_case {
            self.text.to_uppercase()
        } else {
            self.text.clone()
        }
    }

    pub fn to_upper_case(&mut self, upper_case: bool) {
        self.upper_case = upper_case;
    }

    pub fn is_upper_case(&self) -> bool {
        self.upper_case
    }

    /// Check if visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Get size
    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    /// Set size
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = [width, height];
    }

    pub fn width(&self) -> f32 {
        self.size[0]
    }

    pub fn height(&self) -> f32 {
        self.size[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_casing() {
        let mut label = Label::new("Presets");
        assert_eq!(label.text_formatted(), "PRESETS");
        label.to_upper_case(false);
        assert_eq!(label.text_formatted(), "Presets");
        assert_eq!(label.text(), "Presets");
    }
}
