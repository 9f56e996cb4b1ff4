use inksac::prelude::*;

/// Colours operator-facing diagnostics when the terminal allows it.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    pub fn highlight_error(&self, error: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) {
            return error.to_string();
        }

        let error_style = Style::builder()
            .foreground(Color::Red)
            .bold()
            .build();

        error.style(error_style).to_string()
    }

    pub fn highlight_warning(&self, warning: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) {
            return warning.to_string();
        }

        let warning_style = Style::builder()
            .foreground(Color::Yellow)
            .build();

        warning.style(warning_style).to_string()
    }
}
