use ratatui::style::{Color, Modifier, Style};
use std::env;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub playing: Color,
    pub highlight_bg: Color,
    pub is_color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            error: Color::Red,
            playing: Color::Green,
            highlight_bg: Color::DarkGray,
            is_color: true,
        }
    }
}

impl Theme {
    pub fn monochrome() -> Self {
        Self {
            accent: Color::Reset,
            muted: Color::Reset,
            error: Color::Reset,
            playing: Color::Reset,
            highlight_bg: Color::Reset,
            is_color: false,
        }
    }

    /// Honours `NO_COLOR` (no-color.org) before the configured name.
    pub fn from_config(name: Option<&str>) -> Self {
        if env::var_os("NO_COLOR").is_some() {
            return Self::monochrome();
        }

        match name {
            Some("monochrome") => Self::monochrome(),
            _ => Self::default(),
        }
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        if self.is_color {
            Style::default().fg(self.muted)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        }
    }

    pub fn error(&self) -> Style {
        if self.is_color {
            Style::default().fg(self.error)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        }
    }

    pub fn playing(&self) -> Style {
        Style::default().fg(self.playing).add_modifier(Modifier::BOLD)
    }

    /// Selected row; monochrome falls back to reverse video.
    pub fn highlight(&self) -> Style {
        if self.is_color {
            Style::default()
                .bg(self.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_colored() {
        let theme = Theme::default();
        assert!(theme.is_color);
        assert_eq!(theme.error().fg, Some(Color::Red));
    }

    #[test]
    fn monochrome_uses_modifiers_instead_of_color() {
        let theme = Theme::monochrome();
        assert!(!theme.is_color);
        assert!(theme.highlight().add_modifier.contains(Modifier::REVERSED));
        assert_eq!(theme.error().fg, None);
    }

    // NO_COLOR is process-global; reading it from parallel tests would race.
}
