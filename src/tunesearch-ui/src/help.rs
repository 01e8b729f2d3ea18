use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::theme::Theme;

const HELP_MD: &str = include_str!("help/help.md");

/// Key reference rendered from the embedded markdown file.
#[derive(Debug, Clone)]
pub struct HelpContent {
    lines: Vec<Line<'static>>,
}

impl HelpContent {
    pub fn new(theme: &Theme) -> Self {
        Self {
            lines: HELP_MD.lines().map(|line| render_line(line, theme)).collect(),
        }
    }

    pub fn text(&self) -> Text<'static> {
        Text::from(self.lines.clone())
    }
}

fn render_line(line: &str, theme: &Theme) -> Line<'static> {
    let trimmed = line.trim();
    if let Some(title) = trimmed.strip_prefix("# ") {
        return Line::from(Span::styled(title.to_uppercase(), theme.accent()));
    }
    if let Some(section) = trimmed.strip_prefix("## ") {
        return Line::from(Span::styled(
            section.to_string(),
            Style::default().add_modifier(Modifier::UNDERLINED),
        ));
    }
    if let Some(entry) = trimmed.strip_prefix("- ") {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(key_spans(entry, theme));
        return Line::from(spans);
    }
    Line::from(trimmed.to_string())
}

/// Splits on backticks; odd segments are key names.
fn key_spans(entry: &str, theme: &Theme) -> Vec<Span<'static>> {
    entry
        .split('`')
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(idx, part)| {
            if idx % 2 == 1 {
                Span::styled(part.to_string(), theme.accent())
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn headings_and_entries_render() {
        let theme = Theme::default();
        assert_eq!(plain(&render_line("# Tunesearch", &theme)), "TUNESEARCH");
        assert_eq!(plain(&render_line("## Results", &theme)), "Results");
        assert_eq!(
            plain(&render_line("- `j` / `↓` next row", &theme)),
            "  j / ↓ next row"
        );
    }

    #[test]
    fn key_names_are_highlighted() {
        let theme = Theme::default();
        let spans = key_spans("`Space` play", &theme);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, "Space");
        assert_eq!(spans[0].style, theme.accent());
        assert_eq!(spans[1].content, " play");
    }

    #[test]
    fn embedded_help_mentions_every_mode() {
        let text: Vec<String> = HelpContent::new(&Theme::default())
            .text()
            .lines
            .iter()
            .map(plain)
            .collect();
        assert!(text.iter().any(|l| l == "Search box"));
        assert!(text.iter().any(|l| l == "Results"));
    }
}
