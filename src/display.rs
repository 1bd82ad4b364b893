//! Single-line display projection of the composer state.
//!
//! Layout, wrapping, and chrome belong to the host; this module only turns
//! the buffer into styled spans (placeholder prompt when empty, paste tokens
//! styled distinctly) and computes the cursor column for terminal-width
//! cursor placement.

use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

use crate::composer::Composer;
use crate::paste::PLACEHOLDER_PREFIX;
use crate::paste::parse_placeholder;

/// Render the composer content as one styled line. An empty buffer shows the
/// dimmed placeholder prompt instead.
pub fn display_line(composer: &Composer) -> Line<'static> {
    if composer.is_empty() && !composer.placeholder().is_empty() {
        return Line::from(Span::from(composer.placeholder().to_string()).dim());
    }
    Line::from(styled_spans(composer.text()))
}

/// Column (display cells) of the cursor within the line.
pub fn cursor_col(composer: &Composer) -> u16 {
    let width = composer.text()[..composer.cursor()].width();
    u16::try_from(width).unwrap_or(u16::MAX)
}

fn styled_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        match parse_placeholder(&rest[start..]) {
            Some((_, token_len)) => {
                if start > 0 {
                    spans.push(Span::from(rest[..start].to_string()));
                }
                spans.push(Span::from(rest[start..start + token_len].to_string()).cyan());
                rest = &rest[start + token_len..];
            }
            None => {
                let end = start + PLACEHOLDER_PREFIX.len();
                spans.push(Span::from(rest[..end].to_string()));
                rest = &rest[end..];
            }
        }
    }
    if !rest.is_empty() || spans.is_empty() {
        spans.push(Span::from(rest.to_string()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer_event::ComposerEventSender;
    use crate::decoder::InputChunk;
    use crate::paste::InMemoryPasteRegistry;
    use crate::paste::PastePolicy;
    use crate::translator::PassthroughTranslator;
    use ratatui::style::Modifier;
    use ratatui::style::Style;

    fn test_composer() -> Composer {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Composer::new(
            ComposerEventSender::new(tx),
            Box::new(InMemoryPasteRegistry::new()),
            Box::new(PassthroughTranslator),
            PastePolicy::default(),
            "Ask anything".to_string(),
        )
    }

    #[test]
    fn empty_buffer_shows_dim_placeholder() {
        let composer = test_composer();
        let line = display_line(&composer);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content.as_ref(), "Ask anything");
        assert_eq!(
            line.spans[0].style,
            Style::default().add_modifier(Modifier::DIM)
        );
    }

    #[test]
    fn paste_tokens_get_their_own_styled_span() {
        let mut composer = test_composer();
        composer.handle_chunk(&InputChunk::text("see "));
        composer.handle_chunk(&InputChunk::paste("x".repeat(600)));

        let line = display_line(&composer);
        let contents: Vec<&str> = line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(contents, vec!["see ", "[Pasted text #1 +1 lines]"]);
        assert_ne!(line.spans[1].style, Style::default());
    }

    #[test]
    fn cursor_col_counts_display_cells_not_bytes() {
        let mut composer = test_composer();
        composer.handle_chunk(&InputChunk::text("あa"));
        assert_eq!(cursor_col(&composer), 3);
        composer.handle_chunk(&InputChunk {
            left_arrow: true,
            ..InputChunk::default()
        });
        assert_eq!(cursor_col(&composer), 2);
    }
}
