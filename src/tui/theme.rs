use crate::render::{SpanStyle, StyledLine, Tone};
use ratatui::{
    style::{palette::tailwind, Color, Modifier, Style},
    text::{Line, Span},
};

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Blue => tailwind::BLUE.c400,
        Tone::Cyan => tailwind::CYAN.c400,
        Tone::Indigo => tailwind::INDIGO.c400,
        Tone::Purple => tailwind::PURPLE.c400,
        Tone::Green => tailwind::GREEN.c400,
        Tone::Emerald => tailwind::EMERALD.c400,
        Tone::Pink => tailwind::PINK.c400,
        Tone::Teal => tailwind::TEAL.c400,
        Tone::Yellow => tailwind::YELLOW.c400,
        Tone::Orange => tailwind::ORANGE.c400,
        Tone::Rose => tailwind::ROSE.c400,
        Tone::Red => tailwind::RED.c400,
        Tone::Lime => tailwind::LIME.c400,
        Tone::Amber => tailwind::AMBER.c400,
        Tone::Fuchsia => tailwind::FUCHSIA.c400,
        Tone::Sky => tailwind::SKY.c400,
        Tone::Gray => tailwind::GRAY.c400,
    }
}

pub fn span_style(style: SpanStyle) -> Style {
    let base = Style::default();
    match style {
        SpanStyle::Plain => base,
        SpanStyle::Title => base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        SpanStyle::Heading => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        SpanStyle::Label => base.fg(Color::Magenta).add_modifier(Modifier::BOLD),
        SpanStyle::Muted => base.fg(Color::DarkGray),
        SpanStyle::Strong => base.add_modifier(Modifier::BOLD),
        SpanStyle::Emphasis => base.add_modifier(Modifier::ITALIC),
        SpanStyle::Strike => base.add_modifier(Modifier::CROSSED_OUT),
        SpanStyle::Code => base.fg(Color::Green),
        SpanStyle::Link => base.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        SpanStyle::Error => base.fg(Color::Red),
        SpanStyle::Accent(tone) => base.fg(tone_color(tone)).add_modifier(Modifier::BOLD),
    }
}

pub fn to_line(line: &StyledLine) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|s| Span::styled(s.text.clone(), span_style(s.style)))
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_uses_tone_color() {
        let line = StyledLine::styled("📘 ISTJ", SpanStyle::Accent(Tone::Blue));
        let converted = to_line(&line);
        assert_eq!(converted.spans.len(), 1);
        assert_eq!(converted.spans[0].style.fg, Some(tailwind::BLUE.c400));
    }
}
