use crate::core::host::{ChoiceView, TextStatus};
use crate::core::prompt::StepIndicator;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Title,
    Hint,
    Active,
    Error,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

impl Span {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

pub type Line = Vec<Span>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub row: u16,
    pub col: u16,
}

/// One redraw of the prompt block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Line>,
    pub caret: Option<Caret>,
}

impl Frame {
    pub fn height(&self) -> u16 {
        self.lines.len().min(u16::MAX as usize) as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Clear,
    Pending,
    Error(String),
}

impl From<TextStatus<'_>> for Status {
    fn from(status: TextStatus<'_>) -> Self {
        match status {
            TextStatus::Clear => Self::Clear,
            TextStatus::Pending => Self::Pending,
            TextStatus::Error(message) => Self::Error(message.to_string()),
        }
    }
}

/// Owned state of the open text prompt.
#[derive(Debug, Clone)]
pub struct TextScreen {
    pub title: String,
    pub indicator: StepIndicator,
    pub prompt: Option<String>,
    pub value: String,
    pub can_go_back: bool,
    pub status: Status,
}

fn title_line(title: &str, indicator: StepIndicator) -> Line {
    vec![
        Span::new(title, Tone::Title),
        Span::new(format!(" ({indicator})"), Tone::Hint),
    ]
}

fn footer(select: &str, can_go_back: bool) -> Line {
    let mut hint = format!("enter {select} · esc cancel");
    if can_go_back {
        hint.push_str(" · ← back");
    }
    vec![Span::new(hint, Tone::Hint)]
}

pub fn choice_frame(view: &ChoiceView<'_>, cursor: usize) -> Frame {
    let mut lines = vec![title_line(view.title, view.indicator)];
    if let Some(placeholder) = view.placeholder {
        lines.push(vec![Span::new(placeholder, Tone::Hint)]);
    }
    for (index, item) in view.items.iter().enumerate() {
        let focused = index == cursor;
        let (marker, tone) = if focused {
            ("❯ ", Tone::Active)
        } else {
            ("  ", Tone::Plain)
        };
        let mut line = vec![Span::new(format!("{marker}{}", item.label), tone)];
        if let Some(description) = &item.description {
            line.push(Span::new(format!("  {description}"), Tone::Hint));
        }
        lines.push(line);
    }
    lines.push(footer("select · ↑/↓ move", view.can_go_back));
    Frame { lines, caret: None }
}

pub fn text_frame(screen: &TextScreen) -> Frame {
    let mut lines = vec![title_line(&screen.title, screen.indicator)];
    if let Some(prompt) = &screen.prompt {
        lines.push(vec![Span::new(prompt.as_str(), Tone::Hint)]);
    }

    let input_row = lines.len();
    lines.push(vec![
        Span::new("❯ ", Tone::Active),
        Span::new(screen.value.as_str(), Tone::Plain),
    ]);
    match &screen.status {
        Status::Clear => {}
        Status::Pending => lines.push(vec![Span::new("… validating", Tone::Busy)]),
        Status::Error(message) => lines.push(vec![Span::new(format!("✖ {message}"), Tone::Error)]),
    }
    lines.push(footer("accept", screen.can_go_back));

    let col = UnicodeWidthStr::width("❯ ") + UnicodeWidthStr::width(screen.value.as_str());
    Frame {
        lines,
        caret: Some(Caret {
            row: input_row as u16,
            col: col.min(u16::MAX as usize) as u16,
        }),
    }
}

pub fn clip_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut used = 0usize;
    let mut out = String::new();
    for ch in text.chars().filter(|ch| !matches!(ch, '\n' | '\r')) {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used.saturating_add(ch_width) > max_width {
            break;
        }
        out.push(ch);
        used = used.saturating_add(ch_width);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::QuickPickItem;

    fn text(line: &Line) -> String {
        line.iter().map(|span| span.text.as_str()).collect()
    }

    #[test]
    fn choice_frame_marks_cursor_and_back_hint() {
        let items = QuickPickItem::from_labels(["helm", "kustomize"]);
        let view = ChoiceView {
            title: "Draft Create Command",
            indicator: StepIndicator::new(5, 5),
            placeholder: Some("Pick a deployment type"),
            items: &items,
            active: None,
            can_go_back: true,
        };

        let frame = choice_frame(&view, 1);

        assert_eq!(text(&frame.lines[0]), "Draft Create Command (5/5)");
        assert_eq!(text(&frame.lines[2]), "  helm");
        assert_eq!(text(&frame.lines[3]), "❯ kustomize");
        assert_eq!(frame.lines[3][0].tone, Tone::Active);
        assert!(text(frame.lines.last().expect("footer")).ends_with("← back"));
    }

    #[test]
    fn text_frame_places_caret_after_value() {
        let screen = TextScreen {
            title: "Draft Create Command".into(),
            indicator: StepIndicator::new(3, 5),
            prompt: Some("Port Number".into()),
            value: "80".into(),
            can_go_back: false,
            status: Status::Error("Port must be a number between 1 and 65535".into()),
        };

        let frame = text_frame(&screen);

        assert_eq!(frame.caret, Some(Caret { row: 2, col: 4 }));
        assert_eq!(frame.lines[3][0].tone, Tone::Error);
        assert!(!text(frame.lines.last().expect("footer")).contains("back"));
    }

    #[test]
    fn clip_respects_wide_chars() {
        assert_eq!(clip_to_width("日本語", 5), "日本");
        assert_eq!(clip_to_width("abc\r\n", 10), "abc");
        assert_eq!(clip_to_width("abc", 0), "");
    }
}
