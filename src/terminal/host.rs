use super::frame::{self, Frame, Status, TextScreen, Tone};
use super::keys::{self, ChoiceKey, TextKey};
use crate::core::error::HostError;
use crate::core::host::{ChoiceOutcome, ChoiceView, Host, TextEvent, TextStatus, TextView};
use async_trait::async_trait;
use crossterm::cursor::{Hide, MoveToColumn, MoveToPreviousLine, MoveUp, Show};
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate};
use crossterm::{execute, queue};
use futures::StreamExt;
use std::io::{self, Stderr, Write};
use tracing::debug;

/// Inline prompt surface drawn on stderr so stdout stays free for results.
pub struct TerminalHost {
    out: Stderr,
    events: EventStream,
    width: u16,
    /// Rows between the top of the drawn block and the cursor.
    cursor_row: u16,
    drawn: bool,
    text: Option<TextScreen>,
}

enum Input {
    Key(KeyEvent),
    Redraw,
}

impl TerminalHost {
    pub fn new() -> io::Result<Self> {
        let (width, _) = terminal::size()?;
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: io::stderr(),
            events: EventStream::new(),
            width,
            cursor_row: 0,
            drawn: false,
            text: None,
        })
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate, Hide)?;
        self.queue_rewind()?;
        let width = self.width.saturating_sub(1) as usize;
        for (row, line) in frame.lines.iter().enumerate() {
            if row > 0 {
                queue!(self.out, Print("\r\n"))?;
            }
            let mut used = 0usize;
            for span in line {
                let clipped = frame::clip_to_width(&span.text, width.saturating_sub(used));
                if clipped.is_empty() {
                    continue;
                }
                used += unicode_width::UnicodeWidthStr::width(clipped.as_str());
                self.queue_span(&clipped, span.tone)?;
            }
        }

        let last = frame.height().saturating_sub(1);
        self.cursor_row = last;
        if let Some(caret) = frame.caret {
            let up = last.saturating_sub(caret.row);
            if up > 0 {
                queue!(self.out, MoveUp(up))?;
            }
            queue!(
                self.out,
                MoveToColumn(caret.col.min(self.width.saturating_sub(1))),
                Show
            )?;
            self.cursor_row = caret.row.min(last);
        }
        self.drawn = true;
        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()
    }

    fn queue_rewind(&mut self) -> io::Result<()> {
        if self.drawn && self.cursor_row > 0 {
            queue!(self.out, MoveToPreviousLine(self.cursor_row))?;
        } else {
            queue!(self.out, MoveToColumn(0))?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown))
    }

    fn queue_span(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        match tone {
            Tone::Plain => queue!(self.out, Print(text)),
            Tone::Title => queue!(
                self.out,
                SetAttribute(Attribute::Bold),
                Print(text),
                SetAttribute(Attribute::NormalIntensity)
            ),
            Tone::Hint => queue!(
                self.out,
                SetForegroundColor(Color::DarkGrey),
                Print(text),
                ResetColor
            ),
            Tone::Active => queue!(
                self.out,
                SetForegroundColor(Color::Cyan),
                Print(text),
                ResetColor
            ),
            Tone::Error => queue!(
                self.out,
                SetForegroundColor(Color::Red),
                Print(text),
                ResetColor
            ),
            Tone::Busy => queue!(
                self.out,
                SetForegroundColor(Color::Yellow),
                Print(text),
                ResetColor
            ),
        }
    }

    fn erase(&mut self) -> io::Result<()> {
        if !self.drawn {
            return Ok(());
        }
        self.queue_rewind()?;
        self.drawn = false;
        self.cursor_row = 0;
        queue!(self.out, Hide)?;
        self.out.flush()
    }

    fn redraw_text(&mut self) -> Result<(), HostError> {
        let frame = match &self.text {
            Some(screen) => frame::text_frame(screen),
            None => return Ok(()),
        };
        self.draw(&frame)?;
        Ok(())
    }

    async fn next_input(&mut self) -> Result<Input, HostError> {
        loop {
            match self.events.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    return Ok(Input::Key(key));
                }
                Some(Ok(Event::Resize(width, _))) => {
                    self.width = width;
                    return Ok(Input::Redraw);
                }
                Some(Ok(_)) => continue,
                Some(Err(error)) => return Err(error.into()),
                None => return Err(HostError::Unavailable("terminal input closed".to_string())),
            }
        }
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        let _ = self.erase();
        let _ = execute!(self.out, Show);
        if let Err(error) = terminal::disable_raw_mode() {
            debug!(%error, "failed to leave raw mode");
        }
    }
}

#[async_trait]
impl Host for TerminalHost {
    async fn present_choice(&mut self, view: &ChoiceView<'_>) -> Result<ChoiceOutcome, HostError> {
        let len = view.items.len();
        if len == 0 {
            return Err(HostError::Unavailable("no items to choose from".to_string()));
        }
        let mut cursor = view.active.unwrap_or(0).min(len - 1);
        loop {
            self.draw(&frame::choice_frame(view, cursor))?;
            let key = match self.next_input().await? {
                Input::Key(key) => key,
                Input::Redraw => continue,
            };
            let outcome = match keys::choice_key(&key, view.can_go_back) {
                ChoiceKey::Up => {
                    cursor = cursor.checked_sub(1).unwrap_or(len - 1);
                    continue;
                }
                ChoiceKey::Down => {
                    cursor = (cursor + 1) % len;
                    continue;
                }
                ChoiceKey::Ignore => continue,
                ChoiceKey::Select => ChoiceOutcome::Picked(cursor),
                ChoiceKey::Back => ChoiceOutcome::Back,
                ChoiceKey::Dismiss => ChoiceOutcome::Dismissed,
            };
            self.erase()?;
            return Ok(outcome);
        }
    }

    async fn open_text_input(&mut self, view: &TextView<'_>) -> Result<(), HostError> {
        self.text = Some(TextScreen {
            title: view.title.to_string(),
            indicator: view.indicator,
            prompt: view.prompt.map(str::to_string),
            value: view.value.to_string(),
            can_go_back: view.can_go_back,
            status: Status::Clear,
        });
        self.redraw_text()
    }

    async fn next_text_event(&mut self) -> Result<TextEvent, HostError> {
        loop {
            let (empty, can_go_back) = match &self.text {
                Some(screen) => (screen.value.is_empty(), screen.can_go_back),
                None => return Err(HostError::Unavailable("no text prompt is open".to_string())),
            };
            let key = match self.next_input().await? {
                Input::Key(key) => key,
                Input::Redraw => {
                    self.redraw_text()?;
                    continue;
                }
            };
            let Some(screen) = self.text.as_mut() else {
                continue;
            };
            let event = match keys::text_key(&key, empty, can_go_back) {
                TextKey::Insert(ch) => {
                    screen.value.push(ch);
                    TextEvent::Changed(screen.value.clone())
                }
                TextKey::DeleteBack => {
                    if screen.value.pop().is_none() {
                        continue;
                    }
                    TextEvent::Changed(screen.value.clone())
                }
                TextKey::Accept => TextEvent::Accept(screen.value.clone()),
                TextKey::Back => TextEvent::Back,
                TextKey::Dismiss => TextEvent::Dismissed,
                TextKey::Ignore => continue,
            };
            if matches!(event, TextEvent::Changed(_)) {
                self.redraw_text()?;
            }
            return Ok(event);
        }
    }

    async fn show_validation(&mut self, status: TextStatus<'_>) -> Result<(), HostError> {
        if let Some(screen) = self.text.as_mut() {
            screen.status = status.into();
        }
        self.redraw_text()
    }

    async fn close_text_input(&mut self) -> Result<(), HostError> {
        self.text = None;
        self.erase()?;
        Ok(())
    }
}
