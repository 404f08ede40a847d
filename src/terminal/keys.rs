use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKey {
    Up,
    Down,
    Select,
    Back,
    Dismiss,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Insert(char),
    DeleteBack,
    Accept,
    Back,
    Dismiss,
    Ignore,
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'd'))
}

fn is_alt_left(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::ALT) && key.code == KeyCode::Left
}

pub fn choice_key(key: &KeyEvent, can_go_back: bool) -> ChoiceKey {
    if is_interrupt(key) {
        return ChoiceKey::Dismiss;
    }
    match key.code {
        KeyCode::Up | KeyCode::BackTab => ChoiceKey::Up,
        KeyCode::Down | KeyCode::Tab => ChoiceKey::Down,
        KeyCode::Char('k') => ChoiceKey::Up,
        KeyCode::Char('j') => ChoiceKey::Down,
        KeyCode::Enter => ChoiceKey::Select,
        KeyCode::Esc => ChoiceKey::Dismiss,
        KeyCode::Left | KeyCode::Backspace if can_go_back => ChoiceKey::Back,
        _ => ChoiceKey::Ignore,
    }
}

/// Left and Backspace only navigate back once the buffer is empty.
pub fn text_key(key: &KeyEvent, buffer_empty: bool, can_go_back: bool) -> TextKey {
    if is_interrupt(key) {
        return TextKey::Dismiss;
    }
    if can_go_back && is_alt_left(key) {
        return TextKey::Back;
    }
    match key.code {
        KeyCode::Enter => TextKey::Accept,
        KeyCode::Esc => TextKey::Dismiss,
        KeyCode::Left | KeyCode::Backspace if buffer_empty && can_go_back => TextKey::Back,
        KeyCode::Backspace => TextKey::DeleteBack,
        KeyCode::Char(ch)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            TextKey::Insert(ch)
        }
        _ => TextKey::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn choice_back_only_when_allowed() {
        assert_eq!(choice_key(&key(KeyCode::Left), true), ChoiceKey::Back);
        assert_eq!(choice_key(&key(KeyCode::Left), false), ChoiceKey::Ignore);
        assert_eq!(choice_key(&key(KeyCode::Enter), false), ChoiceKey::Select);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(choice_key(&ctrl_c, true), ChoiceKey::Dismiss);
    }

    #[test]
    fn text_backspace_edits_until_empty() {
        let backspace = key(KeyCode::Backspace);
        assert_eq!(text_key(&backspace, false, true), TextKey::DeleteBack);
        assert_eq!(text_key(&backspace, true, true), TextKey::Back);
        assert_eq!(text_key(&backspace, true, false), TextKey::DeleteBack);
        let alt_left = KeyEvent::new(KeyCode::Left, KeyModifiers::ALT);
        assert_eq!(text_key(&alt_left, false, true), TextKey::Back);
        let typed = key(KeyCode::Char('k'));
        assert_eq!(text_key(&typed, false, true), TextKey::Insert('k'));
    }
}
