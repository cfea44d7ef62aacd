//! Key mapping for terminal input
//!
//! Converts crossterm events into device key codes, and defines the closed
//! set of symbolic keys those codes decode to. Device codes use the curses
//! numbering so that `KEY_DOWN` is `0o402` and `KEY_F0 + n` is function key n.

use bitflags::bitflags;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::RawInput;

pub const KEY_DOWN: u16 = 0o402;
pub const KEY_UP: u16 = 0o403;
pub const KEY_LEFT: u16 = 0o404;
pub const KEY_RIGHT: u16 = 0o405;
pub const KEY_HOME: u16 = 0o406;
pub const KEY_BACKSPACE: u16 = 0o407;
pub const KEY_F0: u16 = 0o410;
pub const KEY_DC: u16 = 0o512;
pub const KEY_IC: u16 = 0o513;
pub const KEY_NPAGE: u16 = 0o522;
pub const KEY_PPAGE: u16 = 0o523;
pub const KEY_BTAB: u16 = 0o541;
pub const KEY_END: u16 = 0o550;
pub const KEY_SDC: u16 = 0o577;
pub const KEY_SEND: u16 = 0o602;
pub const KEY_SHOME: u16 = 0o607;
pub const KEY_SIC: u16 = 0o610;
pub const KEY_SLEFT: u16 = 0o611;
pub const KEY_SRIGHT: u16 = 0o622;
pub const KEY_MOUSE: u16 = 0o631;
pub const KEY_RESIZE: u16 = 0o632;
pub const KEY_EVENT: u16 = 0o633;

/// Highest function key number with a device code
pub const MAX_FUNCTION_KEY: u8 = 12;

/// Symbolic keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Break,
    SReset,
    Reset,
    Down,
    Up,
    Left,
    Right,
    Home,
    Backspace,
    /// Function key F0..=F12
    F(u8),
    Dl,
    Il,
    Dc,
    Ic,
    Eic,
    Clear,
    Eos,
    Eol,
    Sf,
    Sr,
    NPage,
    PPage,
    STab,
    CTab,
    CATab,
    Enter,
    Print,
    Ll,
    A1,
    A3,
    B2,
    C1,
    C3,
    BTab,
    Beg,
    Cancel,
    Close,
    Command,
    Copy,
    Create,
    End,
    Exit,
    Find,
    Help,
    Mark,
    Message,
    Move,
    Next,
    Open,
    Options,
    Previous,
    Redo,
    Reference,
    Refresh,
    Replace,
    Restart,
    Resume,
    Save,
    SBeg,
    SCancel,
    SCommand,
    SCopy,
    SCreate,
    SDc,
    SDl,
    Select,
    SEnd,
    SEol,
    SExit,
    SFind,
    SHelp,
    SHome,
    SIc,
    SLeft,
    SMessage,
    SMove,
    SNext,
    SOptions,
    SPrevious,
    SPrint,
    SRedo,
    SReplace,
    SRight,
    SResume,
    SSave,
    SSuspend,
    SUndo,
    Suspend,
    Undo,
    /// A mouse event occurred
    Mouse,
    /// The terminal was resized
    Resize,
    /// Interrupted by some other event
    Event,
}

/// Device code → key, function keys excluded (see [`key_table`])
const KEY_TABLE: &[(u16, Key)] = &[
    (0o401, Key::Break),
    (KEY_DOWN, Key::Down),
    (KEY_UP, Key::Up),
    (KEY_LEFT, Key::Left),
    (KEY_RIGHT, Key::Right),
    (KEY_HOME, Key::Home),
    (KEY_BACKSPACE, Key::Backspace),
    (0o510, Key::Dl),
    (0o511, Key::Il),
    (KEY_DC, Key::Dc),
    (KEY_IC, Key::Ic),
    (0o514, Key::Eic),
    (0o515, Key::Clear),
    (0o516, Key::Eos),
    (0o517, Key::Eol),
    (0o520, Key::Sf),
    (0o521, Key::Sr),
    (KEY_NPAGE, Key::NPage),
    (KEY_PPAGE, Key::PPage),
    (0o524, Key::STab),
    (0o525, Key::CTab),
    (0o526, Key::CATab),
    (0o527, Key::Enter),
    (0o530, Key::SReset),
    (0o531, Key::Reset),
    (0o532, Key::Print),
    (0o533, Key::Ll),
    (0o534, Key::A1),
    (0o535, Key::A3),
    (0o536, Key::B2),
    (0o537, Key::C1),
    (0o540, Key::C3),
    (KEY_BTAB, Key::BTab),
    (0o542, Key::Beg),
    (0o543, Key::Cancel),
    (0o544, Key::Close),
    (0o545, Key::Command),
    (0o546, Key::Copy),
    (0o547, Key::Create),
    (KEY_END, Key::End),
    (0o551, Key::Exit),
    (0o552, Key::Find),
    (0o553, Key::Help),
    (0o554, Key::Mark),
    (0o555, Key::Message),
    (0o556, Key::Move),
    (0o557, Key::Next),
    (0o560, Key::Open),
    (0o561, Key::Options),
    (0o562, Key::Previous),
    (0o563, Key::Redo),
    (0o564, Key::Reference),
    (0o565, Key::Refresh),
    (0o566, Key::Replace),
    (0o567, Key::Restart),
    (0o570, Key::Resume),
    (0o571, Key::Save),
    (0o572, Key::SBeg),
    (0o573, Key::SCancel),
    (0o574, Key::SCommand),
    (0o575, Key::SCopy),
    (0o576, Key::SCreate),
    (KEY_SDC, Key::SDc),
    (0o600, Key::SDl),
    (0o601, Key::Select),
    (KEY_SEND, Key::SEnd),
    (0o603, Key::SEol),
    (0o604, Key::SExit),
    (0o605, Key::SFind),
    (0o606, Key::SHelp),
    (KEY_SHOME, Key::SHome),
    (KEY_SIC, Key::SIc),
    (KEY_SLEFT, Key::SLeft),
    (0o612, Key::SMessage),
    (0o613, Key::SMove),
    (0o614, Key::SNext),
    (0o615, Key::SOptions),
    (0o616, Key::SPrevious),
    (0o617, Key::SPrint),
    (0o620, Key::SRedo),
    (0o621, Key::SReplace),
    (KEY_SRIGHT, Key::SRight),
    (0o623, Key::SResume),
    (0o624, Key::SSave),
    (0o625, Key::SSuspend),
    (0o626, Key::SUndo),
    (0o627, Key::Suspend),
    (0o630, Key::Undo),
    (KEY_MOUSE, Key::Mouse),
    (KEY_RESIZE, Key::Resize),
    (KEY_EVENT, Key::Event),
];

/// Every (device code, key) pair, function keys included
pub fn key_table() -> impl Iterator<Item = (u16, Key)> {
    KEY_TABLE
        .iter()
        .copied()
        .chain((0..=MAX_FUNCTION_KEY).map(|n| (KEY_F0 + n as u16, Key::F(n))))
}

/// Codes a crossterm-driven terminal can produce
pub const SUPPORTED_CODES: &[u16] = &[
    KEY_DOWN,
    KEY_UP,
    KEY_LEFT,
    KEY_RIGHT,
    KEY_HOME,
    KEY_BACKSPACE,
    KEY_F0 + 1,
    KEY_F0 + 2,
    KEY_F0 + 3,
    KEY_F0 + 4,
    KEY_F0 + 5,
    KEY_F0 + 6,
    KEY_F0 + 7,
    KEY_F0 + 8,
    KEY_F0 + 9,
    KEY_F0 + 10,
    KEY_F0 + 11,
    KEY_F0 + 12,
    KEY_DC,
    KEY_IC,
    KEY_NPAGE,
    KEY_PPAGE,
    KEY_BTAB,
    KEY_END,
    KEY_SDC,
    KEY_SEND,
    KEY_SHOME,
    KEY_SIC,
    KEY_SLEFT,
    KEY_SRIGHT,
    KEY_MOUSE,
    KEY_RESIZE,
    KEY_EVENT,
];

/// A key as handed to the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Key(Key),
    /// A device code with no symbolic key
    Code(u16),
}

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        result
    }
}

/// Key mapper for converting crossterm events to device input
pub struct KeyMapper;

impl KeyMapper {
    /// Map any terminal event; events with no key meaning give `None`
    pub fn map_event(event: &Event) -> Option<RawInput> {
        match event {
            Event::Key(key) => Self::map(key),
            Event::Mouse(_) => Some(RawInput::Code(KEY_MOUSE)),
            Event::Resize(_, _) => Some(RawInput::Code(KEY_RESIZE)),
            Event::FocusGained | Event::FocusLost => Some(RawInput::Code(KEY_EVENT)),
            Event::Paste(_) => None,
        }
    }

    /// Map a crossterm KeyEvent
    pub fn map(event: &KeyEvent) -> Option<RawInput> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);
        let shifted = mods.contains(Modifiers::SHIFT);

        let code = match event.code {
            KeyCode::Char(ch) => return Some(RawInput::Char(Self::map_char(ch, mods))),
            KeyCode::Enter => return Some(RawInput::Char('\n')),
            KeyCode::Tab => return Some(RawInput::Char('\t')),
            KeyCode::Esc => return Some(RawInput::Char('\x1b')),
            KeyCode::Null => return Some(RawInput::Char('\0')),

            KeyCode::Up => KEY_UP,
            KeyCode::Down => KEY_DOWN,
            KeyCode::Left if shifted => KEY_SLEFT,
            KeyCode::Left => KEY_LEFT,
            KeyCode::Right if shifted => KEY_SRIGHT,
            KeyCode::Right => KEY_RIGHT,
            KeyCode::Home if shifted => KEY_SHOME,
            KeyCode::Home => KEY_HOME,
            KeyCode::End if shifted => KEY_SEND,
            KeyCode::End => KEY_END,
            KeyCode::Insert if shifted => KEY_SIC,
            KeyCode::Insert => KEY_IC,
            KeyCode::Delete if shifted => KEY_SDC,
            KeyCode::Delete => KEY_DC,
            KeyCode::PageUp => KEY_PPAGE,
            KeyCode::PageDown => KEY_NPAGE,
            KeyCode::Backspace => KEY_BACKSPACE,
            KeyCode::BackTab => KEY_BTAB,
            KeyCode::F(n) => KEY_F0 + n as u16,

            _ => return None,
        };
        Some(RawInput::Code(code))
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> char {
        // Ctrl + letter = control character
        if mods.contains(Modifiers::CTRL) {
            if ch.is_ascii_alphabetic() {
                return ((ch.to_ascii_lowercase() as u8) - b'a' + 1) as char;
            }
            match ch {
                '@' | '`' | ' ' => return '\0',
                '[' => return '\x1b',
                '\\' => return '\x1c',
                ']' => return '\x1d',
                '^' | '~' => return '\x1e',
                '_' | '?' => return '\x1f',
                _ => {}
            }
        }
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
    use std::collections::HashSet;

    fn key_event(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_char_keys() {
        let event = key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Char('a')));

        // Ctrl+C
        let event = key_event(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Char('\x03')));

        let event = key_event(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Char('\n')));
    }

    #[test]
    fn test_arrow_keys() {
        let event = key_event(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Code(KEY_UP)));

        let event = key_event(KeyCode::Left, KeyModifiers::SHIFT);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Code(KEY_SLEFT)));
    }

    #[test]
    fn test_function_keys() {
        let event = key_event(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(RawInput::Code(0o415)));
    }

    #[test]
    fn test_events() {
        assert_eq!(
            KeyMapper::map_event(&Event::Resize(80, 24)),
            Some(RawInput::Code(KEY_RESIZE))
        );
        assert_eq!(KeyMapper::map_event(&Event::Paste("x".into())), None);
    }

    #[test]
    fn test_mouse_and_focus_events() {
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(KeyMapper::map_event(&click), Some(RawInput::Code(KEY_MOUSE)));
        assert_eq!(
            KeyMapper::map_event(&Event::FocusGained),
            Some(RawInput::Code(KEY_EVENT))
        );
        // Reported as supported only because the terminal backend turns on
        // mouse capture and focus reporting
        assert!(SUPPORTED_CODES.contains(&KEY_MOUSE));
        assert!(SUPPORTED_CODES.contains(&KEY_EVENT));
    }

    #[test]
    fn test_alt_is_not_a_modifier() {
        let mods = Modifiers::from(KeyModifiers::ALT | KeyModifiers::SHIFT);
        assert_eq!(mods, Modifiers::SHIFT);
    }

    #[test]
    fn test_key_table_is_bijective() {
        let codes: HashSet<u16> = key_table().map(|(code, _)| code).collect();
        let keys: HashSet<Key> = key_table().map(|(_, key)| key).collect();
        let total = key_table().count();
        assert_eq!(codes.len(), total);
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_supported_codes_decode() {
        let codes: HashSet<u16> = key_table().map(|(code, _)| code).collect();
        for code in SUPPORTED_CODES {
            assert!(codes.contains(code), "code {:o} has no key", code);
        }
    }
}
