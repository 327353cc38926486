//! Symbol table for named input states.
//!
//! Every name belongs to exactly one category. Lookups are case-insensitive;
//! the table itself stores upper-case names.

use macro_schema::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stick {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Dpad {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    Neutral = Packet::DPAD_NEUTRAL,
}

impl Dpad {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Entry of the static token table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Named {
    /// Bit index into the 14-bit button mask.
    Button(u8),
    Dpad(Dpad),
    StickCardinal(Stick, u8, u8),
}

pub const NEUTRAL_KEYWORDS: &[&str] = &["NEUTRAL", "NONE", "WAIT", "RELEASE"];

pub const BUTTON_COUNT: u8 = 14;

pub const BUTTONS: &[(&str, u8)] = &[
    ("Y", 0),
    ("B", 1),
    ("A", 2),
    ("X", 3),
    ("L", 4),
    ("R", 5),
    ("ZL", 6),
    ("ZR", 7),
    ("MINUS", 8),
    ("PLUS", 9),
    ("LCLICK", 10),
    ("RCLICK", 11),
    ("HOME", 12),
    ("CAPTURE", 13),
];

pub const DPAD: &[(&str, Dpad)] = &[
    ("UP", Dpad::Up),
    ("UPRIGHT", Dpad::UpRight),
    ("RIGHT", Dpad::Right),
    ("DOWNRIGHT", Dpad::DownRight),
    ("DOWN", Dpad::Down),
    ("DOWNLEFT", Dpad::DownLeft),
    ("LEFT", Dpad::Left),
    ("UPLEFT", Dpad::UpLeft),
    ("CENTER", Dpad::Neutral),
];

/// Cardinal positions shared by both sticks; the name is prefixed with `L` or `R`.
pub const CARDINALS: &[(&str, u8, u8)] = &[
    ("UP", 128, 255),
    ("DOWN", 128, 0),
    ("LEFT", 0, 128),
    ("RIGHT", 255, 128),
    ("UPLEFT", 0, 255),
    ("UPRIGHT", 255, 255),
    ("DOWNLEFT", 0, 0),
    ("DOWNRIGHT", 255, 0),
];

pub fn is_neutral_keyword(expr: &str) -> bool {
    NEUTRAL_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(expr))
}

pub fn lookup(name: &str) -> Option<Named> {
    if let Some((_, bit)) = BUTTONS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        return Some(Named::Button(*bit));
    }
    if let Some((_, d)) = DPAD.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        return Some(Named::Dpad(*d));
    }
    lookup_cardinal(name)
}

fn lookup_cardinal(name: &str) -> Option<Named> {
    let (stick, rest) = split_stick_prefix(name)?;
    CARDINALS
        .iter()
        .find(|(n, _, _)| n.eq_ignore_ascii_case(rest))
        .map(|&(_, x, y)| Named::StickCardinal(stick, x, y))
}

pub(crate) fn split_stick_prefix(s: &str) -> Option<(Stick, &str)> {
    let mut chars = s.chars();
    let stick = match chars.next()? {
        'l' | 'L' => Stick::Left,
        'r' | 'R' => Stick::Right,
        _ => return None,
    };
    Some((stick, chars.as_str()))
}

/// Every upper-case name the table answers to, in table order.
pub fn all_names() -> Vec<String> {
    let mut names: Vec<String> = BUTTONS.iter().map(|(n, _)| n.to_string()).collect();
    names.extend(DPAD.iter().map(|(n, _)| n.to_string()));
    for prefix in ["L", "R"] {
        names.extend(CARDINALS.iter().map(|(n, _, _)| format!("{prefix}{n}")));
    }
    names
}

/// Names of the buttons set in `mask`, lowest bit first.
pub fn button_names(mask: u16) -> Vec<&'static str> {
    BUTTONS
        .iter()
        .filter(|(_, bit)| mask & (1 << bit) != 0)
        .map(|(n, _)| *n)
        .collect()
}

pub fn dpad_name(value: u8) -> Option<&'static str> {
    DPAD.iter()
        .find(|(_, d)| d.value() == value)
        .map(|(n, _)| *n)
}
