//! Global hold-to-talk key, backed by `rdev`.
//!
//! Holding the configured key is the desktop rendition of the press-and-hold
//! gesture: the pointer position when the key goes down is the hold origin,
//! pointer motion while held becomes [`PipelineCommand::HoldMoved`], and
//! dragging past the cancel radius before letting go discards the utterance.
//!
//! `rdev::listen()` blocks forever, so it runs on a dedicated OS thread owned
//! by [`HoldListener`].  Event translation lives in [`HoldTracker`], which
//! holds no OS resources and is tested directly.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use voice_ledger::hotkey::{parse_key, HoldListener};
//!
//! let (tx, mut rx) = mpsc::channel(64);
//! let key = parse_key("F9").expect("unknown key");
//! let _listener = HoldListener::start(key, tx).expect("hotkey thread");
//! ```

pub mod listener;

pub use listener::{HoldListener, HoldTracker};

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from the config into an [`rdev::Key`].
///
/// Names are case-insensitive.  Accepts F1 to F12, single letters and a few
/// named keys; returns `None` for anything else.
///
/// ```
/// use voice_ledger::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
/// assert_eq!(parse_key("space"), Some(rdev::Key::Space));
/// assert_eq!(parse_key("q"), Some(rdev::Key::KeyQ));
/// assert_eq!(parse_key("Ctrl+V"), None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let upper = name.trim().to_ascii_uppercase();

    if let Some(number) = upper.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return match number {
            1 => Some(Key::F1),
            2 => Some(Key::F2),
            3 => Some(Key::F3),
            4 => Some(Key::F4),
            5 => Some(Key::F5),
            6 => Some(Key::F6),
            7 => Some(Key::F7),
            8 => Some(Key::F8),
            9 => Some(Key::F9),
            10 => Some(Key::F10),
            11 => Some(Key::F11),
            12 => Some(Key::F12),
            _ => None,
        };
    }

    let mut chars = upper.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return letter_key(c);
    }

    match upper.as_str() {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "CAPSLOCK" => Some(Key::CapsLock),
        "SCROLLLOCK" => Some(Key::ScrollLock),
        "PAUSE" => Some(Key::Pause),
        "INSERT" | "INS" => Some(Key::Insert),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "ALTGR" | "RIGHTALT" => Some(Key::AltGr),
        "RIGHTCTRL" | "RIGHTCONTROL" => Some(Key::ControlRight),
        _ => None,
    }
}

fn letter_key(c: char) -> Option<rdev::Key> {
    use rdev::Key;

    Some(match c {
        'A' => Key::KeyA,
        'B' => Key::KeyB,
        'C' => Key::KeyC,
        'D' => Key::KeyD,
        'E' => Key::KeyE,
        'F' => Key::KeyF,
        'G' => Key::KeyG,
        'H' => Key::KeyH,
        'I' => Key::KeyI,
        'J' => Key::KeyJ,
        'K' => Key::KeyK,
        'L' => Key::KeyL,
        'M' => Key::KeyM,
        'N' => Key::KeyN,
        'O' => Key::KeyO,
        'P' => Key::KeyP,
        'Q' => Key::KeyQ,
        'R' => Key::KeyR,
        'S' => Key::KeyS,
        'T' => Key::KeyT,
        'U' => Key::KeyU,
        'V' => Key::KeyV,
        'W' => Key::KeyW,
        'X' => Key::KeyX,
        'Y' => Key::KeyY,
        'Z' => Key::KeyZ,
        _ => return None,
    })
}
