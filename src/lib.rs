//! Voice and text quick-add for a personal ledger.
//!
//! Speech (or typed text) is interpreted into transaction suggestions,
//! reconciled against the category taxonomy into reviewable drafts, and
//! committed to a ledger store.
//!
//! Optional features: `cpal` (microphone), `whisper` (local recognition),
//! `hotkey` (global hold-to-talk key); `voice` enables all three.

pub mod capture;
pub mod config;
pub mod drafts;
pub mod pipeline;
pub mod store;
pub mod suggest;
pub mod taxonomy;

#[cfg(feature = "hotkey")]
pub mod hotkey;
