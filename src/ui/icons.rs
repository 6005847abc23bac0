//! Shared UI icons.
//!
//! Each icon falls back to a plain ASCII tag when the terminal cannot
//! render emoji.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Stage lifecycle
pub static RUNNING: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static RESTART: Emoji<'_, '_> = Emoji("🔄 ", "[RESTART]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
