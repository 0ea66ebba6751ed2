pub mod commands;
pub mod i18n;
pub mod parser;
pub mod services;
pub mod state;
pub mod webhook;

// Initialize i18n at crate root (required by rust-i18n)
rust_i18n::i18n!("locales", fallback = "en");
