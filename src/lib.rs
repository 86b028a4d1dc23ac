pub mod cache;
pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod i18n;
pub mod mymemory;
pub mod preferences;
pub mod session;
pub mod speech;
pub mod translation;
