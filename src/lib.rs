pub mod catalog;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod doctor;
pub mod notify;
pub mod player;
pub mod session;
pub mod tui;
