pub mod animation;
pub mod board;
pub mod card;
pub mod config;
pub mod drag;
pub mod event;
pub mod geometry;
pub mod history;
pub mod pile;
pub mod script;
pub mod svg;
