//! Kiosk controller: display state, events, effects and the transition function.

pub mod action;
pub mod event;
pub mod handler;
pub mod state;
