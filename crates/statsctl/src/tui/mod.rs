//! Terminal dashboard: event loop and rendering.

mod event_loop;
mod render;

pub use event_loop::run;
