//! Best-effort notification fan-out.

mod event;
mod registry;

pub use event::Event;
pub use registry::SessionRegistry;
