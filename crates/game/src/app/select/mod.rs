//! Character select: four player panels around a shared fighter wheel.

mod coordinator;
mod panel;
mod render;
mod wheel;


pub(crate) use coordinator::{SelectionCoordinator, SelectionError, SelectionServices};
