//! Client-side orchestration for the Argus futures dashboard.
//!
//! - [`selection`]: the chosen instrument and its editable focus topics
//! - [`store`]: the reactive state container every surface reads from
//! - [`orchestrator`]: one run = three independent remote calls
//! - [`chart`]: owns the single live chart widget and its resize listener
//! - [`view`]: pure projection of state into what the screen shows

pub mod chart;
pub mod orchestrator;
pub mod selection;
pub mod store;
pub mod view;

#[cfg(test)]
mod tests;

pub use chart::{
    ChartEngine, ChartLifecycle, ChartOptions, ChartTheme, ListenerId, Rgb, Transition, Viewport,
};
pub use orchestrator::{FetchOrchestrator, RunHandle, RunPolicy, RunPolicyParseError};
pub use selection::{Selection, SelectionState};
pub use store::{DashboardState, DashboardStore, RunId, RunState};
pub use view::{DashboardView, NewsCard, NewsPanel, Tone, Verdict};
