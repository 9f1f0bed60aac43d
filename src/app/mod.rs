pub mod adaptive;
pub mod bootstrap;
pub mod controller;
pub mod cycler;
pub mod display;
pub mod monitor;
pub mod settings;
pub mod shutdown;
pub mod state;

pub use adaptive::AdaptiveController;
pub use controller::{TickerController, TickerDeps};
pub use display::Display;
pub use settings::{Intervals, SettingsPersister};
pub use shutdown::Shutdown;
pub use state::{AddOutcome, RemoveOutcome, Selection, SharedState};
