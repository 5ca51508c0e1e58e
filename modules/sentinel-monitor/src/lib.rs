pub mod acquisition;
pub mod controller;
pub mod notifier;
pub mod state;

pub use acquisition::{
    AcquisitionPipeline, AcquisitionStrategy, ConstrainedSynthesis, GroundedRetrieval,
    LocalFallback,
};
pub use controller::MonitorController;
pub use state::{MonitorState, SharedState};
