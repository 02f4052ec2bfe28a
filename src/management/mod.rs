mod state;

pub use state::STATE_TYPE_MISSING;
pub use state::STATE_TYPE_SCANNED;
pub use state::StateError;
pub use state::StateManager;
