//! Thread-shared state.

pub mod shared;

pub use shared::{create_shared_state, SharedState, SharedStateHandle};
