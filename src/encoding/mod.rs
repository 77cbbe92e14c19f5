//! State encoding for tabular learners.
//!
//! - `CanonicalState`: the observer-relative feature snapshot
//! - `StateEncoder`: trait mapping snapshots to table rows
//! - `HashedEncoder`: the fixed, versioned hashing implementation

pub mod canonical;
pub mod encoder;

pub use canonical::CanonicalState;
pub use encoder::{
    encode, state_hash, state_words, HashedEncoder, StateEncoder, StateId, DEFAULT_NUM_STATES,
    ENCODING_VERSION,
};
