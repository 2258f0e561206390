//! Initiative tracker: the encounter table, its turn and round counters,
//! and everything that edits them. State lives in WASM memory
//! (thread_local) for the lifetime of the page's worker.

pub mod damage;
pub mod dispatch;
pub mod participant;
pub mod persist;
pub mod reinforce;
pub mod render;
pub mod state;
pub mod turns;
