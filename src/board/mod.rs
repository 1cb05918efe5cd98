//! Board-side logic: order reconciliation, the drag-and-drop state machine,
//! per-user board sessions, and the local order cache.
//!
//! Everything in this module is pure with respect to storage: operations
//! mutate in-memory board state and return effects describing the mutations
//! the caller should persist through the RPC layer.

pub mod cache;
pub mod dnd;
pub mod order;
pub mod session;

pub use cache::OrderCache;
pub use dnd::{DragEffects, DragState, DropTarget};
pub use order::reconcile;
pub use session::{BoardSessions, BoardState};
