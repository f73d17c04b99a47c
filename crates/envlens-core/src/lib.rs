//! Comparison engine for envlens.
//!
//! Ties the frame host (two page surfaces with a strict load lifecycle),
//! the scroll synchronizer (strategy-selecting lock state machine), and
//! the cross-frame relay into the [`CompareController`] -- the top-level
//! component the embedding page drives with host events. The floating
//! sibling-jump widget and the supervised-restart watchdog live alongside
//! as hosting-layer concerns.

pub mod controller;
pub mod frame_host;
pub mod session;
pub mod sync;
pub mod watchdog;
pub mod widget;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use controller::CompareController;
pub use frame_host::{FrameHost, LoadState, OriginAccess, SlotEvent, LOAD_TIMEOUT_MS};
pub use session::{resolve_session, session_from_query, SessionSource};
pub use sync::{ScrollSynchronizer, Strategy, SyncState};
pub use watchdog::Watchdog;
pub use widget::{FloatingWidget, JumpRequest, WidgetController};
