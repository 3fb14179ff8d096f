//! Room session lifecycle for Polyroom.
//!
//! A session is one membership in one room, from connect to leave:
//!
//! ```text
//! Idle → Connecting → Joining → Joined → Leaving → Closed
//!            │            │         │
//!            └────────────┴─────────┴──────────────→ Closed
//! ```
//!
//! [`open`] drives everything up to `Joined` and returns a
//! [`SessionHandle`]. Behind the handle a single actor task owns the
//! [`RoomStore`](polyroom_state::RoomStore), applies inbound events one at
//! a time, and performs teardown. Relay adapters started through the handle
//! run as their own tasks and share only the outbound sink.
//!
//! # Guarantees
//!
//! - Exactly one `join-room` per session.
//! - At most one `leave-room`, only on explicit close (or when every
//!   handle is dropped) while joined. Transport loss sends nothing.
//! - The transport is closed exactly once.
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)      ← builds sessions from config
//!     ↕
//! Session (this crate) ← lifecycle, store ownership, adapter ownership
//!     ↕
//! Relay / State / Protocol / Transport (below)
//! ```

mod error;
mod handle;
mod outbound;
mod session;

pub use error::SessionError;
pub use handle::{AdapterSlot, SessionHandle, SessionUpdate, open, open_with_codec};
pub use session::{JoinRequest, SessionConfig, SessionState};
