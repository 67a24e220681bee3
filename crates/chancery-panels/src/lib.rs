//! Restart-surviving interactive panels for the Chancery assistant.
//!
//! An interactive unit -- an application review, a loan approval, a war
//! alert -- is presented to users as a chat message with clickable
//! controls. The process hosting it restarts routinely; the unit must
//! not die with it. This crate persists each unit as a versioned binary
//! state tuple in `PostgreSQL` and reconstructs the correct concrete type,
//! with its behavior rewired, on the next boot.
//!
//! # Lifecycle
//!
//! ```text
//! constructed -- normal constructor, slots derived
//!     |
//! persisted   -- PanelRegistry::add stores the captured state tuple
//!     |
//!     =========== process restart ===========
//!     |
//! rehydrated  -- registered codec rebuilds the concrete type from the
//!     |          tuple, bypassing normal construction; slot keys are
//!     |          re-derived byte-identically
//! active      -- re-attached to the gateway, slots route events again
//!     |
//! finalized   -- PanelRegistry::remove when the interaction concludes
//! ```
//!
//! # Modules
//!
//! - [`panel`] -- the [`Panel`] trait, [`PanelId`], and the versioned
//!   [`StateTuple`].
//! - [`slot`] -- slot descriptors and deterministic slot keys.
//! - [`codec`] -- the blob envelope and the tag-dispatched
//!   [`PanelCodecs`] registry.
//! - [`registry`] -- the database-backed [`PanelRegistry`] and its lazy
//!   [`PanelScan`] walk.
//! - [`error`] -- shared [`PanelError`] type.

pub mod codec;
pub mod error;
pub mod panel;
pub mod registry;
pub mod slot;

// Re-export primary types for convenience.
pub use codec::{DecodeFn, PanelCodecs, decode_payload, encode_panel, encode_payload};
pub use error::PanelError;
pub use panel::{Panel, PanelAction, PanelId, StateTuple};
pub use registry::{PanelRegistry, PanelScan};
pub use slot::{Slot, SlotDescriptor, SlotKey, SlotStyle, build_slots};
