//! Error types for the panel layer.
//!
//! Decode failures are deliberately fine-grained: the registry needs to
//! tell a corrupt blob from an unknown type tag or an unsupported state
//! version, because a bulk load skips exactly one row per failure while a
//! single-panel `get` surfaces the failure to its caller.

use chancery_db::DbError;

use crate::panel::PanelId;

/// Errors that can occur while persisting or rehydrating panels.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// A data-layer operation failed.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Serializing a panel's state tuple to its binary form failed.
    #[error("panel state encode error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// A stored blob could not be parsed at all.
    #[error("panel state decode error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    /// A stored blob carries a type tag no codec was registered for.
    #[error("unknown panel type tag `{0}`")]
    UnknownTag(String),

    /// A stored blob carries a state version its codec does not support.
    /// Never guessed around: the row is rejected.
    #[error("unsupported state version {version} for panel type `{tag}`")]
    UnknownVersion {
        /// The panel type tag.
        tag: String,
        /// The unrecognized version discriminator.
        version: u16,
    },

    /// Two codecs were registered under the same type tag. Fatal at
    /// startup.
    #[error("duplicate panel codec for type tag `{0}`")]
    DuplicateTag(&'static str),

    /// `add` was called with an id that is already stored. Ids come from
    /// the registry's sequence, so a collision is a logic error.
    #[error("panel id {0} is already registered")]
    DuplicateId(PanelId),

    /// The id sequence produced no value; the store is misconfigured.
    #[error("panel id sequence returned no value")]
    SequenceEmpty,

    /// A slot press named a slot the panel does not declare.
    #[error("panel {panel} has no slot named `{slot}`")]
    UnknownSlot {
        /// The panel that received the press.
        panel: PanelId,
        /// The undeclared slot name.
        slot: String,
    },
}
