//! The polymorphic panel trait and its versioned state tuple.
//!
//! A panel is a stateful interactive unit -- an application review prompt,
//! a loan approval, a war alert -- that must keep working across process
//! restarts. Its lifecycle: constructed normally and persisted, then on a
//! later boot rehydrated from its stored state tuple by its registered
//! codec (bypassing normal construction), re-attached to the live gateway,
//! and finally removed from the registry when the interaction concludes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PanelError;
use crate::slot::{Slot, SlotDescriptor, build_slots};

/// The durable integer identity of a panel.
///
/// Allocated from the registry's dedicated sequence, unique process-wide,
/// and stable across restarts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PanelId(i64);

impl PanelId {
    /// Wrap a raw id value.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The captured state of one panel: a version discriminator, the panel's
/// id, and the type-specific payload.
///
/// The payload is the CBOR encoding of the concrete type's own state
/// struct; [`Panel::capture_state`] and the type's registered decoder are
/// exact inverses for every version the type supports. A version the
/// decoder does not recognize is a fatal decode error for that row, never
/// a best-effort fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTuple {
    /// Format version discriminator; checked first by every decoder.
    pub version: u16,
    /// The owning panel's id.
    pub panel_id: PanelId,
    /// CBOR-encoded type-specific fields.
    pub payload: Vec<u8>,
}

/// What the caller should do with a panel after a slot press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// The panel stays live and registered.
    Keep,
    /// The interaction concluded: remove the panel from the registry and
    /// detach it from the gateway.
    Finalize,
}

/// A restart-surviving interactive unit.
///
/// Concrete types declare their slots as a `&'static [SlotDescriptor]`
/// and register a decoder under their [`Panel::type_tag`] in a
/// [`PanelCodecs`](crate::codec::PanelCodecs) at startup.
#[async_trait]
pub trait Panel: Send + Sync {
    /// Stable tag identifying the concrete type inside stored blobs.
    fn type_tag(&self) -> &'static str;

    /// The panel's durable id.
    fn id(&self) -> PanelId;

    /// The type-level slot declarations, in display order.
    fn descriptors(&self) -> &'static [SlotDescriptor];

    /// Capture the versioned state tuple this panel rehydrates from.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Encode`] if the payload cannot be encoded.
    fn capture_state(&self) -> Result<StateTuple, PanelError>;

    /// Handle a press on the slot named `slot`.
    ///
    /// Called by the gateway glue after routing an interaction event
    /// through the slot key; `slot` is the name half of the key.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownSlot`] for a name the panel does not
    /// declare; business handlers may surface their own failures.
    async fn on_press(&mut self, slot: &str) -> Result<PanelAction, PanelError>;

    /// The live slots for this panel, derived from its descriptors and
    /// id. Deterministic: the same id always yields the same keys.
    fn slots(&self) -> Vec<Slot> {
        build_slots(self.descriptors(), self.id())
    }
}
