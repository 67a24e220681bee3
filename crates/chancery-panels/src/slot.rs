//! Slot descriptors and deterministic slot keys.
//!
//! A slot is one behaviorally bound sub-element of a panel -- a clickable
//! control on the message the panel is attached to. Each concrete panel
//! type declares its slots once, at the type level, as a fixed ordered
//! `&'static [SlotDescriptor]`. At rehydration time the same live slots
//! are re-derived from that list by plain iteration, so the slot keys the
//! gateway routes on are byte-identical across restarts.
//!
//! # Key format
//!
//! | Key | Example |
//! |-----|---------|
//! | `{slot_name}:{panel_id}` | `confirm:42` |

use std::fmt;

use crate::panel::PanelId;

/// Visual style of a slot's control, forwarded to the chat gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStyle {
    /// Neutral emphasis.
    Secondary,
    /// Primary call to action.
    Primary,
    /// Affirmative (green) action.
    Success,
    /// Destructive (red) action.
    Danger,
}

/// Type-level declaration of one slot: its stable name, the label shown
/// on the control, and its style.
///
/// The name becomes the first half of the slot key and must therefore
/// never contain `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescriptor {
    /// Stable slot name, unique within the panel type.
    pub name: &'static str,
    /// Label shown on the control.
    pub label: &'static str,
    /// Control style.
    pub style: SlotStyle,
}

/// The routing key of one live slot: slot name plus owning panel id.
///
/// Rendered as `{name}:{id}`. The rendering is the contract with the
/// chat gateway -- a rehydrated panel must reproduce its keys exactly or
/// interaction events silently stop routing to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    name: String,
    panel: PanelId,
}

impl SlotKey {
    /// Build the key for `name` on the panel with id `panel`.
    pub fn new(name: &str, panel: PanelId) -> Self {
        Self {
            name: name.to_owned(),
            panel,
        }
    }

    /// The slot name half of the key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning panel id half of the key.
    pub const fn panel(&self) -> PanelId {
        self.panel
    }

    /// Parse a key received from the gateway back into its halves.
    ///
    /// Returns `None` for anything that is not `{name}:{integer}`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, id) = raw.rsplit_once(':')?;
        if name.is_empty() {
            return None;
        }
        let id: i64 = id.parse().ok()?;
        Some(Self {
            name: name.to_owned(),
            panel: PanelId::new(id),
        })
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.panel)
    }
}

/// One live, routable slot: the descriptor it was derived from plus its
/// concrete key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// The type-level descriptor this slot was derived from.
    pub descriptor: SlotDescriptor,
    /// The routing key the gateway matches interaction events against.
    pub key: SlotKey,
}

/// Derive the live slots for a panel: one per descriptor, in declaration
/// order, keyed by `(descriptor.name, panel)`.
pub fn build_slots(descriptors: &'static [SlotDescriptor], panel: PanelId) -> Vec<Slot> {
    descriptors
        .iter()
        .map(|descriptor| Slot {
            descriptor: *descriptor,
            key: SlotKey::new(descriptor.name, panel),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOTS: &[SlotDescriptor] = &[
        SlotDescriptor {
            name: "confirm",
            label: "Confirm",
            style: SlotStyle::Success,
        },
        SlotDescriptor {
            name: "cancel",
            label: "Cancel",
            style: SlotStyle::Danger,
        },
    ];

    #[test]
    fn keys_render_name_colon_id() {
        let key = SlotKey::new("confirm", PanelId::new(42));
        assert_eq!(key.to_string(), "confirm:42");
    }

    #[test]
    fn parse_inverts_render() {
        let key = SlotKey::new("confirm", PanelId::new(42));
        assert_eq!(SlotKey::parse("confirm:42"), Some(key));
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(SlotKey::parse("confirm"), None);
        assert_eq!(SlotKey::parse(":42"), None);
        assert_eq!(SlotKey::parse("confirm:not_a_number"), None);
    }

    #[test]
    fn build_slots_preserves_declaration_order() {
        let slots = build_slots(SLOTS, PanelId::new(7));
        let keys: Vec<String> = slots.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["confirm:7", "cancel:7"]);
    }

    #[test]
    fn same_id_reproduces_identical_keys() {
        let first = build_slots(SLOTS, PanelId::new(7));
        let second = build_slots(SLOTS, PanelId::new(7));
        assert_eq!(first, second);
    }
}
