//! Blob encoding and the tag-dispatched codec registry.
//!
//! A stored panel is one opaque `BYTEA` value: the CBOR encoding of an
//! envelope carrying the concrete type's tag and its versioned state
//! tuple. Decoding reads the envelope, looks the tag up in the
//! [`PanelCodecs`] registry built at startup, and hands the tuple to that
//! type's decoder -- no runtime type discovery, no fallback for tags or
//! versions nobody registered.
//!
//! The format is private to this application; nothing else reads these
//! blobs, so there is no cross-language compatibility concern.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PanelError;
use crate::panel::{Panel, PanelId, StateTuple};

/// The stored blob layout.
#[derive(Serialize, Deserialize)]
struct Envelope {
    tag: String,
    version: u16,
    panel_id: PanelId,
    payload: Vec<u8>,
}

/// Encode a live panel into its stored blob.
///
/// # Errors
///
/// Returns [`PanelError::Encode`] if state capture or envelope encoding
/// fails.
pub fn encode_panel(panel: &dyn Panel) -> Result<Vec<u8>, PanelError> {
    let state = panel.capture_state()?;
    let envelope = Envelope {
        tag: panel.type_tag().to_owned(),
        version: state.version,
        panel_id: state.panel_id,
        payload: state.payload,
    };
    let mut blob = Vec::new();
    ciborium::into_writer(&envelope, &mut blob)?;
    Ok(blob)
}

/// Encode a concrete type's state struct into a tuple payload.
///
/// # Errors
///
/// Returns [`PanelError::Encode`] if encoding fails.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, PanelError> {
    let mut payload = Vec::new();
    ciborium::into_writer(value, &mut payload)?;
    Ok(payload)
}

/// Decode a tuple payload back into a concrete type's state struct.
///
/// # Errors
///
/// Returns [`PanelError::Decode`] if the payload does not parse as `T`.
pub fn decode_payload<T: DeserializeOwned>(state: &StateTuple) -> Result<T, PanelError> {
    Ok(ciborium::from_reader(state.payload.as_slice())?)
}

/// A concrete type's decoder: state tuple in, live panel out.
///
/// The decoder is the inverse of that type's
/// [`capture_state`](Panel::capture_state) for every version it supports,
/// and must return [`PanelError::UnknownVersion`] for any other version.
pub type DecodeFn = fn(StateTuple) -> Result<Box<dyn Panel>, PanelError>;

/// The process-wide set of panel codecs, built once at startup and passed
/// by reference to the registry -- there is no ambient global.
#[derive(Default)]
pub struct PanelCodecs {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl PanelCodecs {
    /// Create an empty codec set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the decoder for one concrete panel type.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::DuplicateTag`] if the tag is already taken --
    /// fatal at startup, two types must never share a tag.
    pub fn register(&mut self, tag: &'static str, decode: DecodeFn) -> Result<(), PanelError> {
        if self.decoders.contains_key(tag) {
            return Err(PanelError::DuplicateTag(tag));
        }
        self.decoders.insert(tag, decode);
        Ok(())
    }

    /// The number of registered codecs.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// `true` when no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode a stored blob into a live, concrete-typed panel.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Decode`] for an unparsable blob,
    /// [`PanelError::UnknownTag`] for an unregistered tag, and whatever
    /// the type's decoder returns for its tuple (notably
    /// [`PanelError::UnknownVersion`]).
    pub fn decode(&self, blob: &[u8]) -> Result<Box<dyn Panel>, PanelError> {
        let envelope: Envelope = ciborium::from_reader(blob)?;
        let decode = self
            .decoders
            .get(envelope.tag.as_str())
            .ok_or_else(|| PanelError::UnknownTag(envelope.tag.clone()))?;
        decode(StateTuple {
            version: envelope.version,
            panel_id: envelope.panel_id,
            payload: envelope.payload,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::panel::PanelAction;
    use crate::slot::{SlotDescriptor, SlotStyle};

    const REVIEW_TAG: &str = "member_review";
    const REVIEW_VERSION: u16 = 1;

    const REVIEW_SLOTS: &[SlotDescriptor] = &[
        SlotDescriptor {
            name: "confirm",
            label: "Accept",
            style: SlotStyle::Success,
        },
        SlotDescriptor {
            name: "cancel",
            label: "Reject",
            style: SlotStyle::Danger,
        },
    ];

    #[derive(Serialize, Deserialize)]
    struct ReviewState {
        applicant: String,
        nation_id: i32,
    }

    /// A membership application awaiting an officer's decision.
    struct ReviewPrompt {
        id: PanelId,
        applicant: String,
        nation_id: i32,
    }

    impl ReviewPrompt {
        fn new(id: PanelId, applicant: &str, nation_id: i32) -> Self {
            Self {
                id,
                applicant: applicant.to_owned(),
                nation_id,
            }
        }

        fn decode(state: StateTuple) -> Result<Box<dyn Panel>, PanelError> {
            if state.version != REVIEW_VERSION {
                return Err(PanelError::UnknownVersion {
                    tag: REVIEW_TAG.to_owned(),
                    version: state.version,
                });
            }
            let fields: ReviewState = decode_payload(&state)?;
            Ok(Box::new(Self {
                id: state.panel_id,
                applicant: fields.applicant,
                nation_id: fields.nation_id,
            }))
        }
    }

    #[async_trait]
    impl Panel for ReviewPrompt {
        fn type_tag(&self) -> &'static str {
            REVIEW_TAG
        }

        fn id(&self) -> PanelId {
            self.id
        }

        fn descriptors(&self) -> &'static [SlotDescriptor] {
            REVIEW_SLOTS
        }

        fn capture_state(&self) -> Result<StateTuple, PanelError> {
            Ok(StateTuple {
                version: REVIEW_VERSION,
                panel_id: self.id,
                payload: encode_payload(&ReviewState {
                    applicant: self.applicant.clone(),
                    nation_id: self.nation_id,
                })?,
            })
        }

        async fn on_press(&mut self, slot: &str) -> Result<PanelAction, PanelError> {
            match slot {
                "confirm" | "cancel" => Ok(PanelAction::Finalize),
                other => Err(PanelError::UnknownSlot {
                    panel: self.id,
                    slot: other.to_owned(),
                }),
            }
        }
    }

    fn codecs() -> PanelCodecs {
        let mut codecs = PanelCodecs::new();
        codecs
            .register(REVIEW_TAG, ReviewPrompt::decode)
            .expect("first registration");
        codecs
    }

    #[test]
    fn round_trip_preserves_identity_and_state() {
        let original = ReviewPrompt::new(PanelId::new(42), "Arrakis", 100);
        let blob = encode_panel(&original).expect("encode");

        let rehydrated = codecs().decode(&blob).expect("decode");
        assert_eq!(rehydrated.type_tag(), REVIEW_TAG);
        assert_eq!(rehydrated.id(), PanelId::new(42));

        // Slot keys must be byte-identical across the round trip.
        let keys: Vec<String> = rehydrated.slots().iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["confirm:42", "cancel:42"]);

        // capture_state after rehydration is the exact tuple that was stored.
        assert_eq!(
            rehydrated.capture_state().ok(),
            original.capture_state().ok()
        );
    }

    #[test]
    fn unregistered_tag_is_rejected() {
        let panel = ReviewPrompt::new(PanelId::new(1), "Caladan", 7);
        let blob = encode_panel(&panel).expect("encode");

        let empty = PanelCodecs::new();
        assert!(matches!(
            empty.decode(&blob),
            Err(PanelError::UnknownTag(tag)) if tag == REVIEW_TAG
        ));
    }

    #[test]
    fn unknown_version_is_fatal_not_guessed() {
        let state = StateTuple {
            version: 99,
            panel_id: PanelId::new(1),
            payload: Vec::new(),
        };
        assert!(matches!(
            ReviewPrompt::decode(state),
            Err(PanelError::UnknownVersion { version: 99, .. })
        ));
    }

    #[test]
    fn corrupt_blob_is_a_decode_error() {
        let result = codecs().decode(b"not cbor at all");
        assert!(matches!(result, Err(PanelError::Decode(_))));
    }

    #[test]
    fn duplicate_tag_registration_is_fatal() {
        let mut codecs = codecs();
        let second = codecs.register(REVIEW_TAG, ReviewPrompt::decode);
        assert!(matches!(second, Err(PanelError::DuplicateTag(_))));
    }

    #[tokio::test]
    async fn press_routes_by_slot_name() {
        let mut panel = ReviewPrompt::new(PanelId::new(3), "Giedi Prime", 9);
        let action = panel.on_press("confirm").await;
        assert_eq!(action.ok(), Some(PanelAction::Finalize));

        let unknown = panel.on_press("promote").await;
        assert!(matches!(unknown, Err(PanelError::UnknownSlot { .. })));
    }
}

