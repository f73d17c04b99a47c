//! Wire messages exchanged between wrapper documents and the controller.
//!
//! The JSON shape is the historical one: a `type` discriminator plus
//! camelCase payload fields. Two distinct scroll variants share the
//! `"scroll"` tag (absolute positions from scroll events, deltas from
//! wheel/touch events), so the enum round-trips through an intermediate
//! raw struct instead of a derived tag.

use serde::{Deserialize, Serialize};

use envlens_types::SlotId;

/// A structured cross-frame message.
///
/// Origin-wildcard delivery is acceptable for these payloads: they carry
/// scroll geometry and load notifications, never secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage", into = "RawMessage")]
pub enum FrameMessage {
    /// A wrapper finished loading its hosted page. `content_height` is
    /// present only when the wrapper could measure its document.
    Loaded {
        frame_id: SlotId,
        content_height: Option<f64>,
    },
    /// Absolute scroll position report.
    ScrollAbsolute { frame_id: SlotId, x: f64, y: f64 },
    /// Relative scroll delta report (wheel/touch).
    ScrollDelta { frame_id: SlotId, dx: f64, dy: f64 },
    /// Controller broadcast gating wrapper emission.
    LockState { active: bool },
}

impl FrameMessage {
    /// The originating slot, for messages that carry one.
    pub fn frame_id(&self) -> Option<SlotId> {
        match self {
            FrameMessage::Loaded { frame_id, .. }
            | FrameMessage::ScrollAbsolute { frame_id, .. }
            | FrameMessage::ScrollDelta { frame_id, .. } => Some(*frame_id),
            FrameMessage::LockState { .. } => None,
        }
    }

    /// Whether this is either scroll variant.
    pub fn is_scroll(&self) -> bool {
        matches!(
            self,
            FrameMessage::ScrollAbsolute { .. } | FrameMessage::ScrollDelta { .. }
        )
    }
}

/// The loosely-typed JSON surface. All payload fields are optional; the
/// conversion below enforces which combinations are valid.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_id: Option<SlotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scroll_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scroll_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delta_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delta_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
}

impl TryFrom<RawMessage> for FrameMessage {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "loaded" => {
                let frame_id = raw
                    .frame_id
                    .ok_or_else(|| "loaded message missing frameId".to_string())?;
                Ok(FrameMessage::Loaded {
                    frame_id,
                    content_height: raw.content_height,
                })
            }
            "scroll" => {
                let frame_id = raw
                    .frame_id
                    .ok_or_else(|| "scroll message missing frameId".to_string())?;
                // Absolute coordinates win when a payload carries both.
                if raw.scroll_x.is_some() || raw.scroll_y.is_some() {
                    Ok(FrameMessage::ScrollAbsolute {
                        frame_id,
                        x: raw.scroll_x.unwrap_or(0.0),
                        y: raw.scroll_y.unwrap_or(0.0),
                    })
                } else if raw.delta_x.is_some() || raw.delta_y.is_some() {
                    Ok(FrameMessage::ScrollDelta {
                        frame_id,
                        dx: raw.delta_x.unwrap_or(0.0),
                        dy: raw.delta_y.unwrap_or(0.0),
                    })
                } else {
                    Err("scroll message carries neither position nor delta".to_string())
                }
            }
            "scrollLockState" => {
                let active = raw
                    .active
                    .ok_or_else(|| "scrollLockState message missing active".to_string())?;
                Ok(FrameMessage::LockState { active })
            }
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

impl From<FrameMessage> for RawMessage {
    fn from(msg: FrameMessage) -> Self {
        match msg {
            FrameMessage::Loaded {
                frame_id,
                content_height,
            } => RawMessage {
                kind: "loaded".to_string(),
                frame_id: Some(frame_id),
                content_height,
                ..RawMessage::default()
            },
            FrameMessage::ScrollAbsolute { frame_id, x, y } => RawMessage {
                kind: "scroll".to_string(),
                frame_id: Some(frame_id),
                scroll_x: Some(x),
                scroll_y: Some(y),
                ..RawMessage::default()
            },
            FrameMessage::ScrollDelta { frame_id, dx, dy } => RawMessage {
                kind: "scroll".to_string(),
                frame_id: Some(frame_id),
                delta_x: Some(dx),
                delta_y: Some(dy),
                ..RawMessage::default()
            },
            FrameMessage::LockState { active } => RawMessage {
                kind: "scrollLockState".to_string(),
                active: Some(active),
                ..RawMessage::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_wire_shape() {
        let msg = FrameMessage::Loaded {
            frame_id: SlotId::Env1,
            content_height: Some(4000.0),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "loaded");
        assert_eq!(json["frameId"], "env1");
        assert_eq!(json["contentHeight"], 4000.0);
    }

    #[test]
    fn loaded_without_height_omits_field() {
        let msg = FrameMessage::Loaded {
            frame_id: SlotId::Env2,
            content_height: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("contentHeight"));
    }

    #[test]
    fn absolute_scroll_parses() {
        let msg: FrameMessage =
            serde_json::from_str(r#"{"type":"scroll","frameId":"env1","scrollX":0,"scrollY":500}"#)
                .unwrap();
        assert_eq!(
            msg,
            FrameMessage::ScrollAbsolute {
                frame_id: SlotId::Env1,
                x: 0.0,
                y: 500.0,
            }
        );
    }

    #[test]
    fn delta_scroll_parses() {
        let msg: FrameMessage =
            serde_json::from_str(r#"{"type":"scroll","frameId":"env2","deltaX":0,"deltaY":-120}"#)
                .unwrap();
        assert_eq!(
            msg,
            FrameMessage::ScrollDelta {
                frame_id: SlotId::Env2,
                dx: 0.0,
                dy: -120.0,
            }
        );
    }

    #[test]
    fn touch_delta_without_delta_x_parses() {
        // Touchmove reports only a vertical delta.
        let msg: FrameMessage =
            serde_json::from_str(r#"{"type":"scroll","frameId":"env1","deltaY":42}"#).unwrap();
        assert_eq!(
            msg,
            FrameMessage::ScrollDelta {
                frame_id: SlotId::Env1,
                dx: 0.0,
                dy: 42.0,
            }
        );
    }

    #[test]
    fn absolute_wins_over_delta() {
        let msg: FrameMessage = serde_json::from_str(
            r#"{"type":"scroll","frameId":"env1","scrollY":300,"deltaY":10}"#,
        )
        .unwrap();
        assert!(matches!(msg, FrameMessage::ScrollAbsolute { y, .. } if y == 300.0));
    }

    #[test]
    fn empty_scroll_rejected() {
        let err = serde_json::from_str::<FrameMessage>(r#"{"type":"scroll","frameId":"env1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn lock_state_round_trips() {
        let msg = FrameMessage::LockState { active: true };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"scrollLockState\""));
        let back: FrameMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn unknown_type_rejected() {
        let err = serde_json::from_str::<FrameMessage>(r#"{"type":"resize","frameId":"env1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn missing_frame_id_rejected() {
        assert!(serde_json::from_str::<FrameMessage>(r#"{"type":"loaded"}"#).is_err());
        assert!(serde_json::from_str::<FrameMessage>(r#"{"type":"scroll","scrollY":5}"#).is_err());
    }

    #[test]
    fn frame_id_accessor() {
        let msg = FrameMessage::ScrollDelta {
            frame_id: SlotId::Env2,
            dx: 0.0,
            dy: 1.0,
        };
        assert_eq!(msg.frame_id(), Some(SlotId::Env2));
        assert_eq!(FrameMessage::LockState { active: false }.frame_id(), None);
    }

    #[test]
    fn is_scroll_accessor() {
        assert!(
            FrameMessage::ScrollAbsolute {
                frame_id: SlotId::Env1,
                x: 0.0,
                y: 0.0,
            }
            .is_scroll()
        );
        assert!(
            !FrameMessage::Loaded {
                frame_id: SlotId::Env1,
                content_height: None,
            }
            .is_scroll()
        );
    }
}
