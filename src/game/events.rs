use serde::Serialize;

/// Fire-and-forget notification for audio, animation and other listeners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// `impact_speed` is the vertical speed at landing, 0 when leaving ground.
    GroundedChanged { grounded: bool, impact_speed: f32 },
    Jumped,
    JetpackChanged { active: bool },
    CrouchChanged { crouching: bool },
    TetherChanged { deployed: bool },
}

/// Outbound queue drained by the frame loop that owns the player.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: Vec<PlayerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PlayerEvent) {
        self.pending.push(event);
    }

    /// Takes every pending event in emission order.
    pub fn drain(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = EventQueue::new();
        queue.push(PlayerEvent::GroundedChanged { grounded: false, impact_speed: 0.0 });
        queue.push(PlayerEvent::Jumped);

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                PlayerEvent::GroundedChanged { grounded: false, impact_speed: 0.0 },
                PlayerEvent::Jumped,
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_string(&PlayerEvent::TetherChanged { deployed: true }).unwrap();
        assert_eq!(json, r#"{"event":"tether_changed","deployed":true}"#);
    }
}
