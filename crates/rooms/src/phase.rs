use serde::Serialize;

/// Where a room is in its AI turn cycle.
///
/// `Idle -> DebounceScheduled -> Generating -> Idle`.  At most one turn is
/// pending per room because the only way into `Generating` is from
/// `DebounceScheduled`, and the only way into `DebounceScheduled` is from
/// `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    DebounceScheduled,
    Generating { request_id: String },
}

impl TurnPhase {
    /// `Idle -> DebounceScheduled`. Returns `false` (and changes nothing)
    /// from any other phase.
    pub fn schedule(&mut self) -> bool {
        if *self == TurnPhase::Idle {
            *self = TurnPhase::DebounceScheduled;
            true
        } else {
            false
        }
    }

    /// `DebounceScheduled -> Generating`.
    pub fn begin(&mut self, request_id: impl Into<String>) -> bool {
        if *self == TurnPhase::DebounceScheduled {
            *self = TurnPhase::Generating {
                request_id: request_id.into(),
            };
            true
        } else {
            false
        }
    }

    /// Back to `Idle` from wherever the room was.
    pub fn finish(&mut self) {
        *self = TurnPhase::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TurnPhase::Idle)
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, TurnPhase::Generating { .. })
    }

    /// Request id of the in-flight turn, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            TurnPhase::Generating { request_id } => Some(request_id),
            _ => None,
        }
    }
}
