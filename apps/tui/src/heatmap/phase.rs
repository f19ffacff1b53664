use std::convert::TryFrom;
use std::fmt;

/// Lifecycle of the map view.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapPhase {
    Loading,
    Ready,
    Interacting,
    Error,
}

impl fmt::Display for MapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Ready => write!(f, "Ready"),
            Self::Interacting => write!(f, "Interacting"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapEvent {
    FetchSucceeded,
    FetchFailed(String),
    Retry,
    GestureStart,
    GestureEnd,
}

impl fmt::Display for MapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchSucceeded => write!(f, "FetchSucceeded"),
            Self::FetchFailed(msg) => write!(f, "FetchFailed({msg})"),
            Self::Retry => write!(f, "Retry"),
            Self::GestureStart => write!(f, "GestureStart"),
            Self::GestureEnd => write!(f, "GestureEnd"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid transition from {from} with event {event}")]
pub struct PhaseTransitionError {
    pub from: MapPhase,
    pub event: MapEvent,
}

/// Drives [`MapPhase`] and remembers the last fetch error.
#[derive(Debug)]
pub struct MapMachine {
    phase: MapPhase,
    error: Option<String>,
}

impl Default for MapMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MapMachine {
    pub const fn new() -> Self {
        Self {
            phase: MapPhase::Loading,
            error: None,
        }
    }

    pub const fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the heat layer is on screen.
    pub const fn shows_map(&self) -> bool {
        matches!(self.phase, MapPhase::Ready | MapPhase::Interacting)
    }

    pub fn process_event(&mut self, event: &MapEvent) -> Result<(), PhaseTransitionError> {
        let next = NextPhase::try_from((self.phase, event))?;

        match event {
            MapEvent::FetchFailed(message) => self.error = Some(message.clone()),
            MapEvent::Retry | MapEvent::FetchSucceeded => self.error = None,
            MapEvent::GestureStart | MapEvent::GestureEnd => {}
        }
        self.phase = next.0;
        Ok(())
    }
}

struct NextPhase(MapPhase);

impl TryFrom<(MapPhase, &MapEvent)> for NextPhase {
    type Error = PhaseTransitionError;

    fn try_from(value: (MapPhase, &MapEvent)) -> Result<Self, Self::Error> {
        let (phase, event) = value;

        match (phase, event) {
            (MapPhase::Loading, MapEvent::FetchSucceeded) => Ok(Self(MapPhase::Ready)),
            (MapPhase::Loading, MapEvent::FetchFailed(_)) => Ok(Self(MapPhase::Error)),
            (MapPhase::Error, MapEvent::Retry) => Ok(Self(MapPhase::Loading)),
            (MapPhase::Ready | MapPhase::Interacting, MapEvent::GestureStart) => {
                Ok(Self(MapPhase::Interacting))
            }
            (MapPhase::Interacting, MapEvent::GestureEnd) => Ok(Self(MapPhase::Ready)),
            _ => Err(PhaseTransitionError {
                from: phase,
                event: event.clone(),
            }),
        }
    }
}
