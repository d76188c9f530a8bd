//! Pointer interaction modes

use orbitview_core::{Error, Result, Rotation3f};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How pointer drags are interpreted. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Orbit the camera around its target
    #[default]
    Arcball,
    /// Pan camera and target together
    Fly,
    /// Rotate the asset about its bounding-box center
    Model,
    /// Rotate the sun direction
    Sun,
    /// Rotate the skymap
    Environment,
}

/// Pointer shape the shell should show for a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorHint {
    Arrow,
    Crosshair,
}

impl InteractionMode {
    /// Modes in the order the sidebar lists them
    pub const ALL: [InteractionMode; 5] = [
        InteractionMode::Arcball,
        InteractionMode::Fly,
        InteractionMode::Model,
        InteractionMode::Sun,
        InteractionMode::Environment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InteractionMode::Arcball => "Arcball",
            InteractionMode::Fly => "Fly",
            InteractionMode::Model => "Model",
            InteractionMode::Sun => "Sun",
            InteractionMode::Environment => "Environment",
        }
    }

    pub fn cursor(&self) -> CursorHint {
        match self {
            InteractionMode::Model | InteractionMode::Sun => CursorHint::Crosshair,
            _ => CursorHint::Arrow,
        }
    }
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InteractionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidData(format!("unknown interaction mode '{}'", s)))
    }
}

/// Effect of one drag update.
///
/// Camera modes mutate the controller's pose directly; the others hand back
/// a delta that the caller applies to the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    Camera,
    ModelRotation(Rotation3f),
    SunRotation(Rotation3f),
    /// Yaw about world +Y, in radians
    EnvironmentRotation(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_hints() {
        assert_eq!(InteractionMode::Model.cursor(), CursorHint::Crosshair);
        assert_eq!(InteractionMode::Sun.cursor(), CursorHint::Crosshair);
        assert_eq!(InteractionMode::Arcball.cursor(), CursorHint::Arrow);
        assert_eq!(InteractionMode::Environment.cursor(), CursorHint::Arrow);
    }

    #[test]
    fn test_labels_round_trip() {
        for mode in InteractionMode::ALL {
            assert_eq!(mode.label().parse::<InteractionMode>().unwrap(), mode);
        }
        assert_eq!(" fly ".parse::<InteractionMode>().unwrap(), InteractionMode::Fly);
        assert!("orbit".parse::<InteractionMode>().is_err());
    }
}
