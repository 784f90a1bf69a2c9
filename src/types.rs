//! Shared value types for the editing session

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete state of the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No image loaded
    #[default]
    Empty,
    /// Original present, no result yet
    Loaded,
    /// Background-removed result present
    Processed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Loaded => write!(f, "loaded"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

/// User-initiated action dispatched to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Load,
    RemoveBackground,
    Save,
    Clear,
}

impl Action {
    /// All actions, in the order a presentation layer usually lays them out
    pub const ALL: [Action; 4] = [
        Action::Load,
        Action::RemoveBackground,
        Action::Save,
        Action::Clear,
    ];

    /// Whether this action may be dispatched while the session is in `phase`
    #[must_use]
    pub fn is_permitted_in(self, phase: Phase) -> bool {
        match self {
            Self::Load | Self::Clear => true,
            Self::RemoveBackground => matches!(phase, Phase::Loaded | Phase::Processed),
            Self::Save => phase == Phase::Processed,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load an image"),
            Self::RemoveBackground => write!(f, "remove the background"),
            Self::Save => write!(f, "save the result"),
            Self::Clear => write!(f, "clear the session"),
        }
    }
}

/// Which actions the presentation layer should currently enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ActionSet {
    pub load: bool,
    pub remove_background: bool,
    pub save: bool,
    pub clear: bool,
}

impl ActionSet {
    #[must_use]
    pub fn for_phase(phase: Phase) -> Self {
        Self {
            load: Action::Load.is_permitted_in(phase),
            remove_background: Action::RemoveBackground.is_permitted_in(phase),
            save: Action::Save.is_permitted_in(phase),
            clear: Action::Clear.is_permitted_in(phase),
        }
    }

    #[must_use]
    pub fn contains(&self, action: Action) -> bool {
        match action {
            Action::Load => self.load,
            Action::RemoveBackground => self.remove_background,
            Action::Save => self.save,
            Action::Clear => self.clear,
        }
    }

    /// Enabled actions in display order
    pub fn enabled(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

/// Image slot of the session rendered by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Original,
    Result,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Result => write!(f, "result"),
        }
    }
}

/// Width and height of a fit box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FitBox {
    pub width: u32,
    pub height: u32,
}

impl FitBox {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a `WIDTHxHEIGHT` string such as `400x300`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (w, h) = value.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        Some(Self { width, height })
    }
}

impl Default for FitBox {
    fn default() -> Self {
        Self::new(400, 400)
    }
}

impl fmt::Display for FitBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
