//! Navigation side channel used by the guard and the sign-in flow.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Client-side transition that adds a history entry.
    Push,
    /// Client-side transition that replaces the current history entry.
    Replace,
    /// Full reload, re-evaluating every guard and layout.
    Hard,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Replace => "replace",
            Self::Hard => "hard",
        })
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str, mode: NavigationMode);
}
