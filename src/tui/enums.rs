//! Enumerations for TUI state management.

use crate::fields::Quadrant;

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Matrix,
    Help,
    Confirm,
}

/// The five panes of the matrix screen, in focus order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pane {
    Suggested,
    Quadrant(Quadrant),
}

impl Pane {
    pub const ALL: [Pane; 5] = [
        Pane::Suggested,
        Pane::Quadrant(Quadrant::Do),
        Pane::Quadrant(Quadrant::Schedule),
        Pane::Quadrant(Quadrant::Delegate),
        Pane::Quadrant(Quadrant::Eliminate),
    ];

    /// Position in [`Pane::ALL`].
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    /// Next pane in focus order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous pane in focus order, wrapping around.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            Pane::Suggested => "Suggested",
            Pane::Quadrant(Quadrant::Do) => "Do: urgent & important",
            Pane::Quadrant(Quadrant::Schedule) => "Schedule: important",
            Pane::Quadrant(Quadrant::Delegate) => "Delegate: urgent",
            Pane::Quadrant(Quadrant::Eliminate) => "Eliminate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_cycles_through_every_pane() {
        let mut p = Pane::Suggested;
        for _ in 0..Pane::ALL.len() {
            p = p.next();
        }
        assert_eq!(p, Pane::Suggested);
        assert_eq!(Pane::Suggested.prev(), Pane::Quadrant(Quadrant::Eliminate));
        assert_eq!(Pane::Quadrant(Quadrant::Do).prev(), Pane::Suggested);
    }
}
