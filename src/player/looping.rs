/// Looping behaviour for a player.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopState {
    /// Sound will loop endlessly until loop state is changed or
    /// playback is manually stopped.
    Infinite,

    /// Sound will loop `n` more times.
    ///
    /// `Finite(0)` is the `Default`, stopping playback once the file ends.
    Finite(usize),
}

impl Default for LoopState {
    fn default() -> Self {
        Self::Finite(0)
    }
}

impl From<bool> for LoopState {
    fn from(looping: bool) -> Self {
        if looping {
            Self::Infinite
        } else {
            Self::default()
        }
    }
}

impl LoopState {
    /// Returns whether playback will restart at least once more.
    #[must_use]
    pub fn is_looping(self) -> bool {
        !matches!(self, Self::Finite(0))
    }
}
