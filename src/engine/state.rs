use serde::Serialize;
use std::fmt;

/// Lifecycle of a [`PrefixIndex`](super::PrefixIndex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndexState {
    /// No build has been requested yet
    NotBuilt,
    /// First build running, nothing searchable
    Building,
    /// A snapshot is published
    Ready,
    /// A rebuild is running while the previous snapshot stays searchable
    Rebuilding,
    /// The first build was cancelled; terminal until the next build
    Aborted,
}

impl IndexState {
    /// Whether searches see a published snapshot
    pub fn is_ready(self) -> bool {
        matches!(self, IndexState::Ready | IndexState::Rebuilding)
    }

    /// Whether a build worker is expected to publish
    pub fn is_building(self) -> bool {
        matches!(self, IndexState::Building | IndexState::Rebuilding)
    }

    /// State entered when a build starts from this one
    pub fn on_build_started(self) -> Self {
        if self.is_ready() {
            IndexState::Rebuilding
        } else {
            IndexState::Building
        }
    }

    /// State entered when the running build is cancelled
    pub fn on_build_cancelled(self) -> Self {
        match self {
            IndexState::Building => IndexState::Aborted,
            IndexState::Rebuilding => IndexState::Ready,
            other => other,
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexState::NotBuilt => "not built",
            IndexState::Building => "building",
            IndexState::Ready => "ready",
            IndexState::Rebuilding => "rebuilding",
            IndexState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(IndexState::NotBuilt.on_build_started(), IndexState::Building);
        assert_eq!(IndexState::Aborted.on_build_started(), IndexState::Building);
        assert_eq!(IndexState::Ready.on_build_started(), IndexState::Rebuilding);

        assert_eq!(IndexState::Building.on_build_cancelled(), IndexState::Aborted);
        assert_eq!(IndexState::Rebuilding.on_build_cancelled(), IndexState::Ready);
        assert_eq!(IndexState::Ready.on_build_cancelled(), IndexState::Ready);
    }

    #[test]
    fn test_readiness() {
        assert!(IndexState::Ready.is_ready());
        assert!(IndexState::Rebuilding.is_ready());
        assert!(!IndexState::Building.is_ready());
        assert!(!IndexState::Aborted.is_ready());
    }
}
