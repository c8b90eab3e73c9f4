//! Artifact write modes.

use serde::{Deserialize, Serialize};

/// How an artifact writer treats existing content for a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactBehavior {
    /// Every write replaces the artifact wholesale.
    Replace,
    /// Sub-stages accumulate into one running document.
    AppendOnly,
}

impl ArtifactBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::AppendOnly => "APPEND_ONLY",
        }
    }
}

impl std::fmt::Display for ArtifactBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
