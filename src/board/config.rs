// Copyright 2026 The fog-chess Authors
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use serde::{Deserialize, Serialize};

/// How strictly castling is checked against attacked squares.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CastlingRule {
    /// Only the king's destination must be safe, which is what the
    /// self-check simulation already enforces. Castling out of check or
    /// across an attacked square is allowed.
    #[default]
    Permissive,
    /// The king may not castle while in check, nor across an attacked
    /// square.
    Strict,
}

/// Settings fixed when a game is created. Not part of the save record.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct GameConfig {
    pub castling: CastlingRule,
    /// Initial per-side clock, in seconds.
    pub clock_seconds: u32,
    pub fog_of_war: bool,
    pub board_flipped: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            castling: CastlingRule::Permissive,
            clock_seconds: 600,
            fog_of_war: true,
            board_flipped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"castling": "Strict"}"#).unwrap();
        assert_eq!(config.castling, CastlingRule::Strict);
        assert_eq!(config.clock_seconds, 600);
        assert!(config.fog_of_war);
    }
}
