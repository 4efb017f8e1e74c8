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

use super::material::Color;
use super::position::Position;
use super::square::{Mask, Square};

impl Position {
    /// Squares revealed to `viewer` under fog of war: every square it
    /// occupies plus every pseudo-legal destination of its pieces. A
    /// pinned piece still reveals what it threatens.
    pub fn visible_squares(&self, viewer: Color, en_passant: Option<Square>) -> Mask {
        let own = self.pieces(viewer);
        own.iter().fold(own, |mut visible, from| {
            visible |= self.pseudo_legal_moves(from, en_passant).destinations();
            visible
        })
    }
}
