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

//! The save record: a JSON object holding the board and game metadata.
//!
//! Reading is forgiving. A field that is missing or has the wrong shape
//! falls back to its value in a new game and the rest of the record is
//! still used. Only text that is not JSON at all is an error.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::{
    BoardResult, Color, DisplayPrefs, File, GameConfig, GameState, Pair, Piece, PieceKind,
    Position, Rank, Square,
};

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Save record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column/row coordinates, row 0 being rank 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: usize,
    pub y: usize,
}

impl Coords {
    pub fn to_square(self) -> Option<Square> {
        Square::from_coords(self.x, self.y)
    }
}

impl From<Square> for Coords {
    fn from(square: Square) -> Self {
        Self {
            x: square.x(),
            y: square.y(),
        }
    }
}

/// One value per color, keyed `"0"` (White) and `"1"` (Black).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByColor<T> {
    #[serde(rename = "0")]
    pub white: T,
    #[serde(rename = "1")]
    pub black: T,
}

impl<T> From<ByColor<T>> for Pair<T> {
    fn from(value: ByColor<T>) -> Self {
        Pair::new(value.white, value.black)
    }
}

impl<T> From<Pair<T>> for ByColor<T> {
    fn from(value: Pair<T>) -> Self {
        let (white, black) = value.into_tuple();
        Self { white, black }
    }
}

/// A board cell or captured piece. `type` is written as the piece
/// letter; the full piece name is accepted when reading, and older saves
/// that only carry `symbol` are read through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRecord {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub color: u8,
    #[serde(default)]
    pub has_moved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl PieceRecord {
    pub fn to_piece(&self) -> Option<Piece> {
        let kind = PieceKind::from_str(&self.kind).ok().or_else(|| {
            self.symbol
                .as_deref()
                .and_then(|symbol| PieceKind::from_str(symbol).ok())
        })?;
        let piece = Piece::new(Color::from_index(self.color as usize)?, kind);
        Some(if self.has_moved { piece.moved() } else { piece })
    }
}

impl From<Piece> for PieceRecord {
    fn from(piece: Piece) -> Self {
        Self {
            kind: piece.kind().to_string(),
            color: piece.color().to_index() as u8,
            has_moved: piece.has_moved(),
            symbol: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    #[serde(default, deserialize_with = "lenient_board")]
    pub board: Option<Vec<Vec<Option<PieceRecord>>>>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_player: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub move_history: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_captured")]
    pub captured_pieces: Option<ByColor<Vec<PieceRecord>>>,
    #[serde(default, deserialize_with = "lenient")]
    pub timers: Option<ByColor<u32>>,
    #[serde(default, deserialize_with = "lenient")]
    pub game_over: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub check: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub en_passant: Option<Option<Coords>>,
    #[serde(default, deserialize_with = "lenient")]
    pub promotion_pending: Option<Option<Coords>>,
    #[serde(default, deserialize_with = "lenient")]
    pub result: Option<Option<BoardResult>>,
    #[serde(default, deserialize_with = "lenient")]
    pub board_flipped: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub fog_of_war: Option<bool>,
}

/// A field that does not parse reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            warn!("ignoring malformed save record field: {}", err);
            Ok(None)
        }
    }
}

/// A piece that does not parse reads as an empty cell.
fn lenient_piece(value: Value) -> Option<PieceRecord> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(piece) => Some(piece),
        Err(err) => {
            warn!("ignoring malformed save record piece: {}", err);
            None
        }
    }
}

/// Board rows read cell by cell, so one bad cell does not cost the board.
fn lenient_board<'de, D>(deserializer: D) -> Result<Option<Vec<Vec<Option<PieceRecord>>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Option<Vec<Vec<Value>>> = lenient(deserializer)?;
    Ok(rows.map(|rows| {
        rows.into_iter()
            .map(|row| row.into_iter().map(lenient_piece).collect())
            .collect()
    }))
}

fn lenient_captured<'de, D>(deserializer: D) -> Result<Option<ByColor<Vec<PieceRecord>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let captured: Option<ByColor<Vec<Value>>> = lenient(deserializer)?;
    let pieces = |values: Vec<Value>| -> Vec<PieceRecord> {
        values.into_iter().filter_map(lenient_piece).collect()
    };
    Ok(captured.map(|captured| ByColor {
        white: pieces(captured.white),
        black: pieces(captured.black),
    }))
}

fn fallback<T>(field: &str, value: Option<T>, default: T) -> T {
    value.unwrap_or_else(|| {
        warn!("save record has no usable `{}`, using the default", field);
        default
    })
}

fn position_from_rows(rows: &[Vec<Option<PieceRecord>>]) -> Option<Position> {
    if rows.len() != 8 || rows.iter().any(|row| row.len() != 8) {
        return None;
    }
    let mut position = Position::empty();
    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let Some(cell) = cell else {
                continue;
            };
            match (cell.to_piece(), Square::from_coords(x, y)) {
                (Some(piece), Some(square)) => {
                    position.place(square, piece);
                }
                _ => warn!("dropping unreadable piece {:?} at {},{}", cell, x, y),
            }
        }
    }
    Some(position)
}

fn pieces_from_records(records: Vec<PieceRecord>) -> Vec<Piece> {
    records.iter().filter_map(PieceRecord::to_piece).collect()
}

/// Result of a finished game saved without one: an expired clock
/// first, then checkmate if the side to move was in check.
fn infer_result(timers: &Pair<u32>, check: bool, turn: Color) -> BoardResult {
    if let Some(loser) = Color::iter().find(|&color| timers[color] == 0) {
        BoardResult::TimeExpired(loser)
    } else if check {
        BoardResult::CheckMate(!turn)
    } else {
        BoardResult::StaleMate
    }
}

impl From<&GameState> for SaveRecord {
    fn from(state: &GameState) -> Self {
        let board = Rank::iter()
            .map(|rank| {
                File::iter()
                    .map(|file| state.position[Square::new(file, rank)].map(PieceRecord::from))
                    .collect()
            })
            .collect();
        let captured = state.captured.clone().into_tuple();
        Self {
            board: Some(board),
            current_player: Some(state.turn.to_index() as u8),
            move_history: Some(state.history.clone()),
            captured_pieces: Some(ByColor {
                white: captured.0.into_iter().map(PieceRecord::from).collect(),
                black: captured.1.into_iter().map(PieceRecord::from).collect(),
            }),
            timers: Some(state.timers.into()),
            game_over: Some(state.result.is_some()),
            check: Some(state.check),
            en_passant: Some(state.en_passant.map(Coords::from)),
            promotion_pending: Some(state.promotion.map(Coords::from)),
            result: Some(state.result),
            board_flipped: Some(state.display.board_flipped),
            fog_of_war: Some(state.display.fog_of_war),
        }
    }
}

impl From<GameState> for SaveRecord {
    fn from(state: GameState) -> Self {
        Self::from(&state)
    }
}

impl From<SaveRecord> for GameState {
    fn from(record: SaveRecord) -> Self {
        Self::restore(GameConfig::default(), record)
    }
}

impl GameState {
    pub fn to_record(&self) -> SaveRecord {
        SaveRecord::from(self)
    }

    /// Restores a game saved with `to_record`, using default settings.
    pub fn from_record(record: SaveRecord) -> Self {
        Self::from(record)
    }

    /// Restores a game under `config`. Settings are not part of the
    /// record; everything else comes from it where readable.
    pub fn restore(config: GameConfig, record: SaveRecord) -> Self {
        let defaults = GameState::with_config(config);

        let position = match record.board {
            Some(rows) => position_from_rows(&rows).unwrap_or_else(|| {
                warn!("save record board is not 8x8, using the starting position");
                defaults.position
            }),
            None => fallback("board", None, defaults.position),
        };
        let turn = fallback(
            "currentPlayer",
            record
                .current_player
                .and_then(|index| Color::from_index(index as usize)),
            defaults.turn,
        );
        let history = fallback("moveHistory", record.move_history, defaults.history);
        let captured = match record.captured_pieces {
            Some(captured) => Pair::new(
                pieces_from_records(captured.white),
                pieces_from_records(captured.black),
            ),
            None => fallback("capturedPieces", None, defaults.captured),
        };
        let timers = fallback("timers", record.timers.map(Pair::from), defaults.timers);
        let check = record
            .check
            .unwrap_or_else(|| position.is_in_check(turn));
        let en_passant = record
            .en_passant
            .flatten()
            .and_then(Coords::to_square);
        let promotion = record
            .promotion_pending
            .flatten()
            .and_then(Coords::to_square)
            .filter(|&square| {
                let valid = matches!(
                    position[square],
                    Some(piece) if piece.color() == turn && piece.should_promote(square)
                );
                if !valid {
                    warn!("save record promotion at {} has no pawn to promote", square);
                }
                valid
            });
        let result = match record.result.flatten() {
            Some(result) => Some(result),
            None if record.game_over.unwrap_or(false) => Some(infer_result(&timers, check, turn)),
            None => None,
        };
        let display = DisplayPrefs {
            board_flipped: record
                .board_flipped
                .unwrap_or(defaults.display.board_flipped),
            fog_of_war: record.fog_of_war.unwrap_or(defaults.display.fog_of_war),
        };

        let mut state = GameState {
            config,
            position,
            turn,
            en_passant,
            promotion,
            history,
            captured,
            check,
            result,
            selection: None,
            visible: Pair::default(),
            timers,
            display,
        };
        state.refresh_visibility();
        state
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json(text: &str) -> Result<Self, RecordError> {
        let record: SaveRecord = serde_json::from_str(text)?;
        Ok(Self::from_record(record))
    }
}
