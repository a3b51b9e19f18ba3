// Divercite rules engine
//
// Board geometry, legal move generation, successor states and scoring.
// States are values: applying an action always produces a new GameState and
// never touches the predecessor, so the search can branch freely from any node.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::search::SearchState;
use crate::types::{Color, Coord, Direction, Inventory, LightAction, Piece, PieceType, Player};

/// Side length of the square grid the diamond board is drawn on
pub const BOARD_SIZE: i32 = 9;
/// Row/column of the centre cell
pub const CENTER: i32 = 4;
/// Points a city earns when its four neighbours show four distinct colours
pub const DIVERCITE_POINTS: i32 = 5;

/// True when `at` lies inside the diamond
pub fn on_board(at: Coord) -> bool {
    (at.x - CENTER).abs() + (at.y - CENTER).abs() <= CENTER
}

/// City cells sit on odd `x + y`, alternating with resource cells
pub fn is_city_cell(at: Coord) -> bool {
    on_board(at) && (at.x + at.y).rem_euclid(2) == 1
}

pub fn is_resource_cell(at: Coord) -> bool {
    on_board(at) && (at.x + at.y).rem_euclid(2) == 0
}

/// All on-board cells in row-major order
pub fn all_cells() -> impl Iterator<Item = Coord> {
    (0..BOARD_SIZE)
        .flat_map(|x| (0..BOARD_SIZE).map(move |y| Coord::new(x, y)))
        .filter(|&c| on_board(c))
}

/// Content of a neighbouring cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Outside,
    Empty,
    Occupied(Piece),
}

impl Cell {
    pub fn piece(&self) -> Option<Piece> {
        match self {
            Cell::Occupied(piece) => Some(*piece),
            _ => None,
        }
    }
}

/// One orthogonal neighbour of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub direction: Direction,
    pub cell: Cell,
    pub at: Coord,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PlacedPiece {
    pub at: Coord,
    pub piece: Piece,
}

/// Sparse board: only occupied cells are stored
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "Vec<PlacedPiece>", into = "Vec<PlacedPiece>")]
pub struct Board {
    cells: HashMap<Coord, Piece>,
}

impl From<Vec<PlacedPiece>> for Board {
    fn from(pieces: Vec<PlacedPiece>) -> Self {
        Board {
            cells: pieces.into_iter().map(|p| (p.at, p.piece)).collect(),
        }
    }
}

impl From<Board> for Vec<PlacedPiece> {
    fn from(board: Board) -> Self {
        let mut pieces: Vec<PlacedPiece> = board
            .cells
            .into_iter()
            .map(|(at, piece)| PlacedPiece { at, piece })
            .collect();
        pieces.sort_by_key(|p| p.at);
        pieces
    }
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn get(&self, at: Coord) -> Option<&Piece> {
        self.cells.get(&at)
    }

    pub fn cell(&self, at: Coord) -> Cell {
        if !on_board(at) {
            return Cell::Outside;
        }
        match self.cells.get(&at) {
            Some(piece) => Cell::Occupied(*piece),
            None => Cell::Empty,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.cells.iter().map(|(&at, &piece)| (at, piece))
    }

    pub fn cities(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.iter().filter(|(_, piece)| piece.is_city())
    }

    /// Places a piece without any rule checks. Used by the engine and by
    /// scenario builders.
    pub fn place(&mut self, at: Coord, piece: Piece) {
        self.cells.insert(at, piece);
    }

    pub fn neighbors(&self, at: Coord) -> [Neighbor; 4] {
        Direction::all().map(|direction| {
            let n = direction.apply(&at);
            Neighbor {
                direction,
                cell: self.cell(n),
                at: n,
            }
        })
    }

    /// Colours of the occupied orthogonal neighbours of `at`
    pub fn neighbor_colors(&self, at: Coord) -> Vec<Color> {
        self.neighbors(at)
            .iter()
            .filter_map(|n| n.cell.piece())
            .map(|p| p.color())
            .collect()
    }

    /// Points the city at `at` currently earns its owner
    pub fn city_points(&self, at: Coord, city: &Piece) -> i32 {
        let colors = self.neighbor_colors(at);
        if colors.len() == 4 && distinct_count(&colors) == 4 {
            return DIVERCITE_POINTS;
        }
        colors.iter().filter(|&&c| c == city.color()).count() as i32
    }

    pub fn is_divercity(&self, at: Coord) -> bool {
        let colors = self.neighbor_colors(at);
        colors.len() == 4 && distinct_count(&colors) == 4
    }
}

/// Number of distinct colours in a list
pub fn distinct_count(colors: &[Color]) -> usize {
    let mut seen = [false; 4];
    for c in colors {
        seen[c.index()] = true;
    }
    seen.iter().filter(|&&s| s).count()
}

/// Final result of a finished game
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Player),
    Draw,
}

/// Complete game position
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    inventories: [Inventory; 2],
    scores: [i32; 2],
    to_move: Player,
    step: u32,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl GameState {
    /// Empty board, full inventories, White to move
    pub fn new() -> Self {
        GameState {
            board: Board::new(),
            inventories: [Inventory::starting(); 2],
            scores: [0, 0],
            to_move: Player::White,
            step: 0,
        }
    }

    /// Builds an arbitrary position. Scores are recomputed from the board.
    pub fn from_parts(board: Board, inventories: [Inventory; 2], to_move: Player) -> Self {
        let mut scores = [0i32; 2];
        for (at, city) in board.cities() {
            scores[city.owner.index()] += board.city_points(at, &city);
        }
        let step = board.len() as u32;
        GameState {
            board,
            inventories,
            scores,
            to_move,
            step,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn inventory(&self, player: Player) -> &Inventory {
        &self.inventories[player.index()]
    }

    pub fn scores(&self) -> [i32; 2] {
        self.scores
    }

    pub fn score(&self, player: Player) -> i32 {
        self.scores[player.index()]
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn neighbors(&self, at: Coord) -> [Neighbor; 4] {
        self.board.neighbors(at)
    }

    /// Cities on the four diagonal cells of `at`
    pub fn diagonal_cities(&self, at: Coord) -> Vec<Piece> {
        at.diagonals()
            .iter()
            .filter_map(|&d| self.board.get(d).copied())
            .filter(|p| p.is_city())
            .collect()
    }

    pub fn is_legal(&self, action: &LightAction) -> bool {
        let at = action.at();
        let cell_ok = if action.is_city() {
            is_city_cell(at)
        } else {
            is_resource_cell(at)
        };
        cell_ok
            && self.board.get(at).is_none()
            && self.inventory(self.to_move).has(action.piece_type())
    }

    /// Every legal light action for the player to move, in a fixed order
    /// (piece type, then row-major cell)
    pub fn legal_actions(&self) -> Vec<LightAction> {
        let inventory = self.inventory(self.to_move);
        let mut actions = Vec::new();
        for pt in PieceType::all() {
            if !inventory.has(pt) {
                continue;
            }
            for at in all_cells() {
                let fits = if pt.is_city() {
                    is_city_cell(at)
                } else {
                    is_resource_cell(at)
                };
                if fits && self.board.get(at).is_none() {
                    actions.push(LightAction::new(pt, at));
                }
            }
        }
        actions
    }

    /// Binds a light action to this state
    pub fn heavy(&self, action: LightAction) -> HeavyAction<'_> {
        HeavyAction {
            predecessor: self,
            action,
        }
    }

    pub fn heavy_actions(&self) -> impl Iterator<Item = HeavyAction<'_>> + '_ {
        self.legal_actions().into_iter().map(move |a| self.heavy(a))
    }

    pub fn is_terminal(&self) -> bool {
        let exhausted = self.inventories.iter().all(|inv| inv.is_empty());
        exhausted || self.legal_actions().is_empty()
    }

    pub fn divercity_count(&self, player: Player) -> usize {
        self.board
            .cities()
            .filter(|(at, city)| city.owner == player && self.board.is_divercity(*at))
            .count()
    }

    /// Result of a finished game; `None` while play continues
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_terminal() {
            return None;
        }
        Some(self.leader())
    }

    /// Who is ahead right now: score first, then divercity count
    pub fn leader(&self) -> Outcome {
        let (white, black) = (self.score(Player::White), self.score(Player::Black));
        if white != black {
            return Outcome::Winner(if white > black { Player::White } else { Player::Black });
        }
        let (dw, db) = (
            self.divercity_count(Player::White),
            self.divercity_count(Player::Black),
        );
        if dw != db {
            return Outcome::Winner(if dw > db { Player::White } else { Player::Black });
        }
        Outcome::Draw
    }

    fn successor(&self, action: LightAction) -> GameState {
        let mover = self.to_move;
        let at = action.at();
        let mut next = self.clone();

        let affected: Vec<Coord> = if action.is_city() {
            vec![at]
        } else {
            self.board
                .neighbors(at)
                .iter()
                .filter(|n| n.cell.piece().map_or(false, |p| p.is_city()))
                .map(|n| n.at)
                .collect()
        };

        next.board.place(at, Piece::new(action.piece_type(), mover));

        for city_at in affected {
            if let Some(city) = next.board.get(city_at).copied() {
                let before = if city_at == at {
                    0
                } else {
                    self.board.city_points(city_at, &city)
                };
                let after = next.board.city_points(city_at, &city);
                next.scores[city.owner.index()] += after - before;
            }
        }

        next.inventories[mover.index()] = self.inventories[mover.index()].without(action.piece_type());
        next.to_move = mover.opponent();
        next.step += 1;
        next
    }
}

/// A light action bound to the state it is played from
#[derive(Debug, Clone, Copy)]
pub struct HeavyAction<'s> {
    predecessor: &'s GameState,
    action: LightAction,
}

impl<'s> HeavyAction<'s> {
    pub fn light(&self) -> LightAction {
        self.action
    }

    pub fn predecessor(&self) -> &'s GameState {
        self.predecessor
    }

    pub fn next_state(&self) -> GameState {
        self.predecessor.successor(self.action)
    }
}

impl SearchState for GameState {
    type Action = LightAction;

    fn legal_actions(&self) -> Vec<LightAction> {
        GameState::legal_actions(self)
    }

    fn successor(&self, action: &LightAction) -> GameState {
        self.heavy(*action).next_state()
    }

    fn is_terminal(&self) -> bool {
        GameState::is_terminal(self)
    }
}
