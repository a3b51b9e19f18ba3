// Divercite domain types
// Pieces, coordinates, inventories and the light action representation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of resource pieces of each colour a player starts with
pub const RESOURCES_PER_COLOR: u8 = 3;
/// Number of city pieces of each colour a player starts with
pub const CITIES_PER_COLOR: u8 = 2;

/// The four piece colours
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Single-letter code used in piece names ("RC", "GR", ...)
    pub fn code(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
        }
    }

    pub fn from_code(code: char) -> Option<Color> {
        match code.to_ascii_uppercase() {
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'B' => Some(Color::Blue),
            'Y' => Some(Color::Yellow),
            _ => None,
        }
    }
}

/// Whether a piece is a resource or a city
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Role {
    Resource,
    City,
}

impl Role {
    pub fn code(self) -> char {
        match self {
            Role::Resource => 'R',
            Role::City => 'C',
        }
    }
}

/// Colour + role, the unit counted in inventories
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct PieceType {
    pub color: Color,
    pub role: Role,
}

impl PieceType {
    pub const fn new(color: Color, role: Role) -> Self {
        PieceType { color, role }
    }

    /// All eight piece types in inventory order
    pub fn all() -> [PieceType; 8] {
        let mut out = [PieceType::new(Color::Red, Role::Resource); 8];
        for color in Color::ALL {
            out[color.index() * 2] = PieceType::new(color, Role::Resource);
            out[color.index() * 2 + 1] = PieceType::new(color, Role::City);
        }
        out
    }

    pub fn index(self) -> usize {
        self.color.index() * 2 + self.role as usize
    }

    pub fn is_city(self) -> bool {
        self.role == Role::City
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.code(), self.role.code())
    }
}

impl FromStr for PieceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (c, r) = match (chars.next(), chars.next(), chars.next()) {
            (Some(c), Some(r), None) => (c, r),
            _ => return Err(format!("Invalid piece type: {}", s)),
        };
        let color = Color::from_code(c).ok_or_else(|| format!("Invalid piece colour: {}", s))?;
        let role = match r.to_ascii_uppercase() {
            'R' => Role::Resource,
            'C' => Role::City,
            _ => return Err(format!("Invalid piece role: {}", s)),
        };
        Ok(PieceType::new(color, role))
    }
}

/// The two seats at the table. White always moves first.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Player {
    White,
    Black,
}

impl Player {
    pub fn all() -> [Player; 2] {
        [Player::White, Player::Black]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::White => "white",
            Player::Black => "black",
        }
    }
}

/// A placed piece: what it is and who owns it
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Piece {
    pub piece_type: PieceType,
    pub owner: Player,
}

impl Piece {
    pub fn new(piece_type: PieceType, owner: Player) -> Self {
        Piece { piece_type, owner }
    }

    pub fn color(&self) -> Color {
        self.piece_type.color
    }

    pub fn is_city(&self) -> bool {
        self.piece_type.is_city()
    }
}

/// Board coordinate as (row, column)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The four diagonal cells, which on this board hold cells of the same kind
    pub fn diagonals(&self) -> [Coord; 4] {
        [
            Coord::new(self.x - 1, self.y - 1),
            Coord::new(self.x - 1, self.y + 1),
            Coord::new(self.x + 1, self.y - 1),
            Coord::new(self.x + 1, self.y + 1),
        ]
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal neighbour directions
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub fn all() -> [Direction; 4] {
        [Direction::Top, Direction::Bottom, Direction::Left, Direction::Right]
    }

    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Top => Coord::new(coord.x - 1, coord.y),
            Direction::Bottom => Coord::new(coord.x + 1, coord.y),
            Direction::Left => Coord::new(coord.x, coord.y - 1),
            Direction::Right => Coord::new(coord.x, coord.y + 1),
        }
    }
}

/// Remaining pieces of one player, indexed by `PieceType::index`
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inventory {
    counts: [u8; 8],
}

impl Inventory {
    /// Full starting set: 3 resources and 2 cities per colour
    pub fn starting() -> Self {
        let mut counts = [0u8; 8];
        for pt in PieceType::all() {
            counts[pt.index()] = match pt.role {
                Role::Resource => RESOURCES_PER_COLOR,
                Role::City => CITIES_PER_COLOR,
            };
        }
        Inventory { counts }
    }

    pub fn from_counts(counts: [u8; 8]) -> Self {
        Inventory { counts }
    }

    pub fn get(&self, piece_type: PieceType) -> u8 {
        self.counts[piece_type.index()]
    }

    pub fn has(&self, piece_type: PieceType) -> bool {
        self.get(piece_type) > 0
    }

    /// Copy of this inventory with one piece of `piece_type` removed
    pub fn without(&self, piece_type: PieceType) -> Inventory {
        let mut counts = self.counts;
        counts[piece_type.index()] = counts[piece_type.index()].saturating_sub(1);
        Inventory { counts }
    }

    /// Copy of this inventory with `piece_type` set to `count`
    pub fn with_count(&self, piece_type: PieceType, count: u8) -> Inventory {
        let mut counts = self.counts;
        counts[piece_type.index()] = count;
        Inventory { counts }
    }

    /// Per-colour counts for one role, in `Color::ALL` order
    pub fn by_color(&self, role: Role) -> [u8; 4] {
        let mut out = [0u8; 4];
        for color in Color::ALL {
            out[color.index()] = self.get(PieceType::new(color, role));
        }
        out
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_untouched(&self) -> bool {
        *self == Inventory::starting()
    }
}

/// A candidate move: the piece to place and where
///
/// Light actions are detached from any state, so they are cheap to enumerate
/// and rank. See `game::HeavyAction` for the state-bound form.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightAction {
    Resource { color: Color, at: Coord },
    City { color: Color, at: Coord },
}

impl LightAction {
    pub fn new(piece_type: PieceType, at: Coord) -> Self {
        match piece_type.role {
            Role::Resource => LightAction::Resource { color: piece_type.color, at },
            Role::City => LightAction::City { color: piece_type.color, at },
        }
    }

    pub fn color(&self) -> Color {
        match *self {
            LightAction::Resource { color, .. } | LightAction::City { color, .. } => color,
        }
    }

    pub fn at(&self) -> Coord {
        match *self {
            LightAction::Resource { at, .. } | LightAction::City { at, .. } => at,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            LightAction::Resource { .. } => Role::Resource,
            LightAction::City { .. } => Role::City,
        }
    }

    pub fn piece_type(&self) -> PieceType {
        PieceType::new(self.color(), self.role())
    }

    pub fn is_city(&self) -> bool {
        self.role() == Role::City
    }
}

impl fmt::Display for LightAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.piece_type(), self.at())
    }
}
