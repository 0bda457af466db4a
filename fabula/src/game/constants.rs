/// Cards held by each player after a deal or refill.
pub const HAND_SIZE: usize = 6;

/// A player reaching this many points ends the game.
pub const WINNING_SCORE: u32 = 30;

/// Fewest players needed to start a game. Two players would make every
/// round either all-correct or none-correct.
pub const MIN_PLAYERS: usize = 3;

pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Bounds on the trimmed hint length, in characters.
pub const MIN_HINT_LENGTH: usize = 2;
pub const MAX_HINT_LENGTH: usize = 100;

pub const MAX_NAME_LENGTH: usize = 32;

/// Points for the storyteller when some, but not all, voters find their card.
pub const STORYTELLER_POINTS: u32 = 3;
/// Points for a voter who picked the storyteller's card.
pub const CORRECT_GUESS_POINTS: u32 = 3;
/// Points per vote a decoy card attracted.
pub const DECOY_VOTE_POINTS: u32 = 1;
/// Points for every non-storyteller when all or none of the voters were right.
pub const CONSOLATION_POINTS: u32 = 2;

/// Size of the numbered pool used when no catalog is configured.
pub const BUILTIN_POOL_SIZE: usize = 84;
