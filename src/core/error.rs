use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    #[error("Unknown target selector: {0}")]
    UnknownSelector(String),

    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    #[error("Stat {stat} out of range: {value}")]
    StatOutOfRange { stat: String, value: f32 },

    #[error("Hex ({q}, {r}) is outside grid bounds")]
    HexOutOfBounds { q: i32, r: i32 },

    #[error("Hex ({q}, {r}) is already occupied")]
    HexOccupied { q: i32, r: i32 },

    #[error("Invalid star level: {0} (expected 1-3)")]
    InvalidStarLevel(u8),

    #[error("Battle has already been run")]
    BattleAlreadyRun,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
