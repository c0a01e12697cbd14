use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Unknown field condition: {0}")]
    UnknownCondition(String),

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Unknown weapon: {0}")]
    UnknownWeapon(String),

    #[error("Unknown enemy template: {0}")]
    UnknownEnemy(String),

    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("No encounter data for: {0}")]
    UnknownEncounter(String),

    #[error("Unknown AI strategy: {0}")]
    UnknownStrategy(String),

    #[error("AI for {0} has no moves queued and no default skill")]
    NoDefaultSkill(String),

    #[error("{unit} tried to use item '{item}' it doesn't have")]
    ItemNotOwned { unit: String, item: String },

    #[error("No move selector wired for player unit {0}")]
    NoMoveSelector(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Content parse error: {0}")]
    ContentParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
