use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported timestamp tick of {0} us (expected 25, 40 or 50)")]
    UnsupportedTick(u32),

    #[error("map rate {map_rate} Hz is not an integer multiple of continuous rate {aux_rate} Hz")]
    RateRatio { map_rate: u32, aux_rate: u32 },

    #[error("invalid session: {0}")]
    Config(String),

    #[error("failed to parse raw event: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
