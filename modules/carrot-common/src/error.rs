use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarrotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Safety policy error: {0}")]
    Policy(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
