use judge_common::error::JudgeError;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Judge(#[from] JudgeError),
}
