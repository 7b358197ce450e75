use thiserror::Error;

use crate::answers::AnswerParseError;
use crate::bundle::WriteError;
use crate::collector::CollectError;
use crate::config::ConfigError;
use crate::engine::RenderError;
use crate::schema::SchemaError;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Answers(#[from] AnswerParseError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
