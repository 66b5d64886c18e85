use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("no foreign-key path connects {from} to {to}")]
    NoConnectingPath { from: String, to: String },

    #[error("required table not present in the context packet: {0}")]
    UnknownTable(String),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
