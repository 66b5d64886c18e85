#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("delta prompt template failed to render: {0}")]
    TemplateRender(#[from] minijinja::Error),
    #[error("repair attempts exhausted after {0} tries")]
    AttemptsExhausted(usize),
}

pub type RepairResult<T> = Result<T, RepairError>;
