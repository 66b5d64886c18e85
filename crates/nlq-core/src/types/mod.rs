pub mod answer;
pub mod candidate;
pub mod context;
pub mod descriptor;
pub mod gloss;
pub mod lint;
pub mod link;
pub mod plan;
pub mod repair;

pub use answer::{AnswerError, AnswerOptions, AnswerOutcome, ExecutionResult, Question, ResultColumn, Trace};
pub use candidate::{Candidate, ExplainOutcome, ScoreBreakdown, ValidationVerdict};
pub use context::{ContextTable, SchemaContextPacket, TableSource};
pub use descriptor::{ColumnDescriptor, FkEdge, ForeignKeyRef, ModuleDescriptor, TableDescriptor};
pub use gloss::{ColumnGloss, TypeHint};
pub use lint::{Diagnostic, DiagnosticCode, LintReport, Severity};
pub use link::{LinkedColumn, SchemaLinkBundle, TableWarning, ValueHint};
pub use plan::{JoinClause, JoinPlan, JoinSkeleton};
pub use repair::{RepairAttempt, RepairContext, RepairHint};
