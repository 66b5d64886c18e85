//! `nlq ask`: answers one question and prints the result as JSON.

use crate::cli::{AskArgs, GlobalArgs};
use crate::commands::common::ExitCode;
use crate::orchestrate::answer;
use crate::wiring::Wiring;
use anyhow::Result;
use nlq_core::config::NlqConfig;
use nlq_core::types::{AnswerOptions, Question};
use std::path::Path;

pub async fn execute(args: &AskArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let wiring = Wiring::build(config).await?;

    let question = Question {
        text: args.question.clone(),
        database_id: args.database.clone(),
    };
    let options = AnswerOptions {
        include_trace: args.trace,
    };

    match answer(&wiring, question, options).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("query failed ({}): {}", err.kind(), err.message);
            Err(ExitCode(1).into())
        }
    }
}

fn load_config(global: &GlobalArgs) -> Result<NlqConfig> {
    match &global.config {
        Some(path) => Ok(NlqConfig::load(Path::new(path))?),
        None => Ok(NlqConfig::load_from_dir_or_default(Path::new("."))?),
    }
}
