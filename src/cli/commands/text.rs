//! Text command implementation
//!
//! Quick scan of a single string given on the command line.

use super::{
    build_engine, exit_code_for, load_configuration, register_rules, EXIT_CONFIG, EXIT_FINDINGS,
    EXIT_OK, EXIT_PARTIAL,
};
use crate::anonymization::{AnonymizedResult, SegmentNormalizer};
use clap::Args;

/// Arguments for the text command
#[derive(Args, Debug)]
pub struct TextArgs {
    /// Text to scan
    pub text: String,

    /// Extra whitelist rule, ENTITY=value1,value2 (repeatable)
    #[arg(long, value_name = "ENTITY=VALUES")]
    pub whitelist: Vec<String>,

    /// Extra regex rule, ENTITY=pattern (repeatable)
    #[arg(long, value_name = "ENTITY=PATTERN")]
    pub regex: Vec<String>,

    /// Print the result (text, findings, warnings) as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 when any PII is found
    #[arg(long)]
    pub fail_on_findings: bool,
}

impl TextArgs {
    /// Execute the text command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let config = match load_configuration(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Failed to initialize scan: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let mut session = engine.session();
        if let Err(e) = register_rules(&mut session, &config.rules, &self.whitelist, &self.regex) {
            eprintln!("Invalid rule: {e}");
            engine.shutdown().await?;
            return Ok(EXIT_CONFIG);
        }

        let segments: Vec<_> = SegmentNormalizer
            .normalize_document("stdin", &self.text)
            .into_iter()
            .collect();

        let outcome = session.run(segments).await;
        engine.shutdown().await?;
        let outcome = outcome?;

        if let Some(failure) = outcome.failures.first() {
            eprintln!("Scan failed: {}", failure.error);
            return Ok(EXIT_PARTIAL);
        }

        let result = outcome.results.into_iter().next();
        let found = result.as_ref().is_some_and(AnonymizedResult::has_findings);

        match result {
            Some(result) if self.json => println!("{}", serde_json::to_string_pretty(&result)?),
            Some(result) => {
                println!("{}", result.text);
                for warning in &result.warnings {
                    eprintln!("⚠️  {warning}");
                }
            }
            None if self.json => println!("null"),
            None => println!("{}", self.text),
        }

        Ok(if found && self.fail_on_findings {
            EXIT_FINDINGS
        } else {
            EXIT_OK
        })
    }
}
