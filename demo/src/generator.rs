//! A template response generator for the `ask` subcommand.
//!
//! Stands in for the language-model layer: it only restates the context it
//! was given, so the doctrine and escalation output can be inspected
//! without a model.

use async_trait::async_trait;

use truthgate_contracts::error::TruthgateResult;
use truthgate_core::traits::{GenerationContext, ResponseGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl ResponseGenerator for TemplateGenerator {
    async fn generate(&self, context: &GenerationContext) -> TruthgateResult<String> {
        let mut parts = Vec::new();
        match (&context.data, &context.disclosure) {
            (Some(data), disclosure) => {
                parts.push(format!("Current sources report:\n{data}"));
                parts.extend(disclosure.clone());
            }
            (None, Some(disclosure)) => parts.push(disclosure.clone()),
            (None, None) => parts.push(format!(
                "No live data was needed to answer \"{}\".",
                context.query.trim()
            )),
        }
        Ok(parts.join("\n\n"))
    }
}
