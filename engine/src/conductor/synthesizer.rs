//! Conductor Synthesizer
//!
//! Folds the collected step results and the original request into the final answer.

use sdk::errors::EngineError;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::llm::{LLMProvider, Message};

pub fn synthesis_prompt(user_input: &str, results: &[String]) -> String {
    format!(
        "You are an expert synthesizer. Based on the user's input and the collected data, \
         provide a comprehensive final answer.\n\n\
         Request: {}\n\
         Collected Data:\n\
         {}\n",
        user_input,
        results.join("\n")
    )
}

pub struct Synthesizer {
    llm: Arc<dyn LLMProvider>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// One model call over the request and all results, in step order
    pub async fn synthesize(
        &self,
        user_input: &str,
        results: &[String],
    ) -> Result<String, EngineError> {
        let prompt = synthesis_prompt(user_input, results);
        info!(
            node = "synthesizer",
            action = "start",
            intermediate_message_count = results.len(),
            context_length = prompt.len(),
            "Synthesizer node started"
        );
        debug!("Invoking LLM for synthesis");

        match self.llm.generate(&[Message::user(prompt)]).await {
            Ok(output) => {
                info!(
                    node = "synthesizer",
                    action = "complete",
                    final_output_length = output.len(),
                    "Synthesizer completed successfully"
                );
                Ok(output)
            }
            Err(e) => {
                let err = EngineError::from(e);
                error!(node = "synthesizer", action = "error", error = %err, "Synthesizer node failed");
                Err(err)
            }
        }
    }
}
