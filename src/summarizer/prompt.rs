use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;

/// Whether the chat service may run document retrieval for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunSearch {
    #[default]
    Auto,
    Always,
    Never,
}

impl std::fmt::Display for RunSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        };
        f.write_str(mode)
    }
}

/// Instructions that precede the filtered log.
const PROMPT_TEMPLATE: &str = "You are analyzing the output of an automated test pipeline. \
Ignore any Jenkins pipeline steps, setup, or infrastructure messages. \
Focus only on failed test steps and error logs. For each failed test or assertion, extract and summarize:\n\
- The test name or context (e.g., inside \"...\")\n\
- The assertion that failed\n\
- The expected vs actual values, if present\n\
- Any error message or stack trace\n\
- Summarize the root cause in 1-2 sentences.\n\
Present your answer as a bullet list, one bullet per failed test/assertion. \
Ignore all passed tests and infrastructure output.\n\n";

pub fn build_prompt(filtered_log: &str) -> String {
    format!("{PROMPT_TEMPLATE}Log:\n{filtered_log}")
}

/// Request body of the chat `send-message` endpoint.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub alternate_assistant_id: u32,
    pub chat_session_id: &'a str,
    pub parent_message_id: Option<String>,
    pub message: String,
    pub prompt_id: Option<String>,
    pub search_doc_ids: Option<Vec<String>>,
    pub file_descriptors: Vec<String>,
    pub user_file_ids: Vec<String>,
    pub user_folder_ids: Vec<String>,
    pub regenerate: bool,
    pub retrieval_options: RetrievalOptions,
    pub prompt_override: Option<String>,
    pub llm_override: LlmOverride<'a>,
    pub use_agentic_search: bool,
}

#[derive(Debug, Serialize)]
pub struct RetrievalOptions {
    pub run_search: RunSearch,
    pub real_time: bool,
    pub filters: RetrievalFilters,
}

#[derive(Debug, Default, Serialize)]
pub struct RetrievalFilters {
    pub source_type: Option<String>,
    pub document_set: Option<String>,
    pub time_cutoff: Option<String>,
    pub tags: Vec<String>,
    pub user_file_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LlmOverride<'a> {
    pub model_provider: &'a str,
    pub model_version: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn new(config: &'a ChatConfig, message: String, run_search: RunSearch) -> Self {
        Self {
            alternate_assistant_id: 0,
            chat_session_id: &config.session_id,
            parent_message_id: None,
            message,
            prompt_id: None,
            search_doc_ids: None,
            file_descriptors: Vec::new(),
            user_file_ids: Vec::new(),
            user_folder_ids: Vec::new(),
            regenerate: false,
            retrieval_options: RetrievalOptions {
                run_search,
                real_time: true,
                filters: RetrievalFilters::default(),
            },
            prompt_override: None,
            llm_override: LlmOverride {
                model_provider: &config.model_provider,
                model_version: &config.model_version,
            },
            use_agentic_search: false,
        }
    }
}
