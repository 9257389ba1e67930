mod client;
mod links;
mod log_resolver;
mod scrape;
mod status;
mod types;

pub use client::JenkinsClient;
pub use log_resolver::{LogResolver, ResolvedLog};
pub use status::fetch_pipeline_status;
