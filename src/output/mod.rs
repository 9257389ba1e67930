mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::Spinner;
use styling::{dim, magenta_bold};
pub use summary::{print_stage_log, print_status};

/// Prints the `cidigest` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🩺 cidigest"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins pipeline status and failure digests")
    );
}
