//! Batch boundary: turns a pile of input files into isolated jobs

mod grouping;
mod runner;

pub use grouping::{base_file_name, group_files, is_accepted, GroupedInputs, InputGroup};
pub use runner::{build_request, run_batch, BatchOptions, JobOutcome, JobStatus};
