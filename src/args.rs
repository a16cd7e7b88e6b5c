use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dispZ",
    version = env!("CARGO_PKG_VERSION"),
    about = "search for ion dispersion events in DMSP spectrograms against an OMNIweb IMF record",
    after_help = r#"Events are detected per daily DMSP file, cross-referenced with the
interplanetary magnetic field, concatenated, sorted by start time, and
written to the case file's EVENT_OUTPUT as CSV. One diagnostic PNG is
rendered per event unless --no-plot is given."#
)]
pub struct Args {
    /// Path to the JSON case file
    #[arg(short = 'i', long, value_name = "CASE_FILE", aliases = ["in", "inp", "inpu"])]
    pub input: PathBuf,

    /// Disable plot output
    #[arg(long, aliases = ["no-p", "no-pl", "no-plo"])]
    pub no_plot: bool,

    /// Worker threads for the per-file loop (0 = one per core)
    #[arg(long, aliases = ["th", "thr", "threa"], default_value_t = 0)]
    pub threads: usize,
}
