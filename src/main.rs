use std::error::Error;
use std::process::exit;

use clap::Parser;
use rayon::prelude::*;

use dispz::args::Args;
use dispz::case::CaseFile;
use dispz::field::FieldContext;
use dispz::output;
use dispz::plot;
use dispz::processing::search_events;
use dispz::read::read_omniweb_files;
use dispz::summary::MatchRecord;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let case = match CaseFile::load(&args.input) {
        Ok(case) => case,
        Err(e) => {
            eprintln!("Error: failed to load case file {}: {}", args.input.display(), e);
            exit(1);
        }
    };
    let polarity = case.polarity();
    let config = case.search_config();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
    }

    // The field record is loaded once and shared read-only by every file's
    // analysis.
    let samples = read_omniweb_files(&case.omniweb_files)?;
    let field = FieldContext::new(samples)?;
    let (span_start, span_end) = field.span();
    println!(
        "Loaded field record: {} samples, {} - {}",
        field.len(),
        span_start.format("%Y-%m-%d %H:%M"),
        span_end.format("%Y-%m-%d %H:%M")
    );

    let n_files = case.dmsp_files.len();
    let per_file: Vec<Vec<MatchRecord>> = case
        .dmsp_files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            println!("Processing {}/{} :: {}", index + 1, n_files, path.display());
            let analysis = match search_events(path, &field, polarity, &config) {
                Ok(analysis) => analysis,
                Err(e) => {
                    eprintln!("Warning: skipping {}: {}", path.display(), e);
                    return Vec::new();
                }
            };

            if !args.no_plot {
                for record in &analysis.records {
                    match plot::plot_event(
                        &analysis.frame,
                        &analysis.integrand,
                        record,
                        polarity,
                        config.max_energy_ev,
                        &case.plot_output,
                    ) {
                        Ok(out_path) => println!("Wrote plot {}", out_path.display()),
                        Err(e) => eprintln!(
                            "Warning: plot failed for {}: {}",
                            record.start_time.to_rfc3339(),
                            e
                        ),
                    }
                }
            }

            analysis.records
        })
        .collect();

    let mut records: Vec<MatchRecord> = per_file.into_iter().flatten().collect();
    records.sort_by_key(|r| r.start_time);

    println!("Discovered events:");
    output::print_event_table(&records);

    println!(
        "Writing event output ({} events) to {}",
        records.len(),
        case.event_output.display()
    );
    output::write_event_csv(&case.event_output, &records)?;

    Ok(())
}
