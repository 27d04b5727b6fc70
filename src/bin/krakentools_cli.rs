use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::process;

use krakentools_rs::combine_reports;

fn spinner(color: &str, msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    bar.set_message(msg.to_string());
    bar
}

fn main() {
    env_logger::init();

    // <output> <report> [<report> ...]; no flag parsing needed here
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: krakentools-rs <combined_output> <report> [<report> ...]");
        eprintln!("       input reports may be gzipped (.gz)");
        process::exit(1);
    }
    let output = PathBuf::from(&args[0]);
    let reports: Vec<PathBuf> = args[1..].iter().map(PathBuf::from).collect();

    let bar = spinner("blue", &format!("Merging {} report file(s)...", reports.len()));
    let results = match combine_reports(&reports, None) {
        Ok(results) => results,
        Err(err) => {
            bar.finish_and_clear();
            eprintln!("error: {err}");
            process::exit(1);
        }
    };
    bar.finish_with_message(format!(
        "Merged {} report file(s): {} taxa, {} total reads.",
        reports.len(),
        results.tree.len(),
        results.grand_total()
    ));

    let bar = spinner("green", "Writing combined report...");
    fs::write(&output, results.get_combined_report(true, false))
        .expect("Could not write combined report");
    bar.finish_with_message(format!("Wrote {}.", output.display()));

    if results.tree.skipped_lines > 0 {
        eprintln!("warning: skipped {} unparseable line(s)", results.tree.skipped_lines);
    }
}
