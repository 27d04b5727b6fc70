// src/lib.rs
pub mod builder;
pub mod error;
pub mod merge;
pub mod query;
pub mod rank;
pub mod reader;
pub mod record;
pub mod rollup;
pub mod taxonomy;
pub mod tree;
pub mod types;

use std::fmt::Write as FmtWrite;
use std::path::PathBuf;

use crate::error::TreeError;
use crate::merge::ReportMerger;
use crate::reader::open_lines;
use crate::tree::TaxonTree;
use crate::types::CombinedReportRow;

/// The finished product of a multi-report merge: the aggregated tree
/// plus sample bookkeeping. Text output is generated on demand.
#[derive(Debug)]
pub struct MergeResults {
    /// Merged tree; clade totals are rolled up and children sorted by
    /// descending combined clade reads.
    pub tree: TaxonTree,
    /// One name per sample, `S1..SN` when none were supplied.
    pub sample_names: Vec<String>,
    /// Source file per sample, same order as `sample_names`.
    pub sample_files: Vec<String>,
}

impl MergeResults {
    /// Grand total of reads across every sample, unclassified included.
    pub fn grand_total(&self) -> u64 {
        self.tree.total_reads.iter().sum()
    }

    /// Structured rows of the combined report, in output order
    /// (pre-order, children by descending combined clade reads).
    pub fn combined_rows(&self) -> Vec<CombinedReportRow> {
        let total = self.grand_total();
        self.tree
            .preorder()
            .map(|id| {
                let node = self.tree.node(id);
                let tot_clade: u64 = node.counts.iter().map(|c| c.clade_reads).sum();
                let tot_self: u64 = node.counts.iter().map(|c| c.self_reads).sum();
                CombinedReportRow {
                    pct: percent(tot_clade, total),
                    tot_clade,
                    tot_self,
                    sample_reads: node
                        .counts
                        .iter()
                        .map(|c| (c.clade_reads, c.self_reads))
                        .collect(),
                    rank: node.rank,
                    taxid: node.taxid,
                    name: node.name.clone(),
                    depth: node.depth,
                }
            })
            .collect()
    }

    /// Generate the combined report text on demand: optional `#` header
    /// lines, the unclassified row, then one row per node with the name
    /// indented two spaces per level. With `combined_only` the
    /// per-sample columns are omitted.
    pub fn get_combined_report(&self, headers: bool, combined_only: bool) -> String {
        let mut out = String::new();
        let total = self.grand_total();
        let num_samples = self.sample_names.len();

        if headers {
            let _ = writeln!(out, "#Number of Samples: {num_samples}");
            let _ = writeln!(out, "#Total Number of Reads: {total}");
            for (name, file) in self.sample_names.iter().zip(&self.sample_files) {
                let _ = writeln!(out, "#{name}\t{file}");
            }
            out.push_str("#perc\ttot_all\ttot_lvl");
            if !combined_only {
                for name in &self.sample_names {
                    let _ = write!(out, "\t{name}_all\t{name}_lvl");
                }
            }
            out.push_str("\tlvl_type\ttaxid\tname\n");
        }

        // unclassified pseudo-row first, as in every kraken-style report
        let u_total: u64 = self.tree.unclassified.iter().sum();
        let _ = write!(out, "{:.4}\t{}\t{}", percent(u_total, total), u_total, u_total);
        if !combined_only {
            for &u in &self.tree.unclassified {
                let _ = write!(out, "\t{u}\t{u}");
            }
        }
        out.push_str("\tU\t0\tunclassified\n");

        for row in self.combined_rows() {
            let _ = write!(out, "{:.4}\t{}\t{}", row.pct, row.tot_clade, row.tot_self);
            if !combined_only {
                for (clade, lvl) in &row.sample_reads {
                    let _ = write!(out, "\t{clade}\t{lvl}");
                }
            }
            let _ = writeln!(
                out,
                "\t{}\t{}\t{:indent$}{}",
                row.rank,
                row.taxid,
                "",
                row.name,
                indent = row.depth * 2
            );
        }
        out
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Merge multiple kraken-style report files into one multi-sample tree.
///
/// Reports are consumed strictly in the order given; sample index i in
/// the result corresponds to `report_paths[i]`. Files ending in `.gz`
/// are decompressed on the fly. A report with no data records at all is
/// an error, as is a structurally broken one (whose contribution is
/// rolled back before the error is returned).
pub fn combine_reports(
    report_paths: &[PathBuf],
    sample_names: Option<&[String]>,
) -> Result<MergeResults, TreeError> {
    let num_samples = report_paths.len();
    let names: Vec<String> = match sample_names {
        Some(names) => {
            assert_eq!(names.len(), num_samples, "one sample name per report");
            names.to_vec()
        }
        None => (1..=num_samples).map(|i| format!("S{i}")).collect(),
    };

    let mut merger = ReportMerger::new(num_samples);
    for path in report_paths {
        let stats = merger.merge_source(open_lines(path)?)?;
        if stats.data_records == 0 {
            return Err(TreeError::EmptySource {
                path: path.display().to_string(),
            });
        }
    }

    let tree = merger.finish();
    if tree.skipped_lines > 0 {
        log::warn!("{} unparseable lines skipped across all reports", tree.skipped_lines);
    }

    Ok(MergeResults {
        tree,
        sample_names: names,
        sample_files: report_paths.iter().map(|p| p.display().to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE_A: &str = "\
 10.00\t100\t100\tU\t0\tunclassified\n\
 90.00\t900\t0\tR\t1\troot\n\
 90.00\t900\t0\tD\t2\t  Bacteria\n\
 60.00\t600\t600\tP\t1224\t    Proteobacteria\n\
 30.00\t300\t300\tP\t1239\t    Firmicutes\n";

    const SAMPLE_B: &str = "\
  0.00\t0\t0\tU\t0\tunclassified\n\
100.00\t500\t0\tR\t1\troot\n\
100.00\t500\t0\tD\t2\t  Bacteria\n\
 80.00\t400\t400\tP\t1239\t    Firmicutes\n\
 20.00\t100\t100\tP\t976\t    Bacteroidota\n";

    fn write_reports() -> Vec<PathBuf> {
        let dir = std::env::temp_dir();
        let a = dir.join("krakentools_rs_lib_test_a.kreport");
        let b = dir.join("krakentools_rs_lib_test_b.kreport");
        fs::write(&a, SAMPLE_A).unwrap();
        fs::write(&b, SAMPLE_B).unwrap();
        vec![a, b]
    }

    #[test]
    fn combine_reports_end_to_end() {
        let paths = write_reports();
        let results = combine_reports(&paths, None).unwrap();
        assert_eq!(results.sample_names, vec!["S1", "S2"]);
        assert_eq!(results.grand_total(), 1500);

        let rows = results.combined_rows();
        assert_eq!(rows[0].taxid, 1);
        assert_eq!(rows[0].tot_clade, 1400);
        // Firmicutes (700) sorts before Proteobacteria (600)
        let taxids: Vec<u32> = rows.iter().map(|r| r.taxid).collect();
        assert_eq!(taxids, vec![1, 2, 1239, 1224, 976]);

        let text = results.get_combined_report(true, false);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#Number of Samples: 2"));
        assert_eq!(lines.next(), Some("#Total Number of Reads: 1500"));
        assert!(text.contains("\tS1_all\tS1_lvl\tS2_all\tS2_lvl\t"));
        assert!(text.contains("\tU\t0\tunclassified\n"));
        assert!(text.contains("\tP\t1239\t    Firmicutes\n"));

        let combined_only = results.get_combined_report(false, true);
        let first = combined_only.lines().next().unwrap();
        // pct, tot_all, tot_lvl, lvl_type, taxid, name
        assert_eq!(first.split('\t').count(), 6);

        for p in paths {
            fs::remove_file(p).ok();
        }
    }

    #[test]
    fn empty_report_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("krakentools_rs_lib_test_empty.kreport");
        fs::write(&path, "#only a comment\n").unwrap();
        let err = combine_reports(&[path.clone()], None).unwrap_err();
        assert!(matches!(err, TreeError::EmptySource { .. }));
        fs::remove_file(path).ok();
    }
}
