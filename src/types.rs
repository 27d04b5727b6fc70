// src/types.rs

use crate::rank::RankCode;

/// A structured representation of one data row of a Kraken-style report.
/// For example:
///  %  cladeReads  taxReads  rank  taxID  indented name
///
/// `depth` is derived from the indentation of the name field (spaces / 2)
/// and is only meaningful during tree reconstruction.
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub clade_reads: u64,
    pub self_reads: u64,
    /// Raw rank token as it appeared in the file; resolved (or
    /// synthesized) by the builder.
    pub raw_rank: String,
    pub taxid: u32,
    pub name: String,
    pub depth: usize,
}

/// A structured representation of one raw classifier output line
/// (`C`/`U`, read id, taxid, length, ...).
#[derive(Debug, Clone)]
pub struct ClassifiedLine {
    pub classified: bool,
    pub read_id: String,
    pub taxid: u32,
    /// Read length; for paired lines the two mate lengths summed.
    pub length: u64,
}

/// One line of a flat taxonomy (taxDB) file:
/// ```text
/// <taxid>\t<parentid>\t<name>\t<rank>
/// ```
#[derive(Debug, Clone)]
pub struct TaxonomyRecord {
    pub taxid: u32,
    pub parent_taxid: u32,
    pub name: String,
    pub raw_rank: String,
}

/// A structured row of the combined multi-sample report, one per node,
/// in final output order. Text rendering is generated on demand from
/// these rows.
#[derive(Debug, Clone)]
pub struct CombinedReportRow {
    /// Combined clade reads as a percentage of all reads in all samples.
    pub pct: f64,
    /// Clade/self reads summed over every sample.
    pub tot_clade: u64,
    pub tot_self: u64,
    /// Per-sample (clade, self) pairs, index 0 = first sample.
    pub sample_reads: Vec<(u64, u64)>,
    pub rank: RankCode,
    pub taxid: u32,
    pub name: String,
    pub depth: usize,
}
