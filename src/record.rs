// src/record.rs

use crate::types::{ClassifiedLine, ReportRecord, TaxonomyRecord};

/// Parse one line of a Kraken-style report into a [`ReportRecord`].
///
/// Returns `None` for anything that is not a data record: header lines,
/// `#` comments, blanks, and rows whose count columns fail to parse.
/// Callers count those as skipped rather than aborting the run.
///
/// Column layout across the report family, by position from the end:
/// kraken/kraken2 put `rank` at len-3 and `taxID` at len-2, krakenuniq
/// swaps the two. The numeric taxid position disambiguates. The name is
/// always the last field, indented with two spaces per tree level.
pub fn parse_report_line(line: &str) -> Option<ReportRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    let n = fields.len();
    if n < 6 {
        return None;
    }

    let clade_reads: u64 = fields[1].trim().parse().ok()?;
    let self_reads: u64 = fields[2].trim().parse().ok()?;

    let (taxid, raw_rank) = match fields[n - 2].trim().parse::<u32>() {
        Ok(taxid) => (taxid, fields[n - 3].trim()),
        Err(_) => (fields[n - 3].trim().parse().ok()?, fields[n - 2].trim()),
    };

    let raw_name = fields[n - 1];
    let spaces = raw_name.chars().take_while(|&c| c == ' ').count();
    if spaces % 2 == 1 {
        log::warn!(
            "odd indentation ({spaces} spaces) before name {:?}; rounding depth down",
            raw_name.trim_start()
        );
    }

    Some(ReportRecord {
        clade_reads,
        self_reads,
        raw_rank: raw_rank.to_string(),
        taxid,
        name: raw_name[spaces..].to_string(),
        depth: spaces / 2,
    })
}

/// Parse one raw classifier output line (`C|U \t readID \t taxid \t length ...`).
///
/// The taxid column may carry the verbose `Name (taxid 123)` form; paired
/// reads store both mate lengths as `len1|len2`, which are summed.
pub fn parse_classified_line(line: &str) -> Option<ClassifiedLine> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < 4 {
        return None;
    }

    let classified = match fields[0] {
        "C" => true,
        "U" => false,
        _ => return None,
    };

    let tax_field = fields[2].trim();
    let taxid: u32 = if let Some(idx) = tax_field.rfind("taxid ") {
        tax_field[idx + 6..].trim_end_matches(')').parse().ok()?
    } else if tax_field == "A" {
        // kraken marks ambiguous nucleotide reads with 'A'; fold them into
        // the "artificial sequences" taxon the way KrakenTools does
        81077
    } else {
        tax_field.parse().ok()?
    };

    let length = match fields[3].split_once('|') {
        Some((a, b)) => a.trim().parse::<u64>().ok()? + b.trim().parse::<u64>().ok()?,
        None => fields[3].trim().parse().ok()?,
    };

    Some(ClassifiedLine {
        classified,
        read_id: fields[1].to_string(),
        taxid,
        length,
    })
}

/// Parse one line of a flat taxonomy (taxDB) file:
/// `<taxid>\t<parentid>\t<name>\t<rank>`.
///
/// Malformed lines and the reserved taxid 0 yield `None`.
pub fn parse_taxonomy_line(line: &str) -> Option<TaxonomyRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < 4 {
        return None;
    }

    let taxid: u32 = fields[0].trim().parse().ok()?;
    let parent_taxid: u32 = fields[1].trim().parse().ok()?;
    if taxid == 0 {
        return None;
    }

    Some(TaxonomyRecord {
        taxid,
        parent_taxid,
        name: fields[2].trim().to_string(),
        raw_rank: fields[3].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kraken_layout() {
        let rec = parse_report_line(" 55.01\t1000\t50\tP\t1224\t    Proteobacteria").unwrap();
        assert_eq!(rec.clade_reads, 1000);
        assert_eq!(rec.self_reads, 50);
        assert_eq!(rec.raw_rank, "P");
        assert_eq!(rec.taxid, 1224);
        assert_eq!(rec.name, "Proteobacteria");
        assert_eq!(rec.depth, 2);
    }

    #[test]
    fn parses_krakenuniq_layout() {
        // %  reads  taxReads  kmers  dup  cov  taxID  rank  taxName
        let line = "12.5\t200\t10\t915\t1.2\t0.01\t1224\tphylum\t  Proteobacteria";
        let rec = parse_report_line(line).unwrap();
        assert_eq!(rec.taxid, 1224);
        assert_eq!(rec.raw_rank, "phylum");
        assert_eq!(rec.depth, 1);
    }

    #[test]
    fn rejects_headers_comments_blanks() {
        assert!(parse_report_line("#perc\ttot_all\ttot_lvl\tlvl_type\ttaxid\tname").is_none());
        assert!(parse_report_line("%\treads\ttaxReads\trank\ttaxID\ttaxName").is_none());
        assert!(parse_report_line("").is_none());
        assert!(parse_report_line("not\ta\treport\tline").is_none());
    }

    #[test]
    fn odd_indentation_rounds_down() {
        let rec = parse_report_line("1.0\t5\t5\tG\t561\t   Escherichia").unwrap();
        assert_eq!(rec.depth, 1);
        assert_eq!(rec.name, "Escherichia");
    }

    #[test]
    fn name_keeps_embedded_whitespace() {
        let rec = parse_report_line("1.0\t5\t5\tS\t562\t      Escherichia coli").unwrap();
        assert_eq!(rec.depth, 3);
        assert_eq!(rec.name, "Escherichia coli");
    }

    #[test]
    fn parses_classified_lines() {
        let l = parse_classified_line("C\tread1\t562\t150\t562:120").unwrap();
        assert!(l.classified);
        assert_eq!(l.taxid, 562);
        assert_eq!(l.length, 150);

        let u = parse_classified_line("U\tread2\t0\t100\t").unwrap();
        assert!(!u.classified);
        assert_eq!(u.taxid, 0);
    }

    #[test]
    fn classified_line_verbose_taxid_and_paired_length() {
        let l = parse_classified_line("C\tread3\tEscherichia coli (taxid 562)\t80|78\t").unwrap();
        assert_eq!(l.taxid, 562);
        assert_eq!(l.length, 158);
    }

    #[test]
    fn parses_taxonomy_lines() {
        let t = parse_taxonomy_line("562\t561\tEscherichia coli\tspecies").unwrap();
        assert_eq!(t.taxid, 562);
        assert_eq!(t.parent_taxid, 561);
        assert_eq!(t.name, "Escherichia coli");
        assert_eq!(t.raw_rank, "species");

        assert!(parse_taxonomy_line("bad\tline").is_none());
        assert!(parse_taxonomy_line("0\t0\tunclassified\tno rank").is_none());
    }
}
