// src/reader.rs

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Open a report/taxonomy/classifier file as a buffered line reader,
/// transparently decompressing `.gz` files. Reads are strictly forward,
/// so piped and compressed inputs behave the same as plain files.
pub fn open_lines<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz")) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = std::env::temp_dir();
        let plain = dir.join("krakentools_rs_reader_test.txt");
        let gz = dir.join("krakentools_rs_reader_test.txt.gz");

        std::fs::write(&plain, "line one\nline two\n").unwrap();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"line one\nline two\n").unwrap();
        std::fs::write(&gz, enc.finish().unwrap()).unwrap();

        for path in [&plain, &gz] {
            let lines: Vec<String> = open_lines(path)
                .unwrap()
                .lines()
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(lines, vec!["line one", "line two"]);
        }

        std::fs::remove_file(&plain).ok();
        std::fs::remove_file(&gz).ok();
    }
}
