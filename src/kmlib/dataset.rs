use crate::kmlib::{Clusters, Element, KMParams, KmError, KmResult, Outcome, RunState};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Read a plain-text dataset: one element per line, values 0..=255 separated by
/// commas, tabs or spaces. Blank lines and `#` comments are skipped.
/// Every element must have the dimension of the first one (or `dim`, if given).
pub fn read_dataset(path: &Path, dim: Option<usize>) -> KmResult<Vec<Element>> {
    let reader = io::BufReader::new(File::open(path)?);
    parse_dataset(reader, dim)
}

pub fn parse_dataset<R: BufRead>(reader: R, dim: Option<usize>) -> KmResult<Vec<Element>> {
    let mut expected = dim;
    let mut elements = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let element = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<u8>().map_err(|_| KmError::Parse {
                    line: idx + 1,
                    reason: format!("'{}' is not a value in 0..=255", field),
                })
            })
            .collect::<KmResult<Element>>()?;

        let want = *expected.get_or_insert(element.len());
        if element.len() != want {
            return Err(KmError::Parse {
                line: idx + 1,
                reason: format!("{} values, expected {}", element.len(), want),
            });
        }
        elements.push(element);
    }
    debug!("parsed {} elements", elements.len());
    Ok(elements)
}

#[derive(Serialize, Debug)]
pub struct RunReport<'a> {
    pub params: &'a KMParams,
    pub state: RunState,
    pub generations: usize,
    pub clusters: &'a Clusters,
}

impl<'a> RunReport<'a> {
    pub fn new(params: &'a KMParams, outcome: &'a Outcome, clusters: &'a Clusters) -> Self {
        Self {
            params,
            state: outcome.state,
            generations: outcome.generations,
            clusters,
        }
    }
}

/// Write the report as JSON to `path`, or stdout
pub fn write_report(path: &Option<PathBuf>, report: &RunReport) -> KmResult<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) => {
            let m_page = page_size::get() * 1000;
            let file = File::create(path)?;
            Box::new(BufWriter::with_capacity(m_page, file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    serde_json::to_writer(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmlib::Cluster;
    use std::io::Cursor;

    #[test]
    fn mixed_separators_and_comments() {
        let text = "# header\n1,2,3\n\n4\t5 6\n  7, 8 ,9  \n";
        let data = parse_dataset(Cursor::new(text), None).unwrap();
        assert_eq!(data, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
    }

    #[test]
    fn value_out_of_range() {
        let err = parse_dataset(Cursor::new("1,2\n3,256\n"), None).unwrap_err();
        assert!(matches!(err, KmError::Parse { line: 2, .. }));
    }

    #[test]
    fn ragged_rows() {
        let err = parse_dataset(Cursor::new("1,2\n3\n"), None).unwrap_err();
        assert!(matches!(err, KmError::Parse { line: 2, .. }));
        let err = parse_dataset(Cursor::new("1,2\n"), Some(3)).unwrap_err();
        assert!(matches!(err, KmError::Parse { line: 1, .. }));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.txt");
        std::fs::write(&input, "0 0\n10 10\n").unwrap();
        let data = read_dataset(&input, Some(2)).unwrap();
        assert_eq!(data.len(), 2);

        let params = KMParams {
            k: 1,
            workers: 1,
            max_generations: 3,
            metric: Default::default(),
            seeding: Default::default(),
            seed: None,
            dim: Some(2),
        };
        let outcome = Outcome {
            state: RunState::Converged,
            generations: 2,
            clusters: None,
        };
        let clusters = vec![Cluster {
            centroid: vec![5, 5],
            members: vec![0, 1],
        }];
        let output = dir.path().join("out.json");
        let report = RunReport::new(&params, &outcome, &clusters);
        write_report(&Some(output.clone()), &report).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["state"], "Converged");
        assert_eq!(written["generations"], 2);
        assert_eq!(written["params"]["k"], 1);
        assert_eq!(written["clusters"][0]["members"], serde_json::json!([0, 1]));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_dataset(Path::new("/definitely/not/here.txt"), None),
            Err(KmError::Io(_))
        ));
    }
}
