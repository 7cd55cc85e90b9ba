//! Tagged text format of training runs.
//!
//! The first line holds the topology, then every example takes two lines:
//! ```text
//! topology: 2 4 1
//! in: 1.0 0.0
//! out: 1.0
//! in: 1.0 1.0
//! out: 0.0
//! ```
//! Amounts of values are not checked here: that is up to the network.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::feedforward::Sample;

const TOPOLOGY_LABEL: &str = "topology:";
const INPUTS_LABEL: &str = "in:";
const TARGETS_LABEL: &str = "out:";

/// Reader of the training data format.
pub struct TrainingData<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl TrainingData<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrainingDataError> {
        Ok(TrainingData::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> TrainingData<R> {
    pub fn new(reader: R) -> Self {
        TrainingData {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Reads the topology line. Must be called once, before any sample is read.
    ///
    /// # Examples
    /// ```
    /// # use bpnnet::training_data::TrainingData;
    /// let mut data = TrainingData::new("topology: 3 2 1\n".as_bytes());
    /// assert_eq!(data.topology().unwrap(), vec![3, 2, 1]);
    /// ```
    pub fn topology(&mut self) -> Result<Vec<usize>, TrainingDataError> {
        let line = self
            .next_line()?
            .ok_or(TrainingDataError::MissingLine {
                line: self.line_number + 1,
                label: TOPOLOGY_LABEL,
            })?;
        let topology: Vec<usize> = self.parse_tagged(&line, TOPOLOGY_LABEL)?;

        if topology.is_empty() {
            return Err(TrainingDataError::EmptyTopology {
                line: self.line_number,
            });
        }
        Ok(topology)
    }

    /// Reads the next example.
    ///
    /// # Returns
    /// * `Ok(Some(Sample))` for an `in:` line followed by an `out:` line;
    /// * `Ok(None)` at the end of data;
    /// * `Err(TrainingDataError)` if the lines are malformed.
    pub fn next_sample(&mut self) -> Result<Option<Sample>, TrainingDataError> {
        let line = match self.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let inputs = self.parse_tagged(&line, INPUTS_LABEL)?;

        let line = self.next_line()?.ok_or(TrainingDataError::MissingLine {
            line: self.line_number + 1,
            label: TARGETS_LABEL,
        })?;
        let targets = self.parse_tagged(&line, TARGETS_LABEL)?;

        Ok(Some(Sample { inputs, targets }))
    }

    /// Next non-blank line.
    fn next_line(&mut self) -> Result<Option<String>, TrainingDataError> {
        for line in &mut self.lines {
            self.line_number += 1;
            let line = line?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn parse_tagged<T: FromStr>(
        &self,
        line: &str,
        label: &'static str,
    ) -> Result<Vec<T>, TrainingDataError> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some(found) if found == label => {}
            found => {
                return Err(TrainingDataError::UnexpectedLabel {
                    line: self.line_number,
                    expected: label,
                    found: found.unwrap_or_default().to_owned(),
                })
            }
        }

        tokens
            .map(|token| {
                token.parse().map_err(|_| TrainingDataError::BadValue {
                    line: self.line_number,
                    value: token.to_owned(),
                })
            })
            .collect()
    }
}

impl<R: BufRead> Iterator for TrainingData<R> {
    type Item = Result<Sample, TrainingDataError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample().transpose()
    }
}

/// Writes the topology line.
pub fn write_topology<W: Write>(writer: &mut W, topology: &[usize]) -> io::Result<()> {
    write!(writer, "{}", TOPOLOGY_LABEL)?;
    for n in topology {
        write!(writer, " {}", n)?;
    }
    writeln!(writer)
}

/// Writes the two lines of one example.
pub fn write_sample<W: Write>(writer: &mut W, sample: &Sample) -> io::Result<()> {
    write_values(writer, INPUTS_LABEL, &sample.inputs)?;
    write_values(writer, TARGETS_LABEL, &sample.targets)
}

fn write_values<W: Write>(writer: &mut W, label: &str, values: &[f64]) -> io::Result<()> {
    write!(writer, "{}", label)?;
    for v in values {
        write!(writer, " {:?}", v)?;
    }
    writeln!(writer)
}

/// Error structure for `TrainingData`
#[derive(Debug, Error)]
pub enum TrainingDataError {
    #[error("Could not read training data: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: expected a line starting with `{label}`, but data ended!")]
    MissingLine { line: usize, label: &'static str },
    #[error("Line {line}: expected `{expected}`, but got `{found}`!")]
    UnexpectedLabel {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("Line {line}: `{value}` is not a valid value!")]
    BadValue { line: usize, value: String },
    #[error("Line {line}: topology has no layers!")]
    EmptyTopology { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    const XOR: &str = "topology: 2 4 1
in: 1.0 0.0
out: 1.0

in: 1.0 1.0
out: 0.0
";

    #[test]
    fn reads_topology_and_samples() {
        let mut data = TrainingData::new(XOR.as_bytes());
        assert_eq!(data.topology().unwrap(), vec![2, 4, 1]);

        let samples: Vec<Sample> = data.map(Result::unwrap).collect();
        assert_eq!(
            samples,
            vec![
                Sample {
                    inputs: vec![1.0, 0.0],
                    targets: vec![1.0]
                },
                Sample {
                    inputs: vec![1.0, 1.0],
                    targets: vec![0.0]
                },
            ]
        );
    }

    #[test]
    fn topology_errors() {
        let err = TrainingData::new("".as_bytes()).topology().unwrap_err();
        assert!(matches!(err, TrainingDataError::MissingLine { line: 1, .. }));

        let err = TrainingData::new("in: 2 4 1\n".as_bytes())
            .topology()
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingDataError::UnexpectedLabel { line: 1, ref found, .. } if found == "in:"
        ));

        let err = TrainingData::new("topology: 2 x 1\n".as_bytes())
            .topology()
            .unwrap_err();
        assert!(matches!(err, TrainingDataError::BadValue { ref value, .. } if value == "x"));

        let err = TrainingData::new("topology: 2 -4 1\n".as_bytes())
            .topology()
            .unwrap_err();
        assert!(matches!(err, TrainingDataError::BadValue { .. }));

        let err = TrainingData::new("topology:\n".as_bytes())
            .topology()
            .unwrap_err();
        assert!(matches!(err, TrainingDataError::EmptyTopology { line: 1 }));
    }

    #[test]
    fn sample_errors() {
        let mut data = TrainingData::new("topology: 1 1\nin: 1.0\n".as_bytes());
        data.topology().unwrap();
        assert!(matches!(
            data.next_sample(),
            Err(TrainingDataError::MissingLine { line: 3, label: "out:" })
        ));

        let mut data = TrainingData::new("topology: 1 1\nout: 1.0\nin: 1.0\n".as_bytes());
        data.topology().unwrap();
        assert!(matches!(
            data.next_sample(),
            Err(TrainingDataError::UnexpectedLabel { line: 2, expected: "in:", .. })
        ));

        let mut data = TrainingData::new("topology: 1 1\nin: 1.0\nout: one\n".as_bytes());
        data.topology().unwrap();
        assert!(matches!(
            data.next_sample(),
            Err(TrainingDataError::BadValue { line: 3, .. })
        ));
    }

    #[test]
    fn keeps_mismatched_lengths() {
        let mut data = TrainingData::new("topology: 2 1\nin: 1.0\nout: 1.0 0.0\n".as_bytes());
        data.topology().unwrap();
        let sample = data.next_sample().unwrap().unwrap();
        assert_eq!(sample.inputs.len(), 1);
        assert_eq!(sample.targets.len(), 2);
        assert!(data.next_sample().unwrap().is_none());
    }

    #[test]
    fn feeds_a_training_run() {
        use crate::feedforward::{Hyperparameters, Net, RunOutcome};

        let text = format!("{}in: 0.0 1.0 1.0\nout: 1.0\nin: 0.0 0.0\nout: 0.0\n", XOR);
        let mut data = TrainingData::new(text.as_bytes());
        let topology = data.topology().unwrap();

        let mut trainer = Net::seeded(&topology, Hyperparameters::default(), 3)
            .unwrap()
            .build_trainer();
        let summary = trainer
            .run(data.map_while(Result::ok), |_, _| {})
            .unwrap();

        assert_eq!(summary.passes, 2);
        assert!(matches!(summary.outcome, RunOutcome::Abandoned { pass: 3, .. }));
    }

    #[test]
    fn written_data_reads_back() {
        let mut buffer = Vec::new();
        write_topology(&mut buffer, &[2, 4, 1]).unwrap();
        write_sample(
            &mut buffer,
            &Sample {
                inputs: vec![1.0, 0.0],
                targets: vec![1.0],
            },
        )
        .unwrap();
        write_sample(
            &mut buffer,
            &Sample {
                inputs: vec![1.0, 1.0],
                targets: vec![0.0],
            },
        )
        .unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), XOR.replace("\n\n", "\n"));
    }
}
