use std::io::{BufRead, Lines, Write};

use ndarray::{Array1, Array2};

use crate::error::{Result, WeightFileError};
use crate::tensor::{NamedTensor, TensorData};
use crate::topology::Topology;

/// Write tensors as text blocks, in the given order
///
/// Values use `f32`'s shortest round-trip decimal form, so reading the file
/// back reproduces them exactly.
pub fn write_tensors<W: Write>(writer: &mut W, tensors: &[NamedTensor]) -> std::io::Result<()> {
    for tensor in tensors {
        writeln!(writer, "# {}", tensor.name)?;
        match &tensor.data {
            TensorData::Matrix(m) => {
                writeln!(writer, "{} {}", m.nrows(), m.ncols())?;
                for row in m.rows() {
                    write_row(writer, row.iter())?;
                }
            }
            TensorData::Vector(v) => {
                writeln!(writer, "{}", v.len())?;
                write_row(writer, v.iter())?;
            }
        }
    }
    writer.flush()
}

fn write_row<'a, W: Write>(
    writer: &mut W,
    values: impl Iterator<Item = &'a f32>,
) -> std::io::Result<()> {
    for (i, v) in values.enumerate() {
        if i > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{v}")?;
    }
    writeln!(writer)
}

/// Upper bound on values reserved up front for one matrix
const MAX_PREALLOC: usize = 1 << 16;

/// Line source that tracks line numbers for error messages
struct BlockReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> BlockReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    /// Next line that is not blank; blank lines may separate blocks
    fn next_content_line(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn expect_line(&mut self, block: &str, what: &str) -> Result<String> {
        self.next_line()?.ok_or_else(|| {
            WeightFileError::malformed(
                block,
                format!("unexpected end of data after line {}: missing {what}", self.line_no),
            )
        })
    }

    /// Parse the next block; `previous` names the block read before it
    fn next_block(&mut self, index: usize, previous: Option<&str>) -> Result<Option<NamedTensor>> {
        let Some(header) = self.next_content_line()? else {
            return Ok(None);
        };

        let name = match header.trim().strip_prefix('#') {
            Some(rest) if !rest.trim().is_empty() => rest.trim().to_string(),
            _ => {
                // Data where a header belongs means the previous block overran
                return Err(match previous {
                    Some(prev) => WeightFileError::malformed(
                        prev,
                        format!(
                            "line {}: extra data after the last declared row, got {header:?}",
                            self.line_no
                        ),
                    ),
                    None => WeightFileError::malformed(
                        format!("<block {index}>"),
                        format!("line {}: expected `# <name>` header, got {header:?}", self.line_no),
                    ),
                });
            }
        };

        let shape_line = self.expect_line(&name, "shape line")?;
        let dims = shape_line
            .split_whitespace()
            .map(|t| t.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| {
                WeightFileError::malformed(
                    &name,
                    format!("line {}: invalid shape line {shape_line:?}", self.line_no),
                )
            })?;

        let data = match dims.as_slice() {
            &[len] => {
                let line = self.expect_line(&name, "data line")?;
                let values = self.parse_row(&name, &line, len, 0)?;
                TensorData::Vector(Array1::from_vec(values))
            }
            &[rows, cols] => {
                let total = rows.checked_mul(cols).ok_or_else(|| {
                    WeightFileError::malformed(
                        &name,
                        format!("line {}: shape {rows}x{cols} is too large", self.line_no),
                    )
                })?;
                // Grow as rows arrive; the declared shape is not trusted for allocation
                let mut values = Vec::with_capacity(total.min(MAX_PREALLOC));
                for r in 0..rows {
                    let line = self.expect_line(&name, &format!("row {} of {rows}", r + 1))?;
                    values.extend(self.parse_row(&name, &line, cols, r)?);
                }
                let matrix = Array2::from_shape_vec((rows, cols), values)
                    .map_err(|e| WeightFileError::malformed(&name, e.to_string()))?;
                TensorData::Matrix(matrix)
            }
            _ => {
                return Err(WeightFileError::malformed(
                    &name,
                    format!(
                        "line {}: shape must have 1 or 2 dimensions, got {:?}",
                        self.line_no, shape_line
                    ),
                ))
            }
        };

        Ok(Some(NamedTensor { name, data }))
    }

    fn parse_row(&self, block: &str, line: &str, expected: usize, row: usize) -> Result<Vec<f32>> {
        let values = line
            .split_whitespace()
            .map(|t| {
                t.parse::<f32>().map_err(|_| {
                    WeightFileError::malformed(
                        block,
                        format!("line {}: invalid number {t:?} in row {}", self.line_no, row + 1),
                    )
                })
            })
            .collect::<Result<Vec<f32>>>()?;

        if values.len() != expected {
            return Err(WeightFileError::malformed(
                block,
                format!(
                    "line {}: expected {expected} values in row {}, got {}",
                    self.line_no,
                    row + 1,
                    values.len()
                ),
            ));
        }
        Ok(values)
    }
}

/// Parse every block of a weight file, checking structure only
pub fn read_tensors<R: BufRead>(reader: R) -> Result<Vec<NamedTensor>> {
    let mut blocks = BlockReader::new(reader);
    let mut tensors = Vec::new();
    while let Some(tensor) =
        blocks.next_block(tensors.len(), tensors.last().map(|t: &NamedTensor| t.name.as_str()))?
    {
        tensors.push(tensor);
    }
    Ok(tensors)
}

/// Parse a weight file and check it against the expected topology
pub fn read_tensors_with<R: BufRead>(reader: R, topology: &Topology) -> Result<Vec<NamedTensor>> {
    let tensors = read_tensors(reader)?;
    topology.check(&tensors)?;
    Ok(tensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TensorSpec;
    use ndarray::array;

    fn sample() -> Vec<NamedTensor> {
        vec![
            NamedTensor::matrix("W1", array![[1.0, -0.5, 0.25], [3.0, 0.0, 1e-7]]),
            NamedTensor::vector("b1", array![0.1, -2.0]),
        ]
    }

    fn encode(tensors: &[NamedTensor]) -> String {
        let mut buf = Vec::new();
        write_tensors(&mut buf, tensors).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_format() {
        assert_eq!(
            encode(&sample()),
            "# W1\n2 3\n1 -0.5 0.25\n3 0 0.0000001\n# b1\n2\n0.1 -2\n"
        );
    }

    #[test]
    fn test_read_back_exact() {
        let text = encode(&sample());
        let tensors = read_tensors(text.as_bytes()).unwrap();
        assert_eq!(tensors, sample());
    }

    #[test]
    fn test_read_with_topology() {
        let topology = Topology::new(vec![TensorSpec::matrix("W1", 2, 3), TensorSpec::vector("b1", 2)]);
        let text = encode(&sample());
        assert!(read_tensors_with(text.as_bytes(), &topology).is_ok());

        let other = Topology::new(vec![TensorSpec::matrix("W1", 3, 2), TensorSpec::vector("b1", 2)]);
        let err = read_tensors_with(text.as_bytes(), &other).unwrap_err();
        assert!(matches!(err, WeightFileError::Topology { .. }));
        assert_eq!(err.block(), Some("W1"));
    }

    #[test]
    fn test_blank_lines_between_blocks() {
        let text = "\n# b\n3\n1 2 3\n\n\n# c\n1\n4\n\n";
        let tensors = read_tensors(text.as_bytes()).unwrap();
        assert_eq!(tensors.len(), 2);
        assert_eq!(tensors[1].as_vector().unwrap()[0], 4.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_tensors("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_header() {
        let err = read_tensors("2\n1 2\n".as_bytes()).unwrap_err();
        assert_eq!(err.block(), Some("<block 0>"));
    }

    #[test]
    fn test_missing_row() {
        let err = read_tensors("# W\n3 2\n1 2\n3 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WeightFileError::Malformed { ref block, .. } if block == "W"));
    }

    #[test]
    fn test_extra_row_blames_previous_block() {
        // A second data row where the next header should be
        let err = read_tensors("# W\n1 2\n1 2\n3 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WeightFileError::Malformed { ref block, .. } if block == "W"));
    }

    #[test]
    fn test_oversized_shape_is_malformed() {
        let err = read_tensors("# W\n4000000000 4000000000\n1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WeightFileError::Malformed { ref block, .. } if block == "W"));

        let text = format!("# W\n{} 2\n1\n", usize::MAX);
        let err = read_tensors(text.as_bytes()).unwrap_err();
        match err {
            WeightFileError::Malformed { block, reason } => {
                assert_eq!(block, "W");
                assert!(reason.contains("too large"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_oversized_vector_is_malformed() {
        let text = format!("# b\n{}\n1 2\n", usize::MAX);
        let err = read_tensors(text.as_bytes()).unwrap_err();
        assert_eq!(err.block(), Some("b"));
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = read_tensors("# W\n2 2\n1 2\n3\n".as_bytes()).unwrap_err();
        match err {
            WeightFileError::Malformed { block, reason } => {
                assert_eq!(block, "W");
                assert!(reason.contains("row 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_vector_length_mismatch() {
        let err = read_tensors("# b\n3\n1 2\n".as_bytes()).unwrap_err();
        assert_eq!(err.block(), Some("b"));
    }

    #[test]
    fn test_missing_shape_line() {
        let err = read_tensors("# b\n".as_bytes()).unwrap_err();
        assert_eq!(err.block(), Some("b"));
    }

    #[test]
    fn test_bad_shape_line() {
        assert_eq!(
            read_tensors("# b\nx\n1\n".as_bytes()).unwrap_err().block(),
            Some("b")
        );
        assert_eq!(
            read_tensors("# t\n1 1 1\n1\n".as_bytes()).unwrap_err().block(),
            Some("t")
        );
    }

    #[test]
    fn test_bad_number() {
        let err = read_tensors("# b\n2\n1 abc\n".as_bytes()).unwrap_err();
        assert_eq!(err.block(), Some("b"));
    }

    #[test]
    fn test_scientific_notation_accepted() {
        let tensors = read_tensors("# b\n2\n1e-3 -2.5E2\n".as_bytes()).unwrap();
        assert_eq!(tensors[0].as_vector().unwrap().to_vec(), vec![1e-3, -250.0]);
    }
}
