use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid value on line {line}: '{value}'")]
    InvalidValue { line: usize, value: String },
    #[error("r values must be strictly increasing (line {line})")]
    NotIncreasing { line: usize },
    #[error("Reference curve contains no data points")]
    Empty,
}

/// An experimental reduced pair-distribution function G(r).
///
/// Immutable once loaded; scorers share it read-only across batch workers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalReference {
    r: Vec<f64>,
    g: Vec<f64>,
}

impl ExperimentalReference {
    /// Builds a reference from paired samples.
    ///
    /// # Errors
    ///
    /// Fails on an empty curve or on r values that are not strictly increasing.
    pub fn new(r: Vec<f64>, g: Vec<f64>) -> Result<Self, ReferenceLoadError> {
        if r.is_empty() || r.len() != g.len() {
            return Err(ReferenceLoadError::Empty);
        }
        if let Some(pos) = r.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ReferenceLoadError::NotIncreasing { line: pos + 2 });
        }
        Ok(Self { r, g })
    }

    /// Loads a two-column text file of `r G(r)` pairs.
    ///
    /// Columns may be separated by whitespace or commas. Blank lines, `#`
    /// comments and non-numeric header lines before the first data row are skipped.
    pub fn load(path: &Path) -> Result<Self, ReferenceLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReferenceLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ReferenceLoadError> {
        let mut r = Vec::new();
        let mut g = Vec::new();

        for (line_num, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            let parsed: Option<(f64, f64)> = match fields.as_slice() {
                [a, b, ..] => a.parse().ok().zip(b.parse().ok()),
                _ => None,
            };
            match parsed {
                Some((r_value, g_value)) => {
                    if let Some(&last) = r.last() {
                        if r_value <= last {
                            return Err(ReferenceLoadError::NotIncreasing { line: line_num + 1 });
                        }
                    }
                    r.push(r_value);
                    g.push(g_value);
                }
                None if r.is_empty() => continue,
                None => {
                    return Err(ReferenceLoadError::InvalidValue {
                        line: line_num + 1,
                        value: line.to_string(),
                    });
                }
            }
        }

        Self::new(r, g)
    }

    pub fn r(&self) -> &[f64] {
        &self.r
    }

    pub fn g(&self) -> &[f64] {
        &self.g
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_and_comma_columns_with_headers() {
        let content = "# experimental G(r)\nr G\n1.0 0.5\n1.04,0.75\n\n1.08\t-0.25 # trailing\n";
        let reference = ExperimentalReference::parse(content).unwrap();
        assert_eq!(reference.r(), &[1.0, 1.04, 1.08]);
        assert_eq!(reference.g(), &[0.5, 0.75, -0.25]);
    }

    #[test]
    fn rejects_decreasing_r() {
        let err = ExperimentalReference::parse("1.0 0.0\n0.9 0.0\n").unwrap_err();
        assert!(matches!(err, ReferenceLoadError::NotIncreasing { line: 2 }));
    }

    #[test]
    fn rejects_garbage_after_data() {
        let err = ExperimentalReference::parse("1.0 0.0\nfoo bar\n").unwrap_err();
        assert!(matches!(err, ReferenceLoadError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(
            ExperimentalReference::parse("# nothing\n"),
            Err(ReferenceLoadError::Empty)
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ExperimentalReference::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
