use crate::core::models::configuration::Configuration;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing crystallographic structure files.
///
/// Implementors handle format-specific parsing and serialization; the provided
/// methods add path-based convenience wrappers on top.
pub trait StructureFile {
    /// The error type for I/O and parsing failures.
    type Error: Error + From<io::Error>;

    /// Reads a configuration from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Configuration, Self::Error>;

    /// Writes a configuration to a writer.
    ///
    /// # Arguments
    ///
    /// * `configuration` - The configuration to write.
    /// * `comment` - Free-form text for the format's title line.
    /// * `writer` - The writer to output to.
    fn write_to(
        configuration: &Configuration,
        comment: &str,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Configuration, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a configuration to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        configuration: &Configuration,
        comment: &str,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(configuration, comment, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
