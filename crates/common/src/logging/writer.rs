// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

use std::{
    fs::{File, create_dir_all},
    io::{self, BufWriter, Stdout, Write},
    path::PathBuf,
};

use chrono::{NaiveDate, Utc};
use log::LevelFilter;

use crate::logging::logger::LogLine;

pub trait LogWriter {
    /// Writes a log line.
    fn write(&mut self, line: &str);
    /// Flushes buffered logs.
    fn flush(&mut self);
    /// Checks if a line needs to be written to the writer or not.
    fn enabled(&self, line: &LogLine) -> bool;
}

#[derive(Debug)]
pub struct StdoutWriter {
    pub is_colored: bool,
    io: Stdout,
    level: LevelFilter,
}

impl StdoutWriter {
    /// Creates a new [`StdoutWriter`] instance.
    #[must_use]
    pub fn new(level: LevelFilter, is_colored: bool) -> Self {
        Self {
            io: io::stdout(),
            level,
            is_colored,
        }
    }
}

impl LogWriter for StdoutWriter {
    fn write(&mut self, line: &str) {
        match self.io.write_all(line.as_bytes()) {
            Ok(()) => {}
            Err(e) => eprintln!("Error writing to stdout: {e:?}"),
        }
    }

    fn flush(&mut self) {
        match self.io.flush() {
            Ok(()) => {}
            Err(e) => eprintln!("Error flushing stdout: {e:?}"),
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        line.level <= self.level
    }
}

/// Configuration for file logging output.
#[derive(Debug, Clone, Default)]
pub struct FileWriterConfig {
    /// Directory to write log files into (defaults to the working directory).
    pub directory: Option<String>,
    /// Custom basename for the log file (defaults to a dated name).
    pub file_name: Option<String>,
}

impl FileWriterConfig {
    /// Creates a new [`FileWriterConfig`] instance.
    #[must_use]
    pub const fn new(directory: Option<String>, file_name: Option<String>) -> Self {
        Self {
            directory,
            file_name,
        }
    }
}

#[derive(Debug)]
pub struct FileWriter {
    buf: BufWriter<File>,
    path: PathBuf,
    file_config: FileWriterConfig,
    level: LevelFilter,
    cur_file_date: NaiveDate,
}

impl FileWriter {
    /// Creates a new [`FileWriter`] instance.
    ///
    /// Returns `None` if the log directory or file cannot be created.
    pub fn new(file_config: FileWriterConfig, fileout_level: LevelFilter) -> Option<Self> {
        let file_path = match Self::create_log_file_path(&file_config) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error creating log directory: {e}");
                return None;
            }
        };

        match File::options()
            .create(true)
            .append(true)
            .open(file_path.clone())
        {
            Ok(file) => Some(Self {
                buf: BufWriter::new(file),
                path: file_path,
                file_config,
                level: fileout_level,
                cur_file_date: Utc::now().date_naive(),
            }),
            Err(e) => {
                eprintln!("Error creating log file: {e}");
                None
            }
        }
    }

    fn create_log_file_path(file_config: &FileWriterConfig) -> Result<PathBuf, io::Error> {
        let basename = match file_config.file_name.as_ref() {
            Some(file_name) => file_name.clone(),
            None => format!("ladderfeed_{}", Utc::now().format("%Y-%m-%d")),
        };

        let mut file_path = PathBuf::new();

        if let Some(directory) = file_config.directory.as_ref() {
            file_path.push(directory);
            create_dir_all(&file_path)?;
        }

        file_path.push(basename);
        file_path.set_extension("log");
        Ok(file_path)
    }

    // Default-named logs roll over on UTC date change; custom-named logs never rotate.
    #[must_use]
    fn should_rotate_file(&self) -> bool {
        self.file_config.file_name.is_none() && self.cur_file_date != Utc::now().date_naive()
    }

    fn rotate_file(&mut self) {
        self.flush();

        let new_path = match Self::create_log_file_path(&self.file_config) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error creating log directory for rotation: {e}");
                return;
            }
        };

        match File::options().create(true).append(true).open(&new_path) {
            Ok(new_file) => {
                self.buf = BufWriter::new(new_file);
                self.path = new_path;
                self.cur_file_date = Utc::now().date_naive();
            }
            Err(e) => eprintln!("Error creating log file: {e}"),
        }
    }

    /// Returns the path of the current log file.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl LogWriter for FileWriter {
    fn write(&mut self, line: &str) {
        let line = strip_nonprinting_except_newline(line);

        if self.should_rotate_file() {
            self.rotate_file();
        }

        if let Err(e) = self.buf.write_all(line.as_bytes()) {
            eprintln!("Error writing to file: {e:?}");
        }
    }

    fn flush(&mut self) {
        match self.buf.flush() {
            Ok(()) => {}
            Err(e) => eprintln!("Error flushing file: {e:?}"),
        }

        match self.buf.get_ref().sync_all() {
            Ok(()) => {}
            Err(e) => eprintln!("Error syncing file: {e:?}"),
        }
    }

    fn enabled(&self, line: &LogLine) -> bool {
        line.level <= self.level
    }
}

fn strip_nonprinting_except_newline(s: &str) -> String {
    s.chars()
        .filter(|&c| c == '\n' || (!c.is_control() && c != '\u{7F}'))
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use rstest::rstest;
    use tempfile::tempdir;

    use super::*;
    use crate::enums::LogColor;

    #[rstest]
    #[case("Hello, World!", "Hello, World!")]
    #[case("Line1\nLine2", "Line1\nLine2")]
    #[case("Tab\there", "Tabhere")]
    #[case("Null\0char", "Nullchar")]
    #[case("DEL\u{7F}char", "DELchar")]
    #[case("Bell\u{07}sound", "Bellsound")]
    fn test_strip_nonprinting_except_newline(#[case] input: &str, #[case] expected: &str) {
        let result = strip_nonprinting_except_newline(input);
        assert_eq!(result, expected);
    }

    #[rstest]
    fn test_file_writer_custom_name_has_log_extension() {
        let temp_dir = tempdir().unwrap();

        let config = FileWriterConfig {
            directory: Some(temp_dir.path().to_str().unwrap().to_string()),
            file_name: Some("feed".to_string()),
        };

        let writer = FileWriter::new(config, LevelFilter::Info).unwrap();

        assert!(writer.path().to_str().unwrap().contains("feed"));
        assert!(writer.path().extension().unwrap() == "log");
    }

    #[rstest]
    fn test_file_writer_default_name_is_dated() {
        let temp_dir = tempdir().unwrap();

        let config = FileWriterConfig {
            directory: Some(temp_dir.path().to_str().unwrap().to_string()),
            file_name: None,
        };

        let writer = FileWriter::new(config, LevelFilter::Info).unwrap();

        assert!(writer.path().to_str().unwrap().contains("ladderfeed_"));
    }

    #[rstest]
    fn test_file_writer_unwritable_directory_returns_none() {
        let config = FileWriterConfig {
            directory: Some("/nonexistent/path/that/should/not/exist".to_string()),
            file_name: Some("feed".to_string()),
        };

        let writer = FileWriter::new(config, LevelFilter::Info);

        assert!(writer.is_none());
    }

    #[rstest]
    fn test_stdout_writer_level_filtering() {
        let writer = StdoutWriter::new(LevelFilter::Info, true);

        let info_line = LogLine {
            timestamp: Default::default(),
            level: log::Level::Info,
            color: LogColor::Normal,
            component: ustr::Ustr::from("Test"),
            message: "info".to_string(),
        };
        assert!(writer.enabled(&info_line));

        let debug_line = LogLine {
            timestamp: Default::default(),
            level: log::Level::Debug,
            color: LogColor::Normal,
            component: ustr::Ustr::from("Test"),
            message: "debug".to_string(),
        };
        assert!(!writer.enabled(&debug_line));
    }
}
