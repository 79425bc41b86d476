//! Tracing setup shared by the ledger service and the relay

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Size at which the log file is rolled over
pub const LOG_MAX_BYTES: u64 = 1024 * 1024;

/// Rolled-over files kept next to the active one (`name.1` is the newest)
pub const LOG_BACKUPS: usize = 3;

/// Install the global subscriber: JSON to stdout, plain text to `{log_dir}/{file_name}`.
///
/// The file is rotated at [`LOG_MAX_BYTES`], keeping [`LOG_BACKUPS`] old files.
/// The level comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(log_dir: &Path, file_name: &str) -> anyhow::Result<()> {
    fs::create_dir_all(log_dir)?;
    let log_file = RotatingFile::open(log_dir.join(file_name), LOG_MAX_BYTES, LOG_BACKUPS)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()?;

    Ok(())
}

/// Append-only log file that rolls over once it reaches `max_bytes`
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        let file = append_to(&path)?;
        let written = file.metadata()?.len();

        Ok(RotatingFile {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&self.path)?;
        } else {
            for index in (1..self.backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = append_to(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let written = self.file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(byte: u8) -> Vec<u8> {
        let mut line = vec![byte; 9];
        line.push(b'\n');
        line
    }

    #[test]
    fn test_rotates_and_keeps_bounded_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger_service.log");
        let mut file = RotatingFile::open(&path, 25, 2).unwrap();

        // Ten-byte lines, two per file before the third would overflow
        for byte in b'a'..=b'h' {
            file.write_all(&line(byte)).unwrap();
        }
        file.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), [line(b'g'), line(b'h')].concat());
        assert_eq!(
            fs::read(file.backup_path(1)).unwrap(),
            [line(b'e'), line(b'f')].concat()
        );
        assert_eq!(
            fs::read(file.backup_path(2)).unwrap(),
            [line(b'c'), line(b'd')].concat()
        );
        assert!(!file.backup_path(3).exists());
    }

    #[test]
    fn test_reopen_counts_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        fs::write(&path, [line(b'a'), line(b'b')].concat()).unwrap();

        let mut file = RotatingFile::open(&path, 25, 1).unwrap();
        file.write_all(&line(b'c')).unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), line(b'c'));
        assert_eq!(
            fs::read(file.backup_path(1)).unwrap(),
            [line(b'a'), line(b'b')].concat()
        );
    }

    #[test]
    fn test_oversized_write_lands_in_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.log");
        let mut file = RotatingFile::open(&path, 4, 0).unwrap();

        file.write_all(&line(b'x')).unwrap();
        file.write_all(&line(b'y')).unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), line(b'y'));
    }
}
