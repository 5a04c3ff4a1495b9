//! Byte storage holding interchange text.
//!
//! [`Stream`] is the seam between the builder/reader and storage. One
//! implementation, [`IoStream`], covers both in-memory buffers and files.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::model::{DelimiterSet, tags};

/// Bytes fetched from the underlying storage per read.
const READ_BUF_LEN: usize = 4096;

/// Leading bytes inspected for a UNA service string.
const UNA_HEAD_LEN: usize = tags::TAG_LEN + DelimiterSet::SERVICE_STRING_LEN;

/// Line-oriented storage for segment text.
pub trait Stream {
    /// Writes text at the current position.
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Moves to the absolute byte offset and returns it.
    fn seek(&mut self, offset: u64) -> io::Result<u64>;

    /// Returns the current byte offset.
    fn tell(&mut self) -> io::Result<u64>;

    /// Moves to the start of the stream.
    fn rewind(&mut self) -> io::Result<()> {
        self.seek(0).map(|_| ())
    }

    /// Discards everything from byte offset `len` on and moves there.
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Reads the next segment line without its terminator.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Human-readable identifier (file path or `memory`).
    fn identifier(&self) -> String;

    /// Delimiters declared by a leading UNA, or the defaults.
    fn delimiter_set(&mut self) -> io::Result<DelimiterSet>;

    /// Path of durable storage backing this stream, if any.
    fn storage_path(&self) -> Option<&Path> {
        None
    }

    /// Entire stream content; the current position is preserved.
    fn contents(&mut self) -> io::Result<String>;
}

/// Storage that can be cut back to a shorter length.
pub trait Truncate {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for Cursor<Vec<u8>> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().truncate(len);
        Ok(())
    }
}

impl Truncate for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// A [`Stream`] over any seekable reader/writer.
///
/// Reads go through an internal buffer, so a [`FileStream`] does not issue
/// one system call per byte. The buffer is dropped on every seek and write.
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
    path: Option<PathBuf>,
    delimiters: Option<DelimiterSet>,
    buf: Vec<u8>,
    /// Next unread byte in `buf`.
    pos: usize,
}

/// In-memory stream.
pub type MemoryStream = IoStream<Cursor<Vec<u8>>>;

/// File-backed stream; abandoned builds delete the file.
pub type FileStream = IoStream<File>;

impl MemoryStream {
    /// Creates an empty in-memory stream.
    pub fn new() -> Self {
        Self::over(Cursor::new(Vec::new()), None)
    }

    /// Creates a stream over existing interchange text, positioned at the start.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::over(Cursor::new(text.into().into_bytes()), None)
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStream {
    /// Creates (or truncates) a file for writing a new interchange.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::over(file, Some(path.to_path_buf())))
    }

    /// Opens an existing interchange file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::over(file, Some(path.to_path_buf())))
    }
}

impl<T> IoStream<T> {
    fn over(inner: T, path: Option<PathBuf>) -> Self {
        Self {
            inner,
            path,
            delimiters: None,
            buf: Vec::new(),
            pos: 0,
        }
    }

    fn unread(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl<T: Read + Seek> IoStream<T> {
    #[inline]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.pos == self.buf.len() {
            self.fill()?;
            if self.buf.is_empty() {
                return Ok(None);
            }
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    fn fill(&mut self) -> io::Result<()> {
        self.buf.resize(READ_BUF_LEN, 0);
        self.pos = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => {
                    self.buf.truncate(n);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.clear();
                    return Err(e);
                }
            }
        }
    }

    /// Drops the read buffer, moving the inner position back to the
    /// first byte not yet consumed.
    fn sync(&mut self) -> io::Result<()> {
        let unread = self.unread();
        self.buf.clear();
        self.pos = 0;
        if unread > 0 {
            self.inner.seek(SeekFrom::Current(-(unread as i64)))?;
        }
        Ok(())
    }
}

impl<T: Read + Write + Seek + Truncate> Stream for IoStream<T> {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.sync()?;
        self.inner.write_all(text.as_bytes())
    }

    fn seek(&mut self, offset: u64) -> io::Result<u64> {
        self.buf.clear();
        self.pos = 0;
        self.inner.seek(SeekFrom::Start(offset))
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.inner.stream_position()? - self.unread() as u64)
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.buf.clear();
        self.pos = 0;
        self.inner.truncate_to(len)?;
        self.inner.seek(SeekFrom::Start(len))?;
        if len < UNA_HEAD_LEN as u64 {
            self.delimiters = None;
        }
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let d = self.delimiter_set()?;

        // Line breaks between segments are layout, not content.
        let mut pending = loop {
            match self.read_byte()? {
                None => return Ok(None),
                Some(b'\r' | b'\n') => continue,
                Some(b) => break Some(b),
            }
        };

        let mut line = Vec::with_capacity(64);
        let mut escaped = false;
        loop {
            let b = match pending.take() {
                Some(b) => b,
                None => match self.read_byte()? {
                    Some(b) => b,
                    None => break,
                },
            };

            if escaped {
                escaped = false;
                line.push(b);
                continue;
            }
            if b == d.escape() {
                escaped = true;
                line.push(b);
                continue;
            }
            if b == d.segment() {
                return line_to_string(line).map(Some);
            }

            line.push(b);
            if line == tags::UNA.as_bytes() {
                // Service characters are literal; the last one terminates the line.
                for i in 0..DelimiterSet::SERVICE_STRING_LEN {
                    let Some(b) = self.read_byte()? else {
                        return Err(io::ErrorKind::UnexpectedEof.into());
                    };
                    if i < DelimiterSet::SERVICE_STRING_LEN - 1 {
                        line.push(b);
                    }
                }
                return line_to_string(line).map(Some);
            }
        }

        // Unterminated final segment.
        line_to_string(line).map(Some)
    }

    fn identifier(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "memory".to_string(),
        }
    }

    fn delimiter_set(&mut self) -> io::Result<DelimiterSet> {
        if let Some(d) = self.delimiters {
            return Ok(d);
        }

        self.sync()?;
        let position = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(0))?;
        let mut head = Vec::with_capacity(UNA_HEAD_LEN);
        (&mut self.inner).take(UNA_HEAD_LEN as u64).read_to_end(&mut head)?;
        self.inner.seek(SeekFrom::Start(position))?;

        if head.is_empty() {
            // Nothing written yet; decide once content exists.
            return Ok(DelimiterSet::default());
        }
        let declared = head
            .strip_prefix(tags::UNA.as_bytes())
            .and_then(|rest| std::str::from_utf8(rest).ok())
            .and_then(DelimiterSet::from_service_string);
        let d = declared.unwrap_or_default();
        self.delimiters = Some(d);
        Ok(d)
    }

    fn storage_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn contents(&mut self) -> io::Result<String> {
        self.sync()?;
        let position = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(0))?;
        let mut text = String::new();
        let result = self.inner.read_to_string(&mut text);
        self.inner.seek(SeekFrom::Start(position))?;
        result.map(|_| text)
    }
}

fn line_to_string(line: Vec<u8>) -> io::Result<String> {
    String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
