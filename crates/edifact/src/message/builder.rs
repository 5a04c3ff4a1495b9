//! Incremental construction of an interchange.
//!
//! A builder moves through three states:
//!
//! ```text
//! empty         nothing written, prebuild configuration open
//! accumulating  UNA and UNB written, one UNH..UNT group per add_message
//! finalized     UNZ written by get(), builder consumed
//! ```
//!
//! A builder dropped before [`MessageBuilder::get`] removes its output file,
//! if the stream has one.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec::{BuildMode, MemoryStream, SegmentFactory, Stream};
use crate::error::{ConfigError, Result};
use crate::message::config::{ConfigValue, Configuration, Setting, keys};
use crate::message::kind::{Counters, InterchangeHeader, MessageKind, SegmentWriter};
use crate::message::reader::MessageReader;
use crate::model::{DelimiterSet, Element, tags};

/// Length of a generated interchange control reference.
pub const REFERENCE_LEN: usize = 14;

/// Builds an interchange of kind `K` into a stream.
pub struct MessageBuilder<K: MessageKind, S: Stream = MemoryStream> {
    kind: Arc<K>,
    sender: String,
    receiver: String,
    stream: Option<S>,
    cleanup_path: Option<PathBuf>,
    prebuild: Configuration,
    postbuild: Configuration,
    factory: Option<SegmentFactory>,
    reference: Option<String>,
    counters: Counters,
    mode: BuildMode,
    fetched: bool,
}

impl<K: MessageKind> MessageBuilder<K, MemoryStream> {
    /// Creates a builder writing to memory.
    pub fn new(kind: K, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self::with_stream(kind, sender, receiver, MemoryStream::new())
    }
}

impl<K: MessageKind, S: Stream> MessageBuilder<K, S> {
    /// Creates a builder writing to `stream`.
    pub fn with_stream(
        kind: K,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        stream: S,
    ) -> Self {
        Self::from_shared(Arc::new(kind), sender, receiver, stream)
    }

    /// Like [`with_stream`](Self::with_stream), sharing an existing kind.
    pub fn from_shared(
        kind: Arc<K>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        stream: S,
    ) -> Self {
        let mut prebuild = Configuration::new();
        prebuild.set(keys::DELIMITERS, Setting::literal(DelimiterSet::default()));
        prebuild.set(keys::INTERCHANGE_REFERENCE, Setting::lazy(generate_reference));
        prebuild.set(
            keys::PREPARED_AT,
            Setting::lazy(|| ConfigValue::Timestamp(unix_now())),
        );

        Self {
            kind,
            sender: sender.into(),
            receiver: receiver.into(),
            cleanup_path: stream.storage_path().map(|p| p.to_path_buf()),
            stream: Some(stream),
            prebuild,
            postbuild: Configuration::new(),
            factory: None,
            reference: None,
            counters: Counters::default(),
            mode: BuildMode::Checked,
            fetched: false,
        }
    }

    /// Sets whether segments are validated as they are written.
    pub fn with_build_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    /// Segments written since the last UNH, UNH included.
    pub fn unh_count(&self) -> usize {
        self.counters.unh
    }

    /// Messages added so far.
    pub fn message_count(&self) -> usize {
        self.counters.messages
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Sets a value read while building.
    ///
    /// Fails with [`ConfigError::Locked`] once building has started or a
    /// prebuild value has been resolved.
    pub fn add_prebuild_config(
        &mut self,
        key: impl Into<String>,
        setting: Setting<ConfigValue>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        if self.is_locked() {
            return Err(ConfigError::Locked { key });
        }
        self.prebuild.set(key, setting);
        Ok(())
    }

    /// Sets a value handed to the reader returned by [`get`](Self::get).
    pub fn add_postbuild_config(&mut self, key: impl Into<String>, setting: Setting<ConfigValue>) {
        self.postbuild.set(key, setting);
    }

    fn is_locked(&self) -> bool {
        self.factory.is_some() || self.reference.is_some() || self.counters.messages > 0
    }

    /// Interchange control reference, resolved once from the prebuild configuration.
    pub fn interchange_reference(&mut self) -> Result<&str> {
        if self.reference.is_none() {
            let reference = self.prebuild.get_text(keys::INTERCHANGE_REFERENCE)?.to_string();
            self.reference = Some(reference);
        }
        Ok(self.reference.as_deref().unwrap_or_default())
    }

    fn segment_factory(&mut self) -> Result<SegmentFactory> {
        if let Some(factory) = self.factory {
            return Ok(factory);
        }
        let factory = SegmentFactory::new(self.prebuild.get_delimiters(keys::DELIMITERS)?);
        self.factory = Some(factory);
        Ok(factory)
    }

    // =========================================================================
    // BUILDING
    // =========================================================================

    /// Appends one message, opening the interchange first if nothing was written.
    ///
    /// On failure the stream is cut back to where it stood before the call
    /// and the counters are restored, so the builder stays usable.
    pub fn add_message(&mut self, payload: &K::Payload) -> Result<()> {
        let factory = self.segment_factory()?;
        let reference = self.interchange_reference()?.to_string();
        let start = self.stream_mut()?.tell()?;
        let saved = self.counters;

        if let Err(e) = self.append(payload, start, &factory, &reference) {
            self.roll_back(start, saved);
            return Err(e);
        }
        self.counters.messages += 1;
        debug!(
            reference = %reference,
            messages = self.counters.messages,
            "message added"
        );
        Ok(())
    }

    fn append(
        &mut self,
        payload: &K::Payload,
        start: u64,
        factory: &SegmentFactory,
        reference: &str,
    ) -> Result<()> {
        let kind = Arc::clone(&self.kind);
        let Some(stream) = self.stream.as_mut() else {
            return Err(released().into());
        };

        if start == 0 {
            let prepared_at = self.prebuild.get_timestamp(keys::PREPARED_AT)?;
            let header = InterchangeHeader {
                sender: &self.sender,
                receiver: &self.receiver,
                reference,
                prepared_at,
            };
            let mut writer = SegmentWriter::new(
                &mut *stream,
                factory,
                kind.registry(),
                &mut self.counters,
                reference,
                self.mode,
            );
            writer.write(tags::UNA, Vec::new())?;
            kind.write_header(&mut writer, &header)?;
            debug!(
                reference = %reference,
                sender = %self.sender,
                receiver = %self.receiver,
                "interchange opened"
            );
        }

        let mut writer = SegmentWriter::new(
            &mut *stream,
            factory,
            kind.registry(),
            &mut self.counters,
            reference,
            self.mode,
        );
        kind.write_message(&mut writer, payload)
    }

    /// Drops whatever a failed [`add_message`](Self::add_message) wrote.
    ///
    /// If the stream cannot be cut back it is released, and every later
    /// call fails.
    fn roll_back(&mut self, start: u64, saved: Counters) {
        self.counters = saved;
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        match stream.truncate(start) {
            Ok(()) => debug!(offset = start, "partial message discarded"),
            Err(e) => {
                warn!(
                    identifier = %stream.identifier(),
                    error = %e,
                    "failed to discard partial message"
                );
                drop(self.stream.take());
            }
        }
    }

    fn stream_mut(&mut self) -> Result<&mut S> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(released().into()),
        }
    }

    /// Closes the interchange and returns a reader positioned at its start.
    ///
    /// Writes the UNZ trailer unless no message was added. Post-build
    /// configuration is carried over to the reader.
    pub fn get(mut self) -> Result<MessageReader<K, S>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(released().into());
        };
        if stream.tell()? > 0 {
            let factory = self.factory.unwrap_or_default();
            let reference = self.reference.clone().unwrap_or_default();
            let registry = self.kind.registry();
            let count = self.counters.messages.to_string();
            let mut writer = SegmentWriter::new(
                &mut *stream,
                &factory,
                registry,
                &mut self.counters,
                &reference,
                self.mode,
            );
            writer.write(tags::UNZ, vec![Element::from(count), Element::from(&reference)])?;
            stream.rewind()?;
            debug!(
                reference = %reference,
                messages = self.counters.messages,
                "interchange closed"
            );
        }

        let Some(stream) = self.stream.take() else {
            return Err(released().into());
        };
        let mut reader = MessageReader::from_shared(Arc::clone(&self.kind), stream)?;
        for (key, setting) in std::mem::take(&mut self.postbuild).into_entries() {
            reader.add_configuration(key, setting);
        }
        self.fetched = true;
        Ok(reader)
    }

    /// [`get`](Self::get), then structural validation of the result.
    pub fn get_or_fail(self) -> Result<MessageReader<K, S>> {
        let mut reader = self.get()?;
        reader.validate()?;
        Ok(reader)
    }
}

impl<K: MessageKind, S: Stream> Drop for MessageBuilder<K, S> {
    fn drop(&mut self) {
        if self.fetched {
            return;
        }
        drop(self.stream.take());
        let Some(path) = self.cleanup_path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed unfinished interchange"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove unfinished interchange")
            }
        }
    }
}

impl<K: MessageKind, S: Stream> std::fmt::Debug for MessageBuilder<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuilder")
            .field("sender", &self.sender)
            .field("receiver", &self.receiver)
            .field("reference", &self.reference)
            .field("messages", &self.counters.messages)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn released() -> io::Error {
    io::Error::other("builder stream already released")
}

/// Uppercase hex prefix of a random UUID.
fn generate_reference() -> String {
    let mut reference = Uuid::new_v4().simple().to_string();
    reference.truncate(REFERENCE_LEN);
    reference.make_ascii_uppercase();
    reference
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
