// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Packet readers feeding a [`crate::packetsrc::PacketSource`].
//!
//! A reader exposes a fixed list of streams and hands out packets one at a
//! time, writing each payload straight into a pooled [`Buffer`].

use std::{
    collections::VecDeque,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use pushflow::{Buffer, Rational, Result};
use tracing::debug;

use crate::streamdef::{StreamDef, StreamDetails};

/// Where a packet belongs and when it should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    /// Index into [`PacketReader::streams`].
    pub stream_index: usize,
    /// Presentation timestamp in the stream's time base, if known.
    pub pts: Option<i64>,
}

/// A titled section of the input, such as a chapter of a movie.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    /// Unit of `start` and `end`.
    pub time_base: Rational,
    pub start: i64,
    pub end: i64,
    /// Key/value tags, in container order.
    pub metadata: Vec<(String, String)>,
}

impl Chapter {
    pub fn new(id: i64, time_base: Rational, start: i64, end: i64) -> Self {
        Self {
            id,
            time_base,
            start,
            end,
            metadata: Vec::new(),
        }
    }

    /// Adds a tag.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chapter #{}: ", self.id)?;
        match (
            self.time_base.ticks_to_seconds(self.start),
            self.time_base.ticks_to_seconds(self.end),
        ) {
            (Some(start), Some(end)) => write!(f, "start {start:.3}s, end {end:.3}s"),
            _ => write!(
                f,
                "start {}, end {} (time base {})",
                self.start, self.end, self.time_base
            ),
        }
    }
}

/// A demuxer-like source of packets.
pub trait PacketReader: Send + 'static {
    /// Streams this reader produces, in index order.
    fn streams(&self) -> &[StreamDef];

    /// Container-level tags such as title or encoder.
    fn metadata(&self) -> &[(String, String)] {
        &[]
    }

    fn chapters(&self) -> &[Chapter] {
        &[]
    }

    /// Replaces the payload of `buffer` with the next packet.
    ///
    /// Returns `Ok(None)` at end of input; the buffer content is unspecified
    /// in that case. I/O failures are returned as errors.
    fn read_packet(&mut self, buffer: &mut Buffer) -> Result<Option<PacketInfo>>;
}

/// A scripted packet held by a [`MemoryReader`].
#[derive(Debug, Clone)]
struct MemoryPacket {
    info: PacketInfo,
    payload: Vec<u8>,
}

/// Reader that replays packets queued in memory.
///
/// # Examples
///
/// ```
/// use pushflow::{Buffer, Rational};
/// use pushflow_elements::{
///     reader::{MemoryReader, PacketReader},
///     streamdef::{StreamDef, StreamDetails},
/// };
///
/// let mut reader = MemoryReader::new(vec![StreamDef::new(
///     "telemetry",
///     Rational::new(1, 1000),
///     StreamDetails::Data,
/// )])
/// .with_packet(0, Some(40), b"abc".to_vec());
///
/// let mut buffer = Buffer::with_capacity(16);
/// let packet = reader.read_packet(&mut buffer).unwrap().unwrap();
/// assert_eq!(packet.pts, Some(40));
/// assert_eq!(buffer.data(), b"abc");
/// assert!(reader.read_packet(&mut buffer).unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    streams: Vec<StreamDef>,
    packets: VecDeque<MemoryPacket>,
    metadata: Vec<(String, String)>,
    chapters: Vec<Chapter>,
}

impl MemoryReader {
    pub fn new(streams: Vec<StreamDef>) -> Self {
        Self {
            streams,
            ..Self::default()
        }
    }

    /// Adds a container-level tag.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Queues a packet for `stream_index`.
    pub fn with_packet(mut self, stream_index: usize, pts: Option<i64>, payload: Vec<u8>) -> Self {
        self.push_packet(stream_index, pts, payload);
        self
    }

    pub fn push_packet(&mut self, stream_index: usize, pts: Option<i64>, payload: Vec<u8>) {
        self.packets.push_back(MemoryPacket {
            info: PacketInfo { stream_index, pts },
            payload,
        });
    }

    /// Packets not read yet.
    pub fn remaining(&self) -> usize {
        self.packets.len()
    }
}

impl PacketReader for MemoryReader {
    fn streams(&self) -> &[StreamDef] {
        &self.streams
    }

    fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    fn read_packet(&mut self, buffer: &mut Buffer) -> Result<Option<PacketInfo>> {
        Ok(self.packets.pop_front().map(|packet| {
            buffer.set_payload(&packet.payload);
            packet.info
        }))
    }
}

/// Reader that splits any byte stream into fixed-size data packets.
///
/// Exposes a single data stream. Packet `n` gets pts `n`; the stream's time
/// base says how long one chunk lasts.
pub struct ChunkedFileReader<R = BufReader<File>> {
    input: R,
    chunk_size: usize,
    next_pts: i64,
    streams: [StreamDef; 1],
}

impl ChunkedFileReader {
    /// Opens `path` for reading in chunks of `chunk_size` bytes.
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), chunk_size, "opened input file");
        Ok(Self::from_reader(
            BufReader::new(file),
            chunk_size,
            path.display().to_string(),
        ))
    }
}

impl<R: Read> ChunkedFileReader<R> {
    /// Wraps an arbitrary byte source.
    pub fn from_reader(input: R, chunk_size: usize, label: impl Into<String>) -> Self {
        Self {
            input,
            chunk_size: chunk_size.max(1),
            next_pts: 0,
            streams: [StreamDef::new(
                label,
                Rational::default(),
                StreamDetails::Data,
            )],
        }
    }

    /// Sets the time base of chunk timestamps.
    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.streams[0].time_base = time_base;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<R: Read + Send + 'static> PacketReader for ChunkedFileReader<R> {
    fn streams(&self) -> &[StreamDef] {
        &self.streams
    }

    fn read_packet(&mut self, buffer: &mut Buffer) -> Result<Option<PacketInfo>> {
        let data = buffer.data_mut();
        data.clear();
        let read = (&mut self.input)
            .take(self.chunk_size as u64)
            .read_to_end(data)?;
        if read == 0 {
            return Ok(None);
        }
        let pts = self.next_pts;
        self.next_pts += 1;
        Ok(Some(PacketInfo {
            stream_index: 0,
            pts: Some(pts),
        }))
    }
}
