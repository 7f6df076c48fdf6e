// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

use pushflow::{
    Buffer, BufferPool, ElementBehavior, ElementContext, PayloadKind, Result, config::ElementConfig,
};
use tracing::{debug, info, trace};

use super::state::{Route, SourceStatus, State};
use crate::reader::{PacketInfo, PacketReader};

/// Payload kinds that get an output pin, in pin order.
const ROUTED_KINDS: [PayloadKind; 4] = [
    PayloadKind::Video,
    PayloadKind::Audio,
    PayloadKind::Subtitle,
    PayloadKind::Data,
];

/// Source element behavior reading packets from a [`PacketReader`].
///
/// Owns a fixed pool of buffers. Each work pass first takes back the buffers
/// consumers have released, then reads packets until the pool runs dry.
pub struct PacketSource<R> {
    config: ElementConfig,
    reader: R,
    pool: BufferPool,
    status: SourceStatus,
    state: State,
}

impl<R: PacketReader> PacketSource<R> {
    /// Allocates `config.pool_size` buffers for `reader`.
    pub fn new(config: ElementConfig, reader: R) -> Self {
        let pool = BufferPool::new(config.pool_size, config.buffer_capacity);
        Self {
            config,
            reader,
            pool,
            status: SourceStatus::default(),
            state: State::default(),
        }
    }

    /// Handle to the buffer pool, for observing how many buffers are out.
    pub fn pool(&self) -> BufferPool {
        self.pool.clone()
    }

    pub fn status(&self) -> SourceStatus {
        self.status.clone()
    }

    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    /// Retires every buffer consumers have handed back.
    ///
    /// Retiring drops the old payload and puts a fresh buffer in its slot.
    fn reap(&self, context: &ElementContext) -> Result<()> {
        let mut reaped = 0usize;
        for pin in context.outputs().snapshot()? {
            while let Some(buffer) = pin.try_get_available_buffer()? {
                self.pool.retire(buffer)?;
                reaped += 1;
            }
        }
        if reaped > 0 {
            trace!(element = %context.name(), reaped, "buffers reclaimed");
        }
        Ok(())
    }

    /// Logs the container tags and the chapter list.
    fn log_container(&self, context: &ElementContext) {
        let metadata = self.reader.metadata();
        if !metadata.is_empty() {
            info!(element = %context.name(), count = metadata.len(), "metadata");
            for (key, value) in metadata {
                context.log(format_args!("{key}: {value}"));
            }
        }

        let chapters = self.reader.chapters();
        if !chapters.is_empty() {
            info!(element = %context.name(), count = chapters.len(), "chapters");
            for chapter in chapters {
                context.log(chapter);
                for (key, value) in &chapter.metadata {
                    context.log(format_args!("    {key}: {value}"));
                }
            }
        }
    }

    /// Sends a filled buffer to its stream's pin, or retires it when the
    /// stream has no pin or the pin is not connected.
    fn route(&self, packet: PacketInfo, mut buffer: Buffer) -> Result<()> {
        let Some(route) = self.state.routes.get(packet.stream_index) else {
            self.status.record_dropped();
            return self.pool.retire(buffer);
        };
        buffer.set_time_base(route.time_base);
        if let Some(seconds) = packet
            .pts
            .and_then(|pts| route.time_base.ticks_to_seconds(pts))
        {
            buffer.set_timestamp(seconds);
        }

        let Some(pin) = &route.pin else {
            self.status.record_dropped();
            return self.pool.retire(buffer);
        };
        match pin.send_buffer(buffer) {
            Ok(()) => {
                self.status.record_sent();
                Ok(())
            }
            Err(err) => {
                trace!("packet for stream {} not sent: {}", packet.stream_index, err.error);
                self.status.record_dropped();
                self.pool.retire(err.into_buffer())
            }
        }
    }
}

impl<R: PacketReader> ElementBehavior for PacketSource<R> {
    fn initialize(&mut self, context: &ElementContext) -> Result<()> {
        // Buffers parked on pins from an earlier run go home first.
        self.reap(context)?;
        self.state = State::default();
        self.status.set_end_of_stream(false);

        self.log_container(context);
        let streams = self.reader.streams();
        info!(element = %context.name(), count = streams.len(), "streams");
        let mut routes: Vec<Route> = streams
            .iter()
            .map(|stream| Route {
                pin: None,
                time_base: stream.time_base,
            })
            .collect();

        for kind in ROUTED_KINDS {
            let Some((index, stream)) = streams
                .iter()
                .enumerate()
                .find(|(_, stream)| stream.kind() == kind)
            else {
                continue;
            };
            // Pins outlive a run: buffers still held downstream are
            // released to them.
            let name = kind.to_string();
            let pin = match context.outputs().find(&name)? {
                Some(pin) => pin,
                None => context.add_output_pin(name, stream.pin_info())?,
            };
            routes[index].pin = Some(pin);
        }

        for (index, stream) in streams.iter().enumerate() {
            let routed = routes[index].pin.is_some();
            context.log(format_args!("stream #{index} - {stream} routed={routed}"));
        }

        self.state.routes = routes;
        Ok(())
    }

    fn do_work(&mut self, context: &ElementContext) -> Result<()> {
        self.reap(context)?;
        if self.status.end_of_stream() {
            return Ok(());
        }

        loop {
            let mut buffer = match self.pool.try_pop() {
                Ok(buffer) => buffer,
                Err(err) if err.is_transient() => return Ok(()),
                Err(err) => return Err(err),
            };
            let packet = match self.reader.read_packet(&mut buffer) {
                Ok(packet) => packet,
                Err(err) => {
                    self.pool.push(buffer)?;
                    return Err(err);
                }
            };
            let Some(packet) = packet else {
                self.pool.push(buffer)?;
                self.status.set_end_of_stream(true);
                info!(
                    element = %context.name(),
                    sent = self.status.packets_sent(),
                    dropped = self.status.packets_dropped(),
                    "end of stream"
                );
                return Ok(());
            };
            self.route(packet, buffer)?;
        }
    }

    fn idling(&mut self, context: &ElementContext) -> Result<()> {
        debug!(element = %context.name(), outstanding = self.pool.outstanding()?, "source idle");
        self.reap(context)
    }
}
