// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Buffer handoff between connected pins and elements.
//!
//! # Test Coverage
//!
//! - Connection rules (kinds, single peer, disconnect)
//! - FIFO delivery and return of buffers to their producer
//! - Pool conservation and exhaustion across two running elements
//! - Flush on demand and on terminate
//! - Every buffer accounted for while paused, flushed and terminated

mod common;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use common::{eventually, settle, setup_test};
use pushflow::{
    Buffer, BufferPool, Element, ElementBehavior, ElementContext, Error, ExecutionState, InPin,
    MediaState, OutPin, PayloadKind, Pin, PinInfo,
};

fn data_pins() -> (OutPin, InPin) {
    (
        OutPin::new("out", PinInfo::new(PayloadKind::Data)),
        InPin::new("in", PinInfo::new(PayloadKind::Data)),
    )
}

fn numbered(sequence: u32) -> Buffer {
    let mut buffer = Buffer::with_capacity(4);
    buffer.set_payload(&sequence.to_le_bytes());
    buffer
}

fn sequence_of(buffer: &Buffer) -> u32 {
    u32::from_le_bytes(buffer.data()[..4].try_into().unwrap())
}

#[test]
fn incompatible_kinds_are_rejected() {
    setup_test();
    let video = OutPin::new("video", PinInfo::new(PayloadKind::Video));
    let audio = InPin::new("audio", PinInfo::new(PayloadKind::Audio));
    assert!(matches!(
        video.connect(&audio),
        Err(Error::IncompatibleConnection {
            source_kind: PayloadKind::Video,
            sink_kind: PayloadKind::Audio,
        })
    ));
    assert!(!video.is_connected().unwrap());
    assert!(!audio.is_connected().unwrap());
}

#[test]
fn a_pin_has_at_most_one_peer() {
    setup_test();
    let (out, input) = data_pins();
    let (other_out, other_input) = data_pins();
    out.connect(&input).unwrap();

    assert!(matches!(out.connect(&other_input), Err(Error::AlreadyConnected)));
    assert!(matches!(other_out.connect(&input), Err(Error::AlreadyConnected)));
    assert!(!other_input.is_connected().unwrap());

    out.disconnect().unwrap();
    assert!(!out.is_connected().unwrap());
    assert!(!input.is_connected().unwrap());
    other_out.connect(&input).unwrap();
    out.connect(&other_input).unwrap();

    // Disconnecting twice is harmless.
    out.disconnect().unwrap();
    out.disconnect().unwrap();
}

#[test]
fn dropped_peer_frees_the_pin() {
    setup_test();
    let (out, input) = data_pins();
    out.connect(&input).unwrap();
    drop(input);
    assert!(!out.is_connected().unwrap());
    let (_, replacement) = data_pins();
    out.connect(&replacement).unwrap();
}

#[test]
fn buffers_arrive_in_send_order_and_come_back() {
    setup_test();
    let (out, input) = data_pins();
    out.connect(&input).unwrap();
    for sequence in 0..10 {
        out.send_buffer(numbered(sequence)).unwrap();
    }
    assert_eq!(input.queued().unwrap(), 10);

    for expected in 0..10 {
        let buffer = input.try_receive().unwrap().unwrap();
        assert_eq!(sequence_of(&buffer), expected);
        input.release(buffer).unwrap();
    }
    assert!(input.try_receive().unwrap().is_none());
    assert_eq!(out.available_count().unwrap(), 10);
    let recycled = out.try_get_available_buffer().unwrap().unwrap();
    assert_eq!(sequence_of(&recycled), 0);
}

#[test]
fn send_without_peer_hands_the_buffer_back() {
    setup_test();
    let (out, input) = data_pins();
    let err = out.send_buffer(numbered(7)).unwrap_err();
    assert!(matches!(err.error, Error::NotConnected));
    assert_eq!(sequence_of(&err.into_buffer()), 7);

    out.connect(&input).unwrap();
    out.disconnect().unwrap();
    let err = out.send_buffer(numbered(8)).unwrap_err();
    assert!(matches!(Error::from(err), Error::NotConnected));
    assert_eq!(input.queued().unwrap(), 0);
}

#[test]
fn queued_buffers_survive_disconnect() {
    setup_test();
    let (out, input) = data_pins();
    out.connect(&input).unwrap();
    out.send_buffer(numbered(1)).unwrap();
    out.send_buffer(numbered(2)).unwrap();
    out.disconnect().unwrap();

    let buffer = input.try_receive().unwrap().unwrap();
    assert_eq!(sequence_of(&buffer), 1);
    input.release(buffer).unwrap();
    assert_eq!(out.available_count().unwrap(), 1);

    // Once the producer is gone, releasing just drops the buffer.
    drop(out);
    let buffer = input.try_receive().unwrap().unwrap();
    input.release(buffer).unwrap();
}

#[test]
fn flush_returns_queued_buffers_to_the_producer() {
    setup_test();
    let (out, input) = data_pins();
    out.connect(&input).unwrap();
    for sequence in 0..3 {
        out.send_buffer(numbered(sequence)).unwrap();
    }
    input.flush().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert_eq!(out.available_count().unwrap(), 3);

    out.send_buffer(numbered(3)).unwrap();
    out.flush().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert_eq!(out.available_count().unwrap(), 4);
}

/// Sends `total` numbered buffers from a pool, recycling what comes back.
struct Producer {
    pool: BufferPool,
    total: u32,
    next: u32,
}

impl Producer {
    fn reclaim(&self, context: &ElementContext) -> pushflow::Result<()> {
        for pin in context.outputs().snapshot()? {
            while let Some(buffer) = pin.try_get_available_buffer()? {
                self.pool.push(buffer)?;
            }
        }
        Ok(())
    }
}

impl ElementBehavior for Producer {
    fn initialize(&mut self, context: &ElementContext) -> pushflow::Result<()> {
        context.add_output_pin("out", PinInfo::new(PayloadKind::Data))?;
        Ok(())
    }

    fn do_work(&mut self, context: &ElementContext) -> pushflow::Result<()> {
        self.reclaim(context)?;
        let Some(out) = context.outputs().get(0)? else {
            return Ok(());
        };
        while self.next < self.total {
            let mut buffer = match self.pool.try_pop() {
                Ok(buffer) => buffer,
                Err(err) if err.is_transient() => break,
                Err(err) => return Err(err),
            };
            buffer.set_payload(&self.next.to_le_bytes());
            if let Err(err) = out.send_buffer(buffer) {
                self.pool.push(err.into_buffer())?;
                break;
            }
            self.next += 1;
        }
        Ok(())
    }

    fn idling(&mut self, context: &ElementContext) -> pushflow::Result<()> {
        self.reclaim(context)
    }
}

/// Records received sequence numbers. While `hold` is set it keeps buffers
/// instead of releasing them.
struct Consumer {
    received: Arc<Mutex<Vec<u32>>>,
    hold: Arc<AtomicBool>,
    held: Vec<(InPin, Buffer)>,
}

impl ElementBehavior for Consumer {
    fn initialize(&mut self, context: &ElementContext) -> pushflow::Result<()> {
        context.add_input_pin("in", PinInfo::new(PayloadKind::Data))?;
        Ok(())
    }

    fn do_work(&mut self, context: &ElementContext) -> pushflow::Result<()> {
        if !self.hold.load(Ordering::SeqCst) {
            for (pin, buffer) in self.held.drain(..) {
                pin.release(buffer)?;
            }
        }
        for pin in context.inputs().snapshot()? {
            while let Some(buffer) = pin.try_receive()? {
                self.received.lock()?.push(sequence_of(&buffer));
                if self.hold.load(Ordering::SeqCst) {
                    self.held.push((pin.clone(), buffer));
                } else {
                    pin.release(buffer)?;
                }
            }
        }
        Ok(())
    }
}

struct Pipeline {
    source: Element,
    sink: Element,
    pool: BufferPool,
    received: Arc<Mutex<Vec<u32>>>,
    hold: Arc<AtomicBool>,
}

impl Pipeline {
    fn new(pool_size: usize, total: u32, hold: bool) -> Self {
        let pool = BufferPool::new(pool_size, 4);
        let received = Arc::new(Mutex::new(Vec::new()));
        let hold = Arc::new(AtomicBool::new(hold));
        let source = Element::new(
            "producer",
            Producer {
                pool: pool.clone(),
                total,
                next: 0,
            },
        );
        let sink = Element::new(
            "consumer",
            Consumer {
                received: received.clone(),
                hold: hold.clone(),
                held: Vec::new(),
            },
        );
        Self {
            source,
            sink,
            pool,
            received,
            hold,
        }
    }

    fn start(&self) {
        for element in [&self.source, &self.sink] {
            element.execute().unwrap();
            element
                .wait_for_execution_state(ExecutionState::Idle)
                .unwrap();
        }
        let out = self.source.outputs().find("out").unwrap().unwrap();
        let input = self.sink.inputs().find("in").unwrap().unwrap();
        out.connect(&input).unwrap();
        self.sink.set_state(MediaState::Play).unwrap();
        self.source.set_state(MediaState::Play).unwrap();
    }

    fn received(&self) -> Vec<u32> {
        self.received.lock().unwrap().clone()
    }
}

#[test]
fn pipeline_delivers_in_order_and_conserves_buffers() {
    setup_test();
    let pipeline = Pipeline::new(4, 200, false);
    pipeline.start();

    assert!(eventually(|| pipeline.received().len() == 200));
    assert_eq!(pipeline.received(), (0..200).collect::<Vec<_>>());
    assert!(eventually(|| pipeline.pool.available().unwrap() == 4));
    assert_eq!(pipeline.pool.outstanding().unwrap(), 0);

    pipeline.source.set_state(MediaState::Pause).unwrap();
    pipeline.source.terminate().unwrap();
    pipeline.sink.terminate().unwrap();
}

#[test]
fn exhausted_pool_stalls_the_producer_until_buffers_return() {
    setup_test();
    let pipeline = Pipeline::new(4, 10, true);
    pipeline.start();

    assert!(eventually(|| pipeline.received().len() == 4));
    settle();
    assert_eq!(pipeline.received().len(), 4);
    assert_eq!(pipeline.pool.available().unwrap(), 0);
    assert!(matches!(pipeline.pool.try_pop(), Err(Error::PoolExhausted)));

    pipeline.hold.store(false, Ordering::SeqCst);
    pipeline.sink.wake().unwrap();
    assert!(eventually(|| pipeline.received().len() == 10));
    assert_eq!(pipeline.received(), (0..10).collect::<Vec<_>>());
    assert!(eventually(|| pipeline.pool.available().unwrap() == 4));

    pipeline.source.terminate().unwrap();
    pipeline.sink.terminate().unwrap();
}

#[test]
fn terminating_an_idle_sink_returns_its_queue() {
    setup_test();
    let pipeline = Pipeline::new(4, 3, false);
    for element in [&pipeline.source, &pipeline.sink] {
        element.execute().unwrap();
        element
            .wait_for_execution_state(ExecutionState::Idle)
            .unwrap();
    }
    let out = pipeline.source.outputs().find("out").unwrap().unwrap();
    let input = pipeline.sink.inputs().find("in").unwrap().unwrap();
    out.connect(&input).unwrap();

    // The sink stays paused, so everything piles up on its input.
    pipeline.source.set_state(MediaState::Play).unwrap();
    assert!(eventually(|| input.queued().unwrap() == 3));
    assert!(pipeline.received().is_empty());

    pipeline.sink.terminate().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert!(eventually(|| pipeline.pool.available().unwrap() == 4));

    pipeline.source.terminate().unwrap();
}

#[test]
fn element_flush_drains_connected_sinks() {
    setup_test();
    let pipeline = Pipeline::new(2, 2, false);
    for element in [&pipeline.source, &pipeline.sink] {
        element.execute().unwrap();
        element
            .wait_for_execution_state(ExecutionState::Idle)
            .unwrap();
    }
    let out = pipeline.source.outputs().find("out").unwrap().unwrap();
    let input = pipeline.sink.inputs().find("in").unwrap().unwrap();
    out.connect(&input).unwrap();
    pipeline.source.set_state(MediaState::Play).unwrap();
    assert!(eventually(|| input.queued().unwrap() == 2));

    pipeline.source.flush().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert!(eventually(|| pipeline.pool.available().unwrap() == 2));

    out.disconnect().unwrap();
    assert!(!input.is_connected().unwrap());
}

/// Buffers that belong to `pool`, wherever they currently are.
fn accounted(pool: &BufferPool, out: &OutPin, input: &InPin, held: &[Buffer]) -> usize {
    pool.available().unwrap()
        + input.queued().unwrap()
        + out.available_count().unwrap()
        + held.len()
}

#[test]
fn buffers_are_accounted_for_at_every_stop() {
    setup_test();
    const POOL_SIZE: usize = 4;
    let pool = BufferPool::new(POOL_SIZE, 4);
    let source = Element::new(
        "counted",
        Producer {
            pool: pool.clone(),
            total: 1000,
            next: 0,
        },
    );
    source.execute().unwrap();
    source
        .wait_for_execution_state(ExecutionState::Idle)
        .unwrap();
    let out = source.outputs().find("out").unwrap().unwrap();
    let input = InPin::new("in", PinInfo::new(PayloadKind::Data));
    out.connect(&input).unwrap();
    let mut held = Vec::new();

    // Nobody consumes, so the producer stalls with everything queued.
    source.set_state(MediaState::Play).unwrap();
    assert!(eventually(|| input.queued().unwrap() == POOL_SIZE));
    assert_eq!(pool.available().unwrap(), 0);
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    held.push(input.try_receive().unwrap().unwrap());
    held.push(input.try_receive().unwrap().unwrap());
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    // One buffer back lets the producer send exactly one more.
    input.release(held.pop().unwrap()).unwrap();
    assert!(eventually(|| input.queued().unwrap() == POOL_SIZE - 1));
    assert_eq!(pool.available().unwrap(), 0);
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    // Paused, a released buffer waits on the output pin.
    source.set_state(MediaState::Pause).unwrap();
    source
        .wait_for_execution_state(ExecutionState::Idle)
        .unwrap();
    settle();
    input.release(held.pop().unwrap()).unwrap();
    assert_eq!(out.available_count().unwrap(), 1);
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    input.flush().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert_eq!(out.available_count().unwrap(), POOL_SIZE);
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    source.set_state(MediaState::Play).unwrap();
    assert!(eventually(|| input.queued().unwrap() == POOL_SIZE));
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);
    held.push(input.try_receive().unwrap().unwrap());

    source.terminate().unwrap();
    assert_eq!(input.queued().unwrap(), 0);
    assert_eq!(out.available_count().unwrap(), POOL_SIZE - 1);
    assert_eq!(accounted(&pool, &out, &input, &held), POOL_SIZE);

    input.release(held.pop().unwrap()).unwrap();
    while let Some(buffer) = out.try_get_available_buffer().unwrap() {
        pool.push(buffer).unwrap();
    }
    assert_eq!(pool.available().unwrap(), POOL_SIZE);
    assert_eq!(pool.outstanding().unwrap(), 0);
}
