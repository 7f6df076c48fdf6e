// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Payload buffers and the pool they are recycled through.
//!
//! # Key Types
//!
//! - [`Buffer`]: An owned payload plus timestamp and time base
//! - [`BufferPool`]: A fixed set of buffers shared by one producer
//! - [`Rational`]: Time base of a buffer's timestamp
//!
//! A buffer is owned by exactly one party at a time: the pool, a pin queue,
//! or the producer filling it. Moving the value is the ownership transfer.

pub mod data;
pub mod pool;
