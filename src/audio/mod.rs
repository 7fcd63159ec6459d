//! Audio capture and the lock-free ring buffer feeding it to the listening
//! state machine.

pub mod capture;
pub mod ring_buffer;

pub use capture::{list_devices, start_capture};
pub use ring_buffer::{audio_ring_buffer, AudioConsumer};
