//! Audio sink backends for ptplay.
//!
//! Each voice opens its own stream on a sink and feeds it 16-bit PCM at
//! the voice's own sample rate. Backends decide how that reaches a device.

mod capture;
mod cpal_backend;
mod negotiate;
mod null_backend;
mod traits;

pub use capture::{CaptureSink, StreamRecord};
pub use cpal_backend::CpalSink;
pub use negotiate::{negotiate, session_sink, Backend};
pub use null_backend::NullSink;
pub use traits::{AudioError, AudioSink, StreamHandle};
