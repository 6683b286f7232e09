//! Backend selection.
//!
//! The player probes for a device once; whatever it settles on is reused
//! for the rest of the session.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::cpal_backend::CpalSink;
use crate::null_backend::NullSink;
use crate::traits::{AudioError, AudioSink};

/// Requested output backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Device output if one opens, silence otherwise
    #[default]
    Auto,
    /// Device output or an error
    Cpal,
    /// No output
    Null,
}

/// Open a sink for `preference`.
///
/// `Auto` never fails: a missing device degrades to [`NullSink`].
pub fn negotiate(preference: Backend) -> Result<Arc<dyn AudioSink>, AudioError> {
    let sink: Arc<dyn AudioSink> = match preference {
        Backend::Null => Arc::new(NullSink::new()),
        Backend::Cpal => Arc::new(CpalSink::new().map_err(unavailable)?),
        Backend::Auto => match CpalSink::new() {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                warn!(error = %e, "no audio device, playing silently");
                Arc::new(NullSink::new())
            }
        },
    };
    debug!(backend = sink.name(), "audio sink selected");
    Ok(sink)
}

/// The session-wide sink, negotiated on first use.
///
/// Later calls return the cached sink whatever `preference` they pass.
pub fn session_sink(preference: Backend) -> Result<Arc<dyn AudioSink>, AudioError> {
    static SESSION: OnceLock<Arc<dyn AudioSink>> = OnceLock::new();
    if let Some(sink) = SESSION.get() {
        return Ok(sink.clone());
    }
    let sink = negotiate(preference)?;
    Ok(SESSION.get_or_init(|| sink).clone())
}

fn unavailable(e: AudioError) -> AudioError {
    match e {
        AudioError::SinkUnavailable(_) => e,
        other => AudioError::SinkUnavailable(other.to_string()),
    }
}
