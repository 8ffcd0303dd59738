//! Audio recording feature for wymowa.
//!
//! Provides microphone capture and materialization of one recording
//! session into a playable WAV file.

pub mod audio;

pub use audio::AudioRecorder;
