//! Microphone capture and WAV materialization.
//!
//! This module handles audio input device management and PCM sample
//! capture. One [`AudioRecorder`] owns at most one live recording session:
//! `start` acquires the device and begins accumulating mono samples,
//! `finalize` releases the hardware and collapses the session into a
//! single WAV file, `abort` releases the hardware and discards everything.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::assessment::AudioSelection;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Records audio from a specified or default input device.
///
/// Features:
/// - Captures from a specified input device or system default at its native sample rate
/// - Converts multi-channel audio to mono by averaging channels
/// - Exposes the sample buffer during recording for the live level meter
/// - Exactly one open session per recorder, ended by finalize or abort
pub struct AudioRecorder {
    /// Actual recording sample rate from device
    sample_rate: u32,
    /// Recorded audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active audio input stream (kept alive during recording)
    stream: Option<cpal::Stream>,
    /// Device name or "default" to use the system default device
    device_name: String,
}

impl AudioRecorder {
    /// Creates a new audio recorder with requested sample rate and device.
    ///
    /// # Arguments
    /// * `requested_sample_rate` - The desired sample rate in Hz (actual may differ based on device)
    /// * `device_name` - Device name/ID to use. Use "default" for system default device
    ///
    /// Note: The actual recording sample rate may differ based on device capabilities.
    /// Call `sample_rate()` after `start()` to get the actual rate.
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            device_name,
        }
    }

    /// Starts a recording session on the configured input device.
    ///
    /// # Errors
    /// - If a session is already open
    /// - If the specified device is not available
    /// - If device configuration fails
    /// - If audio stream creation fails
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(anyhow!("A recording session is already open"));
        }

        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                // Try to find device by name or index
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        // Update to actual device parameters
        self.sample_rate = device_sample_rate;

        // Fresh buffer for this session
        self.samples.lock().unwrap().clear();

        let samples_arc = Arc::clone(&self.samples);
        let callback_channels = num_channels;

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                Self::handle_audio_callback(data, &samples_arc, callback_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Ends the session and materializes the recording as one WAV file.
    ///
    /// The input stream is released first, so the hardware is freed even
    /// when no samples arrived; an empty session still produces a (silent)
    /// file, mirroring the zero-chunk recording of the original form.
    ///
    /// # Errors
    /// - If no session is open
    /// - If the WAV file cannot be written
    pub fn finalize(&mut self, output_path: PathBuf) -> Result<AudioSelection> {
        if self.stream.is_none() {
            return Err(anyhow!("No recording session is open"));
        }

        // Release the hardware stream before touching the samples
        self.stream = None;

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let sample_count = samples.len();

        if sample_count == 0 {
            tracing::warn!("Recording finalized with no samples captured");
        } else {
            let duration_secs = sample_count as f32 / self.sample_rate as f32;
            tracing::info!(
                "Recording finalized: {:.2}s ({} samples at {}Hz)",
                duration_secs,
                sample_count,
                self.sample_rate
            );
        }

        self.save_wav(&samples, &output_path)?;

        let size_bytes = std::fs::metadata(&output_path)?.len();
        tracing::info!(
            "Audio saved: {} ({} bytes)",
            output_path.display(),
            size_bytes
        );

        Ok(AudioSelection::new(output_path, size_bytes))
    }

    /// Ends the session and discards everything captured so far.
    ///
    /// Releases the hardware stream; calling abort with no open session
    /// is a no-op.
    pub fn abort(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Recording aborted, stream released");
        }
        self.samples.lock().unwrap().clear();
    }

    /// Whether a recording session is currently open.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Handles incoming audio data from the audio callback.
    ///
    /// Converts multi-channel audio to mono by averaging all channels.
    fn handle_audio_callback(
        data: &[i16],
        samples_arc: &Arc<Mutex<Vec<i16>>>,
        num_channels: usize,
    ) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => {
                // Mono: use samples directly
                samples.extend_from_slice(data);
            }
            2 => {
                // Stereo: average pairs of samples
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    let mono = ((left + right) / 2) as i16;
                    samples.push(mono);
                }
            }
            _ => {
                // Multi-channel: average all channels per sample
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    let mono = (sum / num_channels as i32) as i16;
                    samples.push(mono);
                }
            }
        }
    }

    /// Saves audio samples as a mono 16-bit PCM WAV file.
    fn save_wav(&self, samples: &[i16], path: &Path) -> Result<()> {
        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, wav_spec)?;

        for &sample in samples {
            writer.write_sample(sample)?;
        }

        writer.finalize()?;
        tracing::debug!("WAV written: {}", path.display());
        Ok(())
    }

    // Getters for recorded data

    /// Returns a clone of all samples captured so far in this session.
    pub fn samples(&self) -> Vec<i16> {
        self.samples.lock().unwrap().clone()
    }

    /// Returns the number of samples captured so far.
    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    /// Returns the actual sample rate of the recording.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - Either "default" for system default, a device name, or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    // Try to find by name
    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'wymowa list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    // Open /dev/null for writing
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    // Redirect stderr to /dev/null
    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    // Execute the closure
    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_without_session_errors() {
        let mut recorder = AudioRecorder::new(16000, "default".to_string());
        assert!(!recorder.is_active());
        let result = recorder.finalize(std::env::temp_dir().join("wymowa-test.wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_abort_without_session_is_noop() {
        let mut recorder = AudioRecorder::new(16000, "default".to_string());
        recorder.abort();
        assert!(!recorder.is_active());
        assert_eq!(recorder.sample_count(), 0);
    }
}
