//! Live microphone capture
//!
//! The cpal input callback is the producer: it converts whatever sample format
//! the device delivers to f32 and hands the interleaved fragment to the ring.
//! Both conversion buffers live in the callback, so steady state never allocates.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};

use super::ring::RingWriter;
use crate::error::{Error, Result};

/// A running input stream (kept alive while held)
pub struct Capture {
    _stream: cpal::Stream,
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Capture {
    /// Open the default input device and start feeding `writer`
    pub fn start(writer: RingWriter, expected_sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(Error::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| Error::Stream(format!("Failed to get input config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        if sample_rate != expected_sample_rate {
            log::warn!(
                "Input runs at {}Hz, analysis assumes {}Hz; bar positions will shift",
                sample_rate,
                expected_sample_rate
            );
        }

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, writer)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, writer)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, writer)?,
            other => {
                return Err(Error::Stream(format!(
                    "Unsupported sample format {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::Stream(format!("Failed to start input stream: {}", e)))?;

        log::info!(
            "Capture: {} @ {}Hz, {} channel(s)",
            device_name,
            sample_rate,
            channels
        );

        Ok(Self {
            _stream: stream,
            device_name,
            sample_rate,
            channels,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    writer: RingWriter,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut converted: Vec<f32> = Vec::new();
    let mut mono: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&s| f32::from_sample(s)));
                writer.push_fragment_with(&converted, channels, &mut mono);
            },
            |err| log::warn!("Audio input error: {}", err),
            None,
        )
        .map_err(|e| Error::Stream(format!("Failed to build input stream: {}", e)))
}
