use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default,
};

use crate::engine::{read_state, write_state, SharedState};
use crate::{AudioEngine, AudioError, AudioHandle, AudioResult, AudioState};

/// Audio engine backed by cpal + symphonia.
///
/// Previews are short clips, so the whole file is fetched (HTTP or `file://`),
/// decoded to f32 and played on the default output device. Everything happens
/// on a dedicated thread that owns the output stream; `play` blocks until the
/// stream has started or acquisition failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioEngine;

impl AudioEngine for CpalAudioEngine {
    fn play(&self, url: &str) -> AudioResult<AudioHandle> {
        let state = Arc::new(Mutex::new(AudioState::Playing));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let url = url.to_string();

        let join = thread::spawn({
            let state = state.clone();
            let stop_flag = stop_flag.clone();
            move || playback_thread(&url, state, stop_flag, ready_tx)
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(AudioHandle::new(state, stop_flag, join, None)),
            Ok(Err(err)) => {
                let _ = join.join();
                Err(err)
            }
            Err(_) => {
                let _ = join.join();
                Err(AudioError::Backend("playback thread exited early".into()))
            }
        }
    }
}

fn playback_thread(
    url: &str,
    state: SharedState,
    stop_flag: Arc<AtomicBool>,
    ready: mpsc::Sender<AudioResult<()>>,
) {
    let finished = Arc::new(AtomicBool::new(false));
    let stream = match fetch(url)
        .and_then(|(bytes, ext)| decode_to_f32(bytes, ext.as_deref()))
        .and_then(|decoded| open_stream(&decoded, state.clone(), finished.clone()))
    {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while !stop_flag.load(Ordering::SeqCst) && !finished.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(20));
    }
    drop(stream);

    if read_state(&state) == AudioState::Playing {
        if stop_flag.load(Ordering::SeqCst) {
            write_state(&state, AudioState::Stopped);
        } else {
            write_state(&state, AudioState::Completed);
        }
    }
}

fn fetch(url: &str) -> AudioResult<(Vec<u8>, Option<String>)> {
    let ext = extension_of(url);
    if let Some(path) = url.strip_prefix("file://") {
        let bytes = std::fs::read(path).map_err(|e| AudioError::Io(e.to_string()))?;
        return Ok((bytes, ext));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AudioError::UnsupportedSource(url.to_string()));
    }

    let bytes = reqwest::blocking::get(url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(|e| AudioError::Io(e.to_string()))?;
    Ok((bytes.to_vec(), ext))
}

fn extension_of(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

struct Decoded {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

fn decode_to_f32(bytes: Vec<u8>, ext: Option<&str>) -> AudioResult<Decoded> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = ext {
        hint.with_extension(ext);
    }

    let probed = default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Backend("no default track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Backend(e.to_string()))?;

    let mut samples = Vec::new();
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(err) => return Err(AudioError::Backend(err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            // a corrupt packet is skipped, not fatal
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                tracing::debug!("skipping undecodable packet: {err}");
                continue;
            }
            Err(err) => return Err(AudioError::Backend(err.to_string())),
        };
        let spec = *audio_buf.spec();
        channels = spec.channels.count();
        sample_rate = spec.rate;
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(AudioError::Backend("no audio decoded".into()));
    }
    Ok(Decoded {
        samples,
        channels: channels.max(1),
        sample_rate,
    })
}

fn open_stream(
    decoded: &Decoded,
    state: SharedState,
    finished: Arc<AtomicBool>,
) -> AudioResult<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Backend("no output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::Backend(format!(
            "unsupported sample format: {:?}",
            config.sample_format()
        )));
    }

    let out = remix(decoded, config.channels() as usize, config.sample_rate().0);
    let mut idx = 0usize;
    let finished_on_error = finished.clone();

    let stream = device
        .build_output_stream(
            &config.config(),
            move |data: &mut [f32], _| {
                for sample in data.iter_mut() {
                    *sample = match out.get(idx) {
                        Some(value) => {
                            idx += 1;
                            *value
                        }
                        None => 0.0,
                    };
                }
                if idx >= out.len() {
                    finished.store(true, Ordering::SeqCst);
                }
            },
            move |err| {
                tracing::error!("cpal stream error: {}", err);
                write_state(&state, AudioState::Error);
                finished_on_error.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    stream
        .play()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    Ok(stream)
}

/// Maps decoded frames onto the device layout (nearest-neighbour resampling,
/// channels duplicated or dropped as needed).
fn remix(decoded: &Decoded, out_channels: usize, out_rate: u32) -> Vec<f32> {
    let in_channels = decoded.channels.max(1);
    let out_channels = out_channels.max(1);
    let in_frames = decoded.samples.len() / in_channels;
    let in_rate = if decoded.sample_rate == 0 {
        out_rate
    } else {
        decoded.sample_rate
    };
    let ratio = in_rate as f64 / out_rate.max(1) as f64;
    let out_frames = (in_frames as f64 / ratio) as usize;

    let mut out = Vec::with_capacity(out_frames * out_channels);
    for frame in 0..out_frames {
        let src = ((frame as f64 * ratio) as usize).min(in_frames.saturating_sub(1));
        let base = src * in_channels;
        for ch in 0..out_channels {
            out.push(decoded.samples[base + ch.min(in_channels - 1)]);
        }
    }
    out
}
