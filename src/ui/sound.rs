//! Sound engine: procedural retro sound cues via rodio.
//!
//! Every cue is synthesized into an in-memory WAV buffer at start-up and
//! played fire-and-forget through a detached rodio `Sink`.
//!
//! Without the "sound" feature the stub engine does nothing.

use crate::domain::soil::SoilKind;
use crate::sim::event::StageEvent;

/// Sound cue for a stage event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    Dig,
    Hint,
    Treasure,
    Blocked,
    Zoom,
}

impl Cue {
    pub const ALL: [Cue; 5] = [Cue::Dig, Cue::Hint, Cue::Treasure, Cue::Blocked, Cue::Zoom];

    pub fn for_event(event: &StageEvent) -> Option<Cue> {
        match event {
            StageEvent::SoilOpened { kind, .. } if kind.is_obstacle() => Some(Cue::Blocked),
            StageEvent::SoilOpened { kind, .. } if kind.is_precious() => Some(Cue::Treasure),
            StageEvent::SoilOpened { kind: SoilKind::Nothing, .. } => None,
            StageEvent::SoilOpened { .. } => Some(Cue::Dig),
            StageEvent::HintShown { .. } | StageEvent::HintRevealed { .. } => Some(Cue::Hint),
            StageEvent::ZoomToggled { .. } => Some(Cue::Zoom),
            StageEvent::PlayerMoved { .. }
            | StageEvent::ElevatorTracked { .. }
            | StageEvent::FieldOfViewChanged { .. } => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{info, warn};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    info!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };
            let buffers = Cue::ALL
                .into_iter()
                .map(|cue| (cue, Arc::new(make_wav(&synthesize(cue)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, cue: Cue) {
            let Some(buf) = self.buffers.get(&cue) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                        sink.append(src);
                        sink.detach();
                    }
                }
                Err(e) => warn!(error = %e, ?cue, "could not open sink"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn synthesize(cue: Cue) -> Vec<f32> {
        match cue {
            // pick on rock: noisy thud with falling pitch
            Cue::Dig => sweep(320.0, 140.0, 0.10, 0.6),
            // soft two-note sparkle
            Cue::Hint => notes(&[1319.0, 1760.0], 0.05, 0.18),
            // C6, E6, G6, C7
            Cue::Treasure => notes(&[1047.0, 1319.0, 1568.0, 2093.0], 0.06, 0.25),
            // dull low buzz
            Cue::Blocked => sweep(180.0, 90.0, 0.16, 0.2),
            Cue::Zoom => sweep(500.0, 900.0, 0.06, 0.0),
        }
    }

    /// Tone gliding from `from_hz` to `to_hz`, mixed with `noise` share of
    /// white noise.
    fn sweep(from_hz: f32, to_hz: f32, duration: f32, noise: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut seed: u32 = 0x2545_f491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from_hz + (to_hz - from_hz) * t;
                phase += freq / SAMPLE_RATE as f32;
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let white = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let tone = (phase * TAU).sin();
                let env = (1.0 - t).powf(0.8);
                (tone * (1.0 - noise) + white * noise) * env * 0.3
            })
            .collect()
    }

    /// Arpeggio of sine + third harmonic notes.
    fn notes(freqs: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        freqs
            .iter()
            .flat_map(|&freq| {
                (0..n).map(move |i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let env = 1.0 - (i as f32 / n as f32).sqrt();
                    let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                    wave * env * volume
                })
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = synthesize(Cue::Treasure);
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn cues_stay_in_range() {
            for cue in Cue::ALL {
                let samples = synthesize(cue);
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}
