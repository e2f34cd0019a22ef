use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SAMPLE_RATE: u32 = 16_000;
pub const AMPLITUDE: f64 = 0.12;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Gaussian white noise as a mono 16-bit PCM WAV file image.
pub fn white_noise_wav<R: Rng>(seconds: u32, sample_rate: u32, amplitude: f64, rng: &mut R) -> Vec<u8> {
    let samples = sample_rate as usize * seconds as usize;
    let mut pcm = Vec::with_capacity(samples * 2);
    for _ in 0..samples {
        let z: f64 = StandardNormal.sample(rng);
        let v = (z * amplitude).clamp(-1.0, 1.0);
        pcm.extend_from_slice(&((v * 32767.0) as i16).to_le_bytes());
    }
    wav_bytes(&pcm, sample_rate)
}

fn wav_bytes(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

pub fn noise_file_name(minutes: u32) -> String {
    format!("white_noise_{minutes}min.wav")
}

/// Writes a noise track covering `minutes` into `dir`, reusing an existing one.
pub fn ensure_noise_file<R: Rng>(dir: &Path, minutes: u32, rng: &mut R) -> io::Result<PathBuf> {
    let path = dir.join(noise_file_name(minutes));
    if path.exists() {
        return Ok(path);
    }
    fs::create_dir_all(dir)?;
    let bytes = white_noise_wav(minutes * 60, SAMPLE_RATE, AMPLITUDE, rng);
    fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), minutes, "white noise track written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_wav_header_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let wav = white_noise_wav(1, 8_000, AMPLITUDE, &mut rng);
        assert_eq!(wav.len(), 44 + 8_000 * 2);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 16_000);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 8_000);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 16_000);
    }

    #[test]
    fn test_noise_is_quiet() {
        let mut rng = StdRng::seed_from_u64(11);
        let wav = white_noise_wav(1, 4_000, AMPLITUDE, &mut rng);
        let samples: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        let rms = (samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / samples.len() as f64).sqrt();
        // roughly amplitude * full scale
        assert!(rms > 0.08 * 32767.0 && rms < 0.16 * 32767.0, "rms {rms}");
    }

    #[test]
    fn test_ensure_noise_file_reuses_existing() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join(noise_file_name(2));
        fs::write(&existing, b"cached").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let path = ensure_noise_file(dir.path(), 2, &mut rng).unwrap();
        assert_eq!(path, existing);
        assert_eq!(fs::read(&path).unwrap(), b"cached");
    }
}
