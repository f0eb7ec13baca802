use std::io::Cursor;

use crate::error::TtsError;

/// Encode mono f32 samples as a 16-bit PCM WAV (RIFF) byte stream.
///
/// Samples are clipped to [-1.0, 1.0] and rounded to the nearest i16 step.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, TtsError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // WAV header (44 bytes) + 2 bytes per sample
    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample(quantize(s))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

fn quantize(sample: f32) -> i16 {
    // NaN clamps to NaN and casts to 0
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_header_describes_mono_pcm16() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5], 24000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, bytes.len() - 8);

        let (spec, samples) = decode(&bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn test_samples_are_clipped_and_rounded() {
        let bytes = encode_wav(&[2.0, -3.0, 1.0, -1.0, 0.0, 0.5], 16000).unwrap();
        let (_, samples) = decode(&bytes);
        assert_eq!(samples, vec![32767, -32767, 32767, -32767, 0, 16384]);
    }

    #[test]
    fn test_round_trip_within_one_step() {
        let input: Vec<f32> = (0..2000)
            .map(|i| ((i as f32) * 0.013).sin() * 1.2)
            .collect();
        let bytes = encode_wav(&input, 22050).unwrap();
        let (_, decoded) = decode(&bytes);

        assert_eq!(decoded.len(), input.len());
        for (orig, pcm) in input.iter().zip(decoded) {
            let expected = orig.clamp(-1.0, 1.0);
            let actual = pcm as f32 / i16::MAX as f32;
            assert!((expected - actual).abs() <= 1.0 / i16::MAX as f32);
        }
    }

    #[test]
    fn test_empty_samples_give_header_only() {
        let bytes = encode_wav(&[], 24000).unwrap();
        let (spec, samples) = decode(&bytes);
        assert_eq!(spec.sample_rate, 24000);
        assert!(samples.is_empty());
    }
}
