use crate::coordinator::ChunkAudio;
use crate::error::TtsError;

/// Number of silent samples for a gap of `gap_seconds` at `sample_rate`.
pub fn gap_samples(sample_rate: u32, gap_seconds: f32) -> usize {
    (sample_rate as f64 * gap_seconds.max(0.0) as f64).round() as usize
}

/// Join per-chunk audio into one timeline with silence between chunks.
///
/// The first segment's rate is used for the whole result; later segments are
/// assumed to match and are not resampled. No gap is added before the first
/// or after the last segment.
pub fn stitch(segments: Vec<ChunkAudio>, gap_seconds: f32) -> Result<ChunkAudio, TtsError> {
    let mut segments = segments.into_iter();
    let first = segments.next().ok_or(TtsError::EmptyInput)?;

    let sample_rate = first.sample_rate;
    let rest: Vec<ChunkAudio> = segments.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let gap = vec![0.0f32; gap_samples(sample_rate, gap_seconds)];
    let total = first.samples.len()
        + rest.iter().map(|s| s.samples.len()).sum::<usize>()
        + gap.len() * rest.len();

    let mut samples = Vec::with_capacity(total);
    samples.extend_from_slice(&first.samples);
    for segment in rest {
        samples.extend_from_slice(&gap);
        samples.extend(segment.samples);
    }

    Ok(ChunkAudio {
        samples,
        sample_rate,
    })
}
