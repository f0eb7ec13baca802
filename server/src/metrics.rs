// Metrics collection and tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keep the last N latency samples for percentiles
const LATENCY_WINDOW: usize = 1000;

/// Per-endpoint metrics
#[derive(Debug, Clone)]
pub struct EndpointMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub total_latency_ms: Arc<AtomicU64>,
    pub min_latency_ms: Arc<AtomicU64>,
    pub max_latency_ms: Arc<AtomicU64>,
    latency_samples: Arc<Mutex<VecDeque<u64>>>,
}

impl EndpointMetrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            total_latency_ms: Arc::new(AtomicU64::new(0)),
            min_latency_ms: Arc::new(AtomicU64::new(u64::MAX)),
            max_latency_ms: Arc::new(AtomicU64::new(0)),
            latency_samples: Arc::new(Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW))),
        }
    }

    pub fn record_request(&self, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            samples.push_back(latency_ms);
            if samples.len() > LATENCY_WINDOW {
                samples.pop_front();
            }
        }
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.request_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    fn percentile(&self, p: u8) -> u64 {
        let Ok(samples) = self.latency_samples.lock() else {
            return 0;
        };
        if samples.is_empty() {
            return 0;
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
        sorted[index]
    }

    pub fn stats(&self) -> EndpointStats {
        let min = self.min_latency_ms.load(Ordering::Relaxed);
        EndpointStats {
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: if min == u64::MAX { 0 } else { min },
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
            p50_latency_ms: self.percentile(50),
            p95_latency_ms: self.percentile(95),
            p99_latency_ms: self.percentile(99),
        }
    }
}

impl Default for EndpointMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthesis-specific counters
#[derive(Debug, Clone, Default)]
pub struct SynthesisMetrics {
    pub synthesis_count: Arc<AtomicU64>,
    pub chunk_count: Arc<AtomicU64>,
    pub total_samples: Arc<AtomicU64>,
    pub total_audio_ms: Arc<AtomicU64>,
}

impl SynthesisMetrics {
    pub fn record_synthesis(&self, chunks: usize, samples: usize, audio_ms: u64) {
        self.synthesis_count.fetch_add(1, Ordering::Relaxed);
        self.chunk_count.fetch_add(chunks as u64, Ordering::Relaxed);
        self.total_samples.fetch_add(samples as u64, Ordering::Relaxed);
        self.total_audio_ms.fetch_add(audio_ms, Ordering::Relaxed);
    }

    pub fn avg_chunks_per_request(&self) -> f64 {
        let count = self.synthesis_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.chunk_count.load(Ordering::Relaxed) as f64 / count as f64
    }
}

/// All server metrics
#[derive(Debug, Clone)]
pub struct AppMetrics {
    pub speech: EndpointMetrics,
    pub synthesis: SynthesisMetrics,
    started_at: Instant,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            speech: EndpointMetrics::new(),
            synthesis: SynthesisMetrics::default(),
            started_at: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> MetricsResponse {
        MetricsResponse {
            timestamp: Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            speech: self.speech.stats(),
            synthesis: SynthesisStats {
                synthesis_count: self.synthesis.synthesis_count.load(Ordering::Relaxed),
                chunk_count: self.synthesis.chunk_count.load(Ordering::Relaxed),
                avg_chunks_per_request: self.synthesis.avg_chunks_per_request(),
                total_samples: self.synthesis.total_samples.load(Ordering::Relaxed),
                total_audio_ms: self.synthesis.total_audio_ms.load(Ordering::Relaxed),
            },
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub speech: EndpointStats,
    pub synthesis: SynthesisStats,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub request_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SynthesisStats {
    pub synthesis_count: u64,
    pub chunk_count: u64,
    pub avg_chunks_per_request: f64,
    pub total_samples: u64,
    pub total_audio_ms: u64,
}
