//! Integration tests for the background synthesis worker.
//!
//! A counting factory/engine pair stands in for the real model so the tests
//! can observe lazy initialization, load-failure recovery, and the
//! worker-to-combiner pipeline end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chorus_core::{
    wav, AssetRegistry, AssetStore, AudioClip, ChorusError, Combiner, CombinerConfig, Device,
    EngineFactory, SpeakOptions, TtsEngine, TtsWorker, TtsWorkerConfig,
};

/// Engine that produces one sample per input byte, valued by text length.
struct EchoEngine;

#[async_trait]
impl TtsEngine for EchoEngine {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn generate(&self, text: &str, _opts: &SpeakOptions) -> chorus_core::Result<AudioClip> {
        let value = text.len() as f32;
        Ok(AudioClip::Samples(vec![value; text.len()]))
    }
}

/// Factory that counts loads and can fail the first N attempts.
struct CountingFactory {
    loads: AtomicUsize,
    fail_first: usize,
}

impl CountingFactory {
    fn new(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            fail_first,
        })
    }
}

#[async_trait]
impl EngineFactory for CountingFactory {
    async fn load(&self, _device: Device) -> chorus_core::Result<Box<dyn TtsEngine>> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(ChorusError::Engine("model download failed".into()));
        }
        Ok(Box::new(EchoEngine))
    }
}

#[tokio::test]
async fn engine_loads_once_across_requests() {
    let factory = CountingFactory::new(0);
    let worker = TtsWorker::spawn(Arc::clone(&factory) as _, TtsWorkerConfig::default());

    let a = worker
        .synthesize("hi", SpeakOptions::default())
        .await
        .unwrap();
    let b = worker
        .synthesize("hello", SpeakOptions::default())
        .await
        .unwrap();

    assert_eq!(factory.loads.load(Ordering::SeqCst), 1);
    assert_eq!(a.into_samples().unwrap(), vec![2.0; 2]);
    assert_eq!(b.into_samples().unwrap(), vec![5.0; 5]);
    worker.shutdown().await;
}

#[tokio::test]
async fn empty_text_never_touches_the_engine() {
    let factory = CountingFactory::new(0);
    let worker = TtsWorker::spawn(Arc::clone(&factory) as _, TtsWorkerConfig::default());

    let clip = worker
        .synthesize("   ", SpeakOptions::default())
        .await
        .unwrap();
    assert!(clip.is_empty());
    assert_eq!(factory.loads.load(Ordering::SeqCst), 0);
    worker.shutdown().await;
}

#[tokio::test]
async fn failed_load_is_reported_and_retried() {
    let factory = CountingFactory::new(1);
    let worker = TtsWorker::spawn(Arc::clone(&factory) as _, TtsWorkerConfig::default());

    let first = worker.synthesize("hi", SpeakOptions::default()).await;
    assert!(matches!(first, Err(ChorusError::Engine(_))));

    // The worker survives a load failure; the next request retries.
    let second = worker
        .synthesize("hi", SpeakOptions::default())
        .await
        .unwrap();
    assert_eq!(second.into_samples().unwrap(), vec![2.0; 2]);
    assert_eq!(factory.loads.load(Ordering::SeqCst), 2);
    worker.shutdown().await;
}

#[tokio::test]
async fn synthesize_then_combine_end_to_end() {
    let factory = CountingFactory::new(0);
    let worker = TtsWorker::spawn(factory as _, TtsWorkerConfig::default());

    let lines = ["one", "twenty two", ""];
    let mut clips = Vec::new();
    for line in lines {
        clips.push(
            worker
                .synthesize(line, SpeakOptions::default())
                .await
                .unwrap(),
        );
    }
    worker.shutdown().await;

    let store = Arc::new(AssetStore::new());
    let registry: Arc<dyn AssetRegistry> = Arc::clone(&store) as _;
    let combiner = Combiner::new(registry, CombinerConfig::default());
    let merged = combiner.combine_clips(clips).await.unwrap();

    let bytes = store.resolve(&merged).await.unwrap();
    let (samples, _) = wav::decode(&bytes).unwrap();

    // "one" then "twenty two"; the empty line contributes nothing.
    let mut expected = vec![3.0f32; 3];
    expected.extend(vec![10.0f32; 10]);
    assert_eq!(samples, expected);
}
