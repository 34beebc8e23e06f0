//! Analysis gateway.
//!
//! One image in, one [`AnalysisResult`] out. Each call is independent and
//! makes at most one model request; failures are not retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn, Instrument};

use crate::config::Settings;
use crate::error::{FaceLensError, FaceLensResult};
use crate::extract::parse_reply;
use crate::image::{ImageFetcher, ImageRef};
use crate::model::AnalysisResult;
use crate::vision::{MistralClient, VisionModel, ANALYSIS_PROMPT};

#[derive(Clone)]
pub struct Gateway {
    fetcher: ImageFetcher,
    model: Arc<dyn VisionModel>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(fetcher: ImageFetcher, model: Arc<dyn VisionModel>, timeout: Duration) -> Self {
        Self {
            fetcher,
            model,
            timeout,
        }
    }

    /// Build a gateway talking to Mistral, as described by `settings`.
    pub fn from_settings(settings: &Settings) -> FaceLensResult<Self> {
        let timeout = settings.request_timeout();
        let fetcher = ImageFetcher::new(
            settings.public_base_url(),
            settings.max_image_bytes,
            timeout,
        )?;
        let model = MistralClient::new(
            settings.api_key.as_deref().unwrap_or_default(),
            &settings.model,
            &settings.api_base,
        );
        Ok(Self::new(fetcher, Arc::new(model), timeout))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn max_image_bytes(&self) -> usize {
        self.fetcher.max_bytes()
    }

    /// Analyze the face in `image_url` (a data URI, site-relative path or URL).
    pub async fn analyze(&self, image_url: &str) -> FaceLensResult<AnalysisResult> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("analyze", request_id = %request_id);
        self.run(image_url).instrument(span).await
    }

    async fn run(&self, image_url: &str) -> FaceLensResult<AnalysisResult> {
        let started = Instant::now();
        let image_ref = ImageRef::parse(image_url)?;
        let image = self.fetcher.normalize(&image_ref).await?;

        let call = self.model.complete(&image, ANALYSIS_PROMPT);
        let reply = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| FaceLensError::Timeout(self.timeout))??;

        match parse_reply(reply) {
            Ok(result) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    model = self.model.name(),
                    "Analysis complete"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    raw = e.raw_response().unwrap_or_default(),
                    "Failed to parse model reply"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::EncodedImage;
    use crate::vision::ModelReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CANNED: &str = r#"{"ancestry":[{"region":"East Asian","percentage":87.5}],"origin":[{"country":"Japanese","percentage":76.2}],"emotions":[{"emotion":"Happy","percentage":91.0}],"description":"..."}"#;
    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    /// Stub model that records calls and returns a fixed reply after an optional delay.
    struct StubModel {
        reply: FaceLensResult<ModelReply>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(ModelReply::Text(text.to_string())),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl VisionModel for StubModel {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, image: &EncodedImage, prompt: &str) -> FaceLensResult<ModelReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(image.media_type, "image/png");
            assert_eq!(prompt, ANALYSIS_PROMPT);
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(FaceLensError::upstream(e.to_string())),
            }
        }
    }

    fn gateway(model: Arc<StubModel>, timeout: Duration) -> Gateway {
        let fetcher = ImageFetcher::new("http://127.0.0.1:9", 1024 * 1024, timeout).unwrap();
        Gateway::new(fetcher, model, timeout)
    }

    #[tokio::test]
    async fn test_empty_reference_skips_model() {
        let model = Arc::new(StubModel::replying(CANNED));
        let gw = gateway(model.clone(), Duration::from_secs(5));

        let err = gw.analyze("").await.unwrap_err();
        assert!(matches!(err, FaceLensError::MissingImage));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_data_uri_skips_model() {
        let model = Arc::new(StubModel::replying(CANNED));
        let gw = gateway(model.clone(), Duration::from_secs(5));

        let err = gw.analyze("data:image/png,abcd").await.unwrap_err();
        assert!(matches!(err, FaceLensError::InvalidImage(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_returns_model_object() {
        let model = Arc::new(StubModel::replying(CANNED));
        let gw = gateway(model.clone(), Duration::from_secs(5));

        let result = gw.analyze(PIXEL).await.unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::from_str::<serde_json::Value>(CANNED).unwrap()
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply() {
        let model = Arc::new(StubModel::replying("no idea"));
        let gw = gateway(model, Duration::from_secs(5));

        let err = gw.analyze(PIXEL).await.unwrap_err();
        assert_eq!(err.raw_response(), Some("no idea"));
    }

    #[tokio::test]
    async fn test_upstream_error_not_retried() {
        let model = Arc::new(StubModel {
            reply: Err(FaceLensError::upstream("HTTP 401")),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        let gw = gateway(model.clone(), Duration::from_secs(5));

        let err = gw.analyze(PIXEL).await.unwrap_err();
        assert!(matches!(err, FaceLensError::Upstream(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let model = Arc::new(StubModel::replying(CANNED).with_delay(Duration::from_secs(60)));
        let gw = gateway(model, Duration::from_millis(100));

        let started = Instant::now();
        let err = gw.analyze(PIXEL).await.unwrap_err();
        assert!(matches!(err, FaceLensError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
