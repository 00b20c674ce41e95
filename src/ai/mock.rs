use super::{ImageGenerationService, ImageSpec, TextGenerationService};
use crate::image::{CHECKERBOARD_PNG, TRANSPARENT_PIXEL_PNG};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const WARRIOR_RESPONSE: &str = include_str!("../../data/mock/warrior.txt");
pub const TREASURE_CHEST_RESPONSE: &str = include_str!("../../data/mock/treasure_chest.txt");
pub const POTION_RESPONSE: &str = include_str!("../../data/mock/potion.txt");

const MISSING_RESPONSE: &str =
    "Unable to load mock response. Please check the mock response configuration.";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Text backend stand-in that cycles through canned descriptions.
#[derive(Clone)]
pub struct MockTextClient {
    responses: Arc<Vec<String>>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

impl MockTextClient {
    /// Mock seeded with the built-in warrior, treasure chest and potion responses.
    pub fn new() -> Self {
        Self::with_responses(vec![
            WARRIOR_RESPONSE.to_string(),
            TREASURE_CHEST_RESPONSE.to_string(),
            POTION_RESPONSE.to_string(),
        ])
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(responses),
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    /// Load canned responses from a JSON array of strings.
    pub fn from_file(path: &Path) -> Result<Self> {
        let responses: Vec<String> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Ok(Self::with_responses(responses))
    }

    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Prompts received so far, oldest first.
    pub fn get_prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockTextClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerationService for MockTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let index = {
            let mut count = lock(&self.call_count);
            let index = *count;
            *count += 1;
            index
        };
        lock(&self.prompts).push(prompt.to_string());

        tracing::info!(
            "Mock text provider answering prompt: {}...",
            prompt.chars().take(50).collect::<String>()
        );

        if self.should_fail {
            return Err(Error::AiProvider("Mock text failure".to_string()));
        }

        if self.responses.is_empty() {
            return Ok(MISSING_RESPONSE.to_string());
        }

        tracing::debug!("Mock text provider returning response #{}", index);
        Ok(self.responses[index % self.responses.len()].clone())
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "mock-text"
    }
}

/// Image backend stand-in alternating between two tiny PNGs.
#[derive(Clone)]
pub struct MockImageClient {
    call_count: Arc<Mutex<usize>>,
    specs: Arc<Mutex<Vec<ImageSpec>>>,
    should_fail: bool,
    no_image: bool,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            call_count: Arc::new(Mutex::new(0)),
            specs: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
            no_image: false,
        }
    }

    /// Every call fails as if the backend were unreachable.
    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    /// Every call succeeds without producing an image.
    pub fn with_no_image(mut self, no_image: bool) -> Self {
        self.no_image = no_image;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    pub fn get_specs(&self) -> Vec<ImageSpec> {
        lock(&self.specs).clone()
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageClient {
    async fn generate_image(&self, prompt: &str, spec: &ImageSpec) -> Result<Option<String>> {
        let count = {
            let mut count = lock(&self.call_count);
            *count += 1;
            *count
        };
        lock(&self.specs).push(*spec);

        tracing::info!(
            "Mock image provider for prompt '{}', dimensions {}x{}, spritesheet: {}",
            prompt.chars().take(50).collect::<String>(),
            spec.width,
            spec.height,
            spec.spritesheet
        );

        if self.should_fail {
            return Err(Error::AiProvider("Mock image backend unavailable".to_string()));
        }
        if self.no_image {
            return Ok(None);
        }

        let image = if count % 2 == 0 {
            TRANSPARENT_PIXEL_PNG
        } else {
            CHECKERBOARD_PNG
        };
        Ok(Some(image.to_string()))
    }

    async fn is_available(&self) -> bool {
        !self.should_fail
    }

    fn name(&self) -> &'static str {
        "mock-image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_mock_text_rotates_default_responses() {
        let client = MockTextClient::new();

        assert_eq!(client.generate("a").await.unwrap(), WARRIOR_RESPONSE);
        assert_eq!(client.generate("b").await.unwrap(), TREASURE_CHEST_RESPONSE);
        assert_eq!(client.generate("c").await.unwrap(), POTION_RESPONSE);
        // Should cycle back
        assert_eq!(client.generate("d").await.unwrap(), WARRIOR_RESPONSE);

        assert_eq!(client.get_call_count(), 4);
        assert_eq!(client.get_prompts(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_mock_text_custom_responses() {
        let client = MockTextClient::with_responses(vec![
            "Custom sprite 1".to_string(),
            "Custom sprite 2".to_string(),
        ]);

        assert_eq!(client.generate("").await.unwrap(), "Custom sprite 1");
        assert_eq!(client.generate("").await.unwrap(), "Custom sprite 2");
        assert_eq!(client.generate("").await.unwrap(), "Custom sprite 1");
    }

    #[tokio::test]
    async fn test_mock_text_empty_responses() {
        let client = MockTextClient::with_responses(vec![]);
        assert_eq!(client.generate("x").await.unwrap(), MISSING_RESPONSE);
    }

    #[tokio::test]
    async fn test_mock_text_failure() {
        let client = MockTextClient::new().with_failure(true);
        assert!(client.generate("x").await.is_err());
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_text_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["first", "second"]"#).unwrap();

        let client = MockTextClient::from_file(file.path()).unwrap();
        assert_eq!(client.generate("").await.unwrap(), "first");
        assert_eq!(client.generate("").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_mock_text_clones_share_counter() {
        let client = MockTextClient::new();
        let probe = client.clone();

        client.generate("x").await.unwrap();
        assert_eq!(probe.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_image_alternates() {
        let client = MockImageClient::new();
        let spec = ImageSpec::single(32, 32);

        let first = client.generate_image("p", &spec).await.unwrap();
        let second = client.generate_image("p", &spec).await.unwrap();
        let third = client.generate_image("p", &spec).await.unwrap();

        assert_eq!(first.as_deref(), Some(CHECKERBOARD_PNG));
        assert_eq!(second.as_deref(), Some(TRANSPARENT_PIXEL_PNG));
        assert_eq!(third, first);
        assert_eq!(client.get_call_count(), 3);
        assert_eq!(client.get_specs(), vec![spec; 3]);
    }

    #[tokio::test]
    async fn test_mock_image_failure_modes() {
        let spec = ImageSpec::single(8, 8);

        let failing = MockImageClient::new().with_failure(true);
        assert!(failing.generate_image("p", &spec).await.is_err());
        assert!(!failing.is_available().await);

        let empty = MockImageClient::new().with_no_image(true);
        assert!(empty.generate_image("p", &spec).await.unwrap().is_none());
        assert!(empty.is_available().await);
    }
}
