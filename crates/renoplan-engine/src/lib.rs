use std::env;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use renoplan_contracts::events::{EventPayload, EventWriter};
use renoplan_contracts::prompt::{build_prompt_pair, enhance_image_prompt, PromptPair};
use renoplan_contracts::providers::{
    AttemptFailure, FailureKind, ImageDelivery, ImageResult, ProviderSpec,
    MIN_IMAGE_PAYLOAD_BYTES, WARMUP_STATUS,
};
use renoplan_contracts::request::{validate_request, PlanError};
use renoplan_contracts::snippet::{extract_visual_snippet_with, clamp_snippet, ExtractorConfig};
use reqwest::blocking::multipart::Form as MultipartForm;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
const TEXT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TEXT_TEMPERATURE: f64 = 0.7;
const TEXT_MAX_OUTPUT_TOKENS: u64 = 2048;

/// One fixed sleep before the single warm-up retry, inside the 5-15 s band
/// hosted inference endpoints suggest for model loading.
const DEFAULT_WARMUP_BACKOFF: Duration = Duration::from_secs(8);

/// Text-generation collaborator. Exactly one call per submission, no retry:
/// the plan is the primary deliverable and its failures are never masked.
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &PromptPair) -> Result<String>;
}

pub struct GeminiTextClient {
    api_base: String,
    model: String,
    http: HttpClient,
}

impl GeminiTextClient {
    pub fn new(model: Option<String>) -> Self {
        Self {
            api_base: api_base_from_env(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            model: model
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl TextGenerator for GeminiTextClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &PromptPair) -> Result<String> {
        let Some(api_key) = Self::api_key() else {
            bail!("GEMINI_API_KEY not set");
        };
        let endpoint = self.endpoint();
        let payload = json!({
            "systemInstruction": {
                "parts": [{ "text": prompt.system_instruction }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt.user_instruction }],
            }],
            "generationConfig": {
                "temperature": TEXT_TEMPERATURE,
                "maxOutputTokens": TEXT_MAX_OUTPUT_TOKENS,
            },
        });
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key.as_str())])
            .timeout(TEXT_REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let parsed = response_json_or_error("Gemini", response)?;
        gemini_response_text(&parsed)
    }
}

fn gemini_response_text(payload: &Value) -> Result<String> {
    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut parts_text = Vec::new();
    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    parts_text.push(text.to_string());
                }
            }
        }
    }
    if parts_text.is_empty() {
        bail!("Gemini response contained no text parts");
    }
    Ok(parts_text.join("\n"))
}

/// One image provider in the fallback chain. Implementations never panic;
/// every failure mode maps to a tagged [`AttemptFailure`].
pub trait ImageProvider: Send + Sync {
    fn spec(&self) -> &ProviderSpec;
    fn generate(&self, prompt: &str) -> Result<ImageResult, AttemptFailure>;
}

pub struct StabilityProvider {
    spec: ProviderSpec,
    http: HttpClient,
}

impl StabilityProvider {
    pub fn new() -> Self {
        let api_base = api_base_from_env("STABILITY_API_BASE", "https://api.stability.ai");
        Self {
            spec: ProviderSpec {
                name: "stability",
                endpoint: format!("{api_base}/v2beta/stable-image/generate/core"),
                requires_credential: true,
                timeout: Duration::from_secs(60),
                retry_on_unavailable: false,
                prompt_limit: 800,
            },
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("STABILITY_API_KEY")
    }

    fn decode_json_image(payload: &Value) -> Result<Vec<u8>, AttemptFailure> {
        let image_b64 = payload
            .get("image")
            .or_else(|| {
                payload
                    .get("artifacts")
                    .and_then(Value::as_array)
                    .and_then(|rows| rows.first())
                    .and_then(Value::as_object)
                    .and_then(|row| row.get("base64"))
            })
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AttemptFailure::new(
                    FailureKind::Malformed,
                    "Stability JSON response missing image bytes",
                )
            })?;
        BASE64.decode(image_b64.as_bytes()).map_err(|err| {
            AttemptFailure::new(
                FailureKind::Malformed,
                format!("Stability image base64 decode failed: {err}"),
            )
        })
    }
}

impl Default for StabilityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProvider for StabilityProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    fn generate(&self, prompt: &str) -> Result<ImageResult, AttemptFailure> {
        let Some(api_key) = Self::api_key() else {
            return Err(AttemptFailure::new(
                FailureKind::MissingCredential,
                "STABILITY_API_KEY not set",
            ));
        };
        let form = MultipartForm::new()
            .text("prompt", prompt.to_string())
            .text("output_format", "png");
        let response = self
            .http
            .post(&self.spec.endpoint)
            .bearer_auth(api_key)
            .header("Accept", "image/*")
            .timeout(self.spec.timeout)
            .multipart(form)
            .send()
            .map_err(classify_send_error)?;
        let status = response.status();
        if status.as_u16() == WARMUP_STATUS {
            return Err(AttemptFailure::new(
                FailureKind::WarmingUp,
                "Stability signaled service unavailable",
            ));
        }
        if !status.is_success() {
            return Err(bad_status_failure("Stability", response));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_default();
        let bytes = if content_type.starts_with("image/") {
            response
                .bytes()
                .map_err(classify_send_error)?
                .to_vec()
        } else {
            let payload: Value = response.json().map_err(|err| {
                AttemptFailure::new(
                    FailureKind::Malformed,
                    format!("Stability returned invalid JSON: {err}"),
                )
            })?;
            Self::decode_json_image(&payload)?
        };
        let bytes = validate_image_payload(bytes)?;
        Ok(ImageResult::Bytes { bytes })
    }
}

pub struct HfInferenceProvider {
    spec: ProviderSpec,
    http: HttpClient,
}

impl HfInferenceProvider {
    pub fn new() -> Self {
        Self {
            spec: ProviderSpec {
                name: "huggingface",
                endpoint: api_base_from_env(
                    "HF_API_BASE",
                    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0",
                ),
                requires_credential: true,
                timeout: Duration::from_secs(45),
                retry_on_unavailable: true,
                prompt_limit: 500,
            },
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("HF_API_TOKEN").or_else(|| non_empty_env("HUGGINGFACE_API_KEY"))
    }
}

impl Default for HfInferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProvider for HfInferenceProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    fn generate(&self, prompt: &str) -> Result<ImageResult, AttemptFailure> {
        let Some(api_key) = Self::api_key() else {
            return Err(AttemptFailure::new(
                FailureKind::MissingCredential,
                "HF_API_TOKEN not set",
            ));
        };
        let response = self
            .http
            .post(&self.spec.endpoint)
            .bearer_auth(api_key)
            .timeout(self.spec.timeout)
            .json(&json!({ "inputs": prompt }))
            .send()
            .map_err(classify_send_error)?;
        let status = response.status();
        if status.as_u16() == WARMUP_STATUS {
            return Err(AttemptFailure::new(
                FailureKind::WarmingUp,
                "Hugging Face model is loading",
            ));
        }
        if !status.is_success() {
            return Err(bad_status_failure("Hugging Face", response));
        }
        let bytes = response
            .bytes()
            .map_err(classify_send_error)?
            .to_vec();
        let bytes = validate_image_payload(bytes)?;
        Ok(ImageResult::Bytes { bytes })
    }
}

/// Zero-credential guaranteed fallback. The prompt is URL-encoded into the
/// endpoint path; in `UrlOnly` mode the constructed URL is returned without
/// any local request or validation.
pub struct PollinationsProvider {
    spec: ProviderSpec,
    http: HttpClient,
    delivery: ImageDelivery,
}

impl PollinationsProvider {
    pub fn new(delivery: ImageDelivery) -> Self {
        Self {
            spec: ProviderSpec {
                name: "pollinations",
                endpoint: api_base_from_env("POLLINATIONS_API_BASE", "https://image.pollinations.ai"),
                requires_credential: false,
                timeout: Duration::from_secs(30),
                retry_on_unavailable: false,
                prompt_limit: 300,
            },
            http: HttpClient::new(),
            delivery,
        }
    }

    fn image_url(&self, prompt: &str) -> String {
        format!("{}/prompt/{}", self.spec.endpoint, urlencoding::encode(prompt))
    }
}

impl ImageProvider for PollinationsProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    fn generate(&self, prompt: &str) -> Result<ImageResult, AttemptFailure> {
        let url = self.image_url(prompt);
        if self.delivery == ImageDelivery::UrlOnly {
            return Ok(ImageResult::Url { url });
        }
        let response = self
            .http
            .get(&url)
            .timeout(self.spec.timeout)
            .send()
            .map_err(classify_send_error)?;
        let status = response.status();
        if status.as_u16() == WARMUP_STATUS {
            return Err(AttemptFailure::new(
                FailureKind::WarmingUp,
                "Pollinations signaled service unavailable",
            ));
        }
        if !status.is_success() {
            return Err(bad_status_failure("Pollinations", response));
        }
        let bytes = response
            .bytes()
            .map_err(classify_send_error)?
            .to_vec();
        let bytes = validate_image_payload(bytes)?;
        Ok(ImageResult::Bytes { bytes })
    }
}

/// Offline provider: renders a deterministic placeholder PNG from the prompt
/// hash. Used by tests and `--dryrun` runs that must not touch the network.
pub struct DryrunProvider {
    spec: ProviderSpec,
}

impl DryrunProvider {
    pub fn new() -> Self {
        Self {
            spec: ProviderSpec {
                name: "dryrun",
                endpoint: "dryrun-native".to_string(),
                requires_credential: false,
                timeout: Duration::from_secs(1),
                retry_on_unavailable: false,
                prompt_limit: 300,
            },
        }
    }
}

impl Default for DryrunProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProvider for DryrunProvider {
    fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    fn generate(&self, prompt: &str) -> Result<ImageResult, AttemptFailure> {
        let digest = Sha256::digest(prompt.as_bytes());
        let mut canvas = RgbImage::new(512, 512);
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let idx = ((x as usize) * 31 + (y as usize) * 7) % digest.len();
            *pixel = Rgb([digest[idx], digest[(idx + 11) % 32], digest[(idx + 23) % 32]]);
        }
        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| {
                AttemptFailure::new(
                    FailureKind::Malformed,
                    format!("dryrun PNG encode failed: {err}"),
                )
            })?;
        Ok(ImageResult::Bytes { bytes })
    }
}

/// One provider attempt, as recorded in the event trail.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub provider: String,
    pub attempt: u32,
    pub outcome: &'static str,
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct ChainOutcome {
    pub image: ImageResult,
    pub attempts: Vec<AttemptRecord>,
}

/// Ordered fallback chain over image providers.
///
/// Providers are tried strictly in order; the first success wins and later
/// providers are never consulted. Per-provider failures are absorbed into
/// attempt records, and a provider flagged `retry_on_unavailable` gets one
/// backoff sleep plus exactly one retry on the warm-up signal. Exhaustion is
/// the normal `Absent` outcome; `run` cannot fail.
pub struct ImageChain {
    providers: Vec<Box<dyn ImageProvider>>,
    warmup_backoff: Duration,
}

impl ImageChain {
    pub fn new(providers: Vec<Box<dyn ImageProvider>>) -> Self {
        Self {
            providers,
            warmup_backoff: DEFAULT_WARMUP_BACKOFF,
        }
    }

    pub fn with_warmup_backoff(mut self, backoff: Duration) -> Self {
        self.warmup_backoff = backoff;
        self
    }

    pub fn specs(&self) -> Vec<&ProviderSpec> {
        self.providers.iter().map(|p| p.spec()).collect()
    }

    pub fn run(&self, snippet: &str) -> ChainOutcome {
        let mut attempts = Vec::new();
        for provider in &self.providers {
            let spec = provider.spec();
            let prompt = enhance_image_prompt(&clamp_snippet(snippet, spec.prompt_limit));
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                match provider.generate(&prompt) {
                    Ok(image) => {
                        attempts.push(AttemptRecord {
                            provider: spec.name.to_string(),
                            attempt,
                            outcome: "success",
                            detail: None,
                        });
                        return ChainOutcome { image, attempts };
                    }
                    Err(failure) => {
                        let retry = failure.kind == FailureKind::WarmingUp
                            && spec.retry_on_unavailable
                            && attempt == 1;
                        attempts.push(AttemptRecord {
                            provider: spec.name.to_string(),
                            attempt,
                            outcome: failure.kind.label(),
                            detail: Some(truncate_text(&failure.detail, 512)),
                        });
                        if retry {
                            thread::sleep(self.warmup_backoff);
                            continue;
                        }
                        break;
                    }
                }
            }
        }
        ChainOutcome {
            image: ImageResult::Absent {
                reason: "unavailable".to_string(),
            },
            attempts,
        }
    }
}

/// The hosted chain in priority order: higher-fidelity credentialed
/// providers first, the keyless provider last as guaranteed fallback.
pub fn default_provider_chain(delivery: ImageDelivery) -> ImageChain {
    let providers: Vec<Box<dyn ImageProvider>> = vec![
        Box::new(StabilityProvider::new()),
        Box::new(HfInferenceProvider::new()),
        Box::new(PollinationsProvider::new(delivery)),
    ];
    ImageChain::new(providers)
}

#[derive(Debug)]
pub struct RenovationOutcome {
    pub plan_text: String,
    pub plan_path: PathBuf,
    pub image: ImageResult,
    pub image_path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// One submission pipeline: validate, build prompts, generate the plan,
/// extract the visual snippet, run the image chain, write artifacts and the
/// event trail. Stateless across submissions; the chain is read-only.
pub struct RenovationEngine {
    run_dir: PathBuf,
    run_id: String,
    events: EventWriter,
    extractor: ExtractorConfig,
    text: Box<dyn TextGenerator>,
    chain: ImageChain,
}

impl RenovationEngine {
    pub fn new(
        run_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        text_model: Option<String>,
        delivery: ImageDelivery,
    ) -> Result<Self, PlanError> {
        Self::with_components(
            run_dir,
            events_path,
            Box::new(GeminiTextClient::new(text_model)),
            default_provider_chain(delivery),
        )
    }

    pub fn with_components(
        run_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        text: Box<dyn TextGenerator>,
        chain: ImageChain,
    ) -> Result<Self, PlanError> {
        let run_dir = run_dir.into();
        fs::create_dir_all(&run_dir).map_err(|err| {
            PlanError::Artifact(
                anyhow::Error::from(err)
                    .context(format!("failed to create {}", run_dir.display())),
            )
        })?;
        let run_id = run_dir
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("plan-run")
            .to_string();
        let events = EventWriter::new(events_path.into(), run_id.clone());
        let engine = Self {
            run_dir,
            run_id,
            events,
            extractor: ExtractorConfig::default(),
            text,
            chain,
        };
        engine.emit(
            "run_started",
            map_object(json!({
                "out_dir": engine.run_dir.to_string_lossy().to_string(),
            })),
        )?;
        Ok(engine)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn event_writer(&self) -> EventWriter {
        self.events.clone()
    }

    pub fn set_extractor_config(&mut self, config: ExtractorConfig) {
        self.extractor = config;
    }

    pub fn plan(&self, raw_request: &str) -> Result<RenovationOutcome, PlanError> {
        let request = validate_request(raw_request)?;
        self.emit(
            "plan_requested",
            map_object(json!({ "request_chars": request.chars().count() })),
        )?;

        let prompt = build_prompt_pair(request);
        let plan_text = match self.text.generate(&prompt) {
            Ok(text) => text,
            Err(err) => {
                self.emit(
                    "generation_failed",
                    map_object(json!({
                        "model": self.text.name(),
                        "error": error_chain_text(&err, 2048),
                    })),
                )?;
                return Err(PlanError::Generation(err));
            }
        };
        self.emit(
            "plan_generated",
            map_object(json!({
                "model": self.text.name(),
                "plan_chars": plan_text.chars().count(),
            })),
        )?;

        let plan_path = self.run_dir.join("plan.md");
        self.write_artifact(&plan_path, plan_text.as_bytes())?;

        let (snippet, source) = extract_visual_snippet_with(self.extractor, &plan_text, request);
        self.emit(
            "snippet_extracted",
            map_object(json!({
                "source": source.label(),
                "snippet_chars": snippet.chars().count(),
            })),
        )?;

        let outcome = self.chain.run(&snippet);
        for record in &outcome.attempts {
            self.emit(
                "image_attempt",
                map_object(json!({
                    "provider": record.provider,
                    "attempt": record.attempt,
                    "outcome": record.outcome,
                    "detail": record.detail,
                })),
            )?;
        }

        let mut warnings = Vec::new();
        let mut image_path = None;
        match &outcome.image {
            ImageResult::Bytes { bytes } => {
                let path = self.run_dir.join(format!(
                    "renovation-{}-{}.png",
                    timestamp_millis(),
                    short_id(&snippet)
                ));
                self.write_artifact(&path, bytes)?;
                self.emit(
                    "image_generated",
                    map_object(json!({
                        "image_path": path.to_string_lossy().to_string(),
                        "bytes": bytes.len(),
                    })),
                )?;
                image_path = Some(path);
            }
            ImageResult::Url { url } => {
                self.emit(
                    "image_generated",
                    map_object(json!({ "image_url": url })),
                )?;
            }
            ImageResult::Absent { reason } => {
                self.emit(
                    "image_unavailable",
                    map_object(json!({ "reason": reason })),
                )?;
                warnings.push(
                    "image generation is unavailable right now; the plan is complete, retry the image later"
                        .to_string(),
                );
            }
        }

        Ok(RenovationOutcome {
            plan_text,
            plan_path,
            image: outcome.image,
            image_path,
            warnings,
        })
    }

    pub fn finish(&self) -> Result<(), PlanError> {
        self.emit("run_finished", EventPayload::new())
    }

    fn emit(&self, event_type: &str, payload: EventPayload) -> Result<(), PlanError> {
        self.events
            .emit(event_type, payload)
            .map(|_| ())
            .map_err(PlanError::Artifact)
    }

    fn write_artifact(&self, path: &Path, bytes: &[u8]) -> Result<(), PlanError> {
        fs::write(path, bytes).map_err(|err| {
            PlanError::Artifact(
                anyhow::Error::from(err).context(format!("failed to write {}", path.display())),
            )
        })
    }
}

fn validate_image_payload(bytes: Vec<u8>) -> Result<Vec<u8>, AttemptFailure> {
    if bytes.len() < MIN_IMAGE_PAYLOAD_BYTES {
        return Err(AttemptFailure::new(
            FailureKind::UndersizedPayload(bytes.len()),
            format!("payload of {} bytes looks like an error page", bytes.len()),
        ));
    }
    Ok(bytes)
}

fn classify_send_error(err: reqwest::Error) -> AttemptFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    };
    AttemptFailure::new(kind, truncate_text(&err.to_string(), 512))
}

fn bad_status_failure(provider: &str, response: HttpResponse) -> AttemptFailure {
    let code = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    AttemptFailure::new(
        FailureKind::BadStatus(code),
        format!("{provider} request failed ({code}): {}", truncate_text(&body, 512)),
    )
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn api_base_from_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn short_id(snippet: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(snippet.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
