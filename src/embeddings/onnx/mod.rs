//! Local sentence embeddings with ONNX Runtime.
//!
//! Runs the sentence-transformers ONNX export of the configured model
//! (all-MiniLM-L6-v2 by default, 384 dimensions). Token embeddings are
//! mean-pooled under the attention mask and L2 normalized, matching what
//! `SentenceTransformer.encode` produces for this model family.


use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::OnceCell;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::{Embedder, check_embeddings, l2_normalize};
use crate::config::Config;
use crate::{DocentError, Result};

const HUB_BASE_URL: &str = "https://huggingface.co/sentence-transformers";
const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const DOWNLOAD_TIMEOUT_SECONDS: u64 = 300;
const INTRA_THREADS: usize = 4;

/// Lazily initialised ONNX sentence encoder
///
/// Construction only records settings. The model files are resolved (and
/// downloaded into the cache directory if absent) and the inference session
/// is built on the first embedding call; later calls reuse that session.
pub struct OnnxEmbedder {
    model: String,
    cache_dir: PathBuf,
    dimension: usize,
    max_length: usize,
    batch_size: usize,
    runtime: OnceCell<Mutex<OnnxRuntime>>,
}

struct OnnxRuntime {
    session: Session,
    tokenizer: Tokenizer,
}

impl OnnxEmbedder {
    #[inline]
    pub fn new(config: &Config) -> Self {
        Self {
            model: config.embedding.model.clone(),
            cache_dir: config.model_cache_dir(),
            dimension: config.embedding.dimension,
            max_length: config.embedding.max_length,
            batch_size: config.embedding.batch_size.max(1),
            runtime: OnceCell::new(),
        }
    }

    #[inline]
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Whether the inference session has been created yet
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.runtime.get().is_some()
    }

    #[inline]
    pub fn model_path(&self) -> PathBuf {
        self.cache_dir.join(MODEL_FILE)
    }

    #[inline]
    pub fn tokenizer_path(&self) -> PathBuf {
        self.cache_dir.join(TOKENIZER_FILE)
    }

    fn runtime(&self) -> Result<&Mutex<OnnxRuntime>> {
        self.runtime
            .get_or_try_init(|| self.load_runtime().map(Mutex::new))
    }

    fn load_runtime(&self) -> Result<OnnxRuntime> {
        info!("Initializing ONNX embedder with model: {}", self.model);

        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            DocentError::Config(format!(
                "Failed to create model cache directory {}: {}",
                self.cache_dir.display(),
                e
            ))
        })?;

        let model_path = self.model_path();
        if !model_path.exists() {
            download_file(&hub_url(&self.model, "onnx/model.onnx"), &model_path)?;
        }

        let tokenizer_path = self.tokenizer_path();
        if !tokenizer_path.exists() {
            download_file(&hub_url(&self.model, TOKENIZER_FILE), &tokenizer_path)?;
        }

        let session = Session::builder()
            .map_err(|e| DocentError::Embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DocentError::Embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(INTRA_THREADS)
            .map_err(|e| DocentError::Embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DocentError::Embedding(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DocentError::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        info!("ONNX embedder initialized from {}", self.cache_dir.display());

        Ok(OnnxRuntime { session, tokenizer })
    }
}

impl Embedder for OnnxEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let runtime = self.runtime()?;
        let mut runtime = runtime
            .lock()
            .map_err(|_| DocentError::Embedding("ONNX session lock poisoned".to_string()))?;

        let batch_count = texts.len().div_ceil(self.batch_size);
        let bar = if batch_count > 1 && console::user_attended_stderr() {
            ProgressBar::new(texts.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let batch_embeddings = runtime.embed_batch(batch, self.max_length)?;
            bar.inc(batch.len() as u64);
            embeddings.extend(batch_embeddings);
        }
        bar.finish_and_clear();

        check_embeddings(&embeddings, texts.len(), self.dimension)?;
        debug!(
            "Generated {} embeddings with {} dimensions",
            embeddings.len(),
            self.dimension
        );

        Ok(embeddings)
    }
}

impl OnnxRuntime {
    fn embed_batch(&mut self, texts: &[String], max_length: usize) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| DocentError::Embedding(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(max_length);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(max_len) {
                input_ids[i * max_len + j] = i64::from(ids[j]);
                attention_mask[i * max_len + j] = i64::from(mask[j]);
                token_type_ids[i * max_len + j] = i64::from(types[j]);
            }
        }

        let input_ids_tensor =
            Tensor::from_array((vec![batch_size, max_len], input_ids.into_boxed_slice()))
                .map_err(|e| DocentError::Embedding(format!("Input tensor creation failed: {}", e)))?;
        let attention_mask_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(|e| DocentError::Embedding(format!("Attention mask tensor creation failed: {}", e)))?;
        let token_type_ids_tensor =
            Tensor::from_array((vec![batch_size, max_len], token_type_ids.into_boxed_slice()))
                .map_err(|e| DocentError::Embedding(format!("Token type tensor creation failed: {}", e)))?;

        let session_inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let outputs = self
            .session
            .run(session_inputs)
            .map_err(|e| DocentError::Embedding(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| DocentError::Embedding("No output tensor".to_string()))?;

        let (shape, hidden_states) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| DocentError::Embedding(format!("Failed to extract tensor: {}", e)))?;

        let hidden_size = shape
            .get(2)
            .and_then(|&d| usize::try_from(d).ok())
            .ok_or_else(|| DocentError::Embedding(format!("Unexpected output shape: {:?}", shape)))?;

        Ok(mean_pool(
            hidden_states,
            &attention_mask,
            batch_size,
            max_len,
            hidden_size,
        ))
    }
}

/// Average token states under the attention mask, then L2 normalize each row
///
/// `hidden_states` is row-major `[batch, seq_len, hidden_size]`, `mask` is
/// `[batch, seq_len]`.
#[inline]
pub fn mean_pool(
    hidden_states: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    let mut pooled = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;

        for j in 0..seq_len {
            if mask.get(i * seq_len + j).copied().unwrap_or(0) == 0 {
                continue;
            }
            let offset = (i * seq_len + j) * hidden_size;
            if let Some(token) = hidden_states.get(offset..offset + hidden_size) {
                for (acc, value) in sum.iter_mut().zip(token) {
                    *acc += value;
                }
                count += 1.0;
            }
        }

        if count > 0.0 {
            for value in &mut sum {
                *value /= count;
            }
        }
        l2_normalize(&mut sum);
        pooled.push(sum);
    }

    pooled
}

/// Hugging Face hub URL for a file of a sentence-transformers model
#[inline]
pub fn hub_url(model: &str, file: &str) -> String {
    format!("{}/{}/resolve/main/{}", HUB_BASE_URL, model, file)
}

fn download_file(url: &str, destination: &Path) -> Result<()> {
    info!("Downloading {} to {}", url, destination.display());

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DOWNLOAD_TIMEOUT_SECONDS)))
        .build()
        .into();

    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| DocentError::Embedding(format!("Failed to download {}: {}", url, e)))?;

    let partial = destination.with_extension("part");
    let mut file = fs::File::create(&partial)?;
    let bytes = io::copy(&mut response.body_mut().as_reader(), &mut file)
        .map_err(|e| DocentError::Embedding(format!("Failed to read {}: {}", url, e)))?;
    file.sync_all()?;
    fs::rename(&partial, destination)?;

    info!("Downloaded {} bytes", bytes);
    Ok(())
}
