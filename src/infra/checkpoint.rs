// ============================================================
// Layer 6: Checkpoint Store
// ============================================================
// One checkpoint is one binary file holding everything needed to
// rebuild the model:
//
//   offset  size  content
//   0       4     magic "TXPR"
//   4       4     config length N (u32, little endian)
//   8       N     TextprintModelConfig as JSON
//   8+N     ..    model record (Burn named MessagePack, full precision)
//
// The architecture config comes first so the module tree can be
// rebuilt before the weights are loaded into it.
//
// Loading:
//   file absent        → Ok(None), caller builds a fresh model
//   present, decodes   → Ok(Some(model))
//   present, garbage   → Err(Decode), fatal
//
// Weights that decode but do not fit the header's architecture
// (missing comparator, wrong tensor shapes) are a Decode error too.
//
// Saving writes a sibling temp file, syncs it and renames it over
// the target, so a reader never sees a partial checkpoint.
//
// Optimizer moments, RNG state and the iteration counter are not
// part of a checkpoint.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use burn::{
    module::{ModuleVisitor, ParamId},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use thiserror::Error;

use crate::ml::model::{TextprintModel, TextprintModelConfig};
use crate::ml::supervisor::CheckpointWriter;

const MAGIC: &[u8; 4] = b"TXPR";
const HEADER_LEN: usize = MAGIC.len() + 4;

type BlobRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint could not be decoded: {0}")]
    Decode(String),

    #[error("model could not be encoded: {0}")]
    Encode(String),

    #[error("checkpoint I/O failed on '{path}'")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Single-file model persistence at a fixed path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialize architecture and weights into one blob.
    pub fn encode<B: Backend>(model: &TextprintModel<B>) -> Result<Vec<u8>, CheckpointError> {
        let config = serde_json::to_vec(&model.config())
            .map_err(|e| CheckpointError::Encode(e.to_string()))?;
        let config_len = u32::try_from(config.len())
            .map_err(|_| CheckpointError::Encode("model config too large".into()))?;

        let weights = Recorder::<B>::record(&BlobRecorder::default(), model.clone().into_record(), ())
            .map_err(|e| CheckpointError::Encode(e.to_string()))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + config.len() + weights.len());
        blob.extend_from_slice(MAGIC);
        blob.extend_from_slice(&config_len.to_le_bytes());
        blob.extend_from_slice(&config);
        blob.extend_from_slice(&weights);
        Ok(blob)
    }

    /// Rebuild a model from a blob produced by [`Self::encode`].
    pub fn decode<B: Backend>(blob: &[u8], device: &B::Device) -> Result<TextprintModel<B>, CheckpointError> {
        // ── Header ───────────────────────────────────────────────────────────
        if blob.len() < HEADER_LEN || &blob[..MAGIC.len()] != MAGIC {
            return Err(CheckpointError::Decode("not a textprint checkpoint (bad magic)".into()));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&blob[MAGIC.len()..HEADER_LEN]);
        let config_len = u32::from_le_bytes(len_bytes) as usize;

        let config_end = HEADER_LEN
            .checked_add(config_len)
            .filter(|&end| end <= blob.len())
            .ok_or_else(|| CheckpointError::Decode("truncated model config".into()))?;

        // ── Architecture ─────────────────────────────────────────────────────
        let config: TextprintModelConfig = serde_json::from_slice(&blob[HEADER_LEN..config_end])
            .map_err(|e| CheckpointError::Decode(format!("invalid model config: {e}")))?;
        let model = config.init::<B>(device);
        let expected = param_shapes(&model);

        // ── Weights ──────────────────────────────────────────────────────────
        let record = Recorder::<B>::load(&BlobRecorder::default(), blob[config_end..].to_vec(), device)
            .map_err(|e| CheckpointError::Decode(format!("invalid model weights: {e}")))?;
        let model = model.load_record(record);

        // ── Weights must fit the architecture ────────────────────────────────
        if model.config() != config {
            return Err(CheckpointError::Decode(format!(
                "weights describe {} but the header says {}",
                model.config(),
                config
            )));
        }
        let found = param_shapes(&model);
        if found != expected {
            return Err(CheckpointError::Decode(format!(
                "weight shapes {found:?} do not match architecture shapes {expected:?}"
            )));
        }

        Ok(model)
    }

    /// Read the checkpoint if one exists.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<Option<TextprintModel<B>>, CheckpointError> {
        let blob = match fs::read(&self.path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Self::decode(&blob, device).map(Some)
    }

    /// Load the saved model, or build a fresh one from `config`.
    ///
    /// A saved model keeps its own architecture; `config` only
    /// applies to fresh models.
    pub fn load_or_init<B: Backend>(
        &self,
        config: &TextprintModelConfig,
        device: &B::Device,
    ) -> Result<TextprintModel<B>, CheckpointError> {
        match self.load(device)? {
            Some(model) => {
                let saved = model.config();
                if &saved != config {
                    tracing::warn!(
                        "Checkpoint architecture {} overrides requested {}",
                        saved,
                        config
                    );
                }
                tracing::info!("Loaded existing model from '{}'", self.path.display());
                Ok(model)
            }
            None => {
                tracing::info!("Constructed new model.");
                Ok(config.init(device))
            }
        }
    }

    /// Atomically replace the checkpoint with `model`.
    pub fn save<B: Backend>(&self, model: &TextprintModel<B>) -> Result<(), CheckpointError> {
        let blob = Self::encode(model)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
            file.write_all(&blob).map_err(io_error(&tmp))?;
            file.sync_all().map_err(io_error(&tmp))?;
        }
        fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;

        tracing::debug!("Saved checkpoint ({} bytes) to '{}'", blob.len(), self.path.display());
        Ok(())
    }

    /// Hidden sibling of the target, so the rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".into());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

/// Shapes of every float parameter, in module visiting order.
#[derive(Default)]
struct ParamShapes(Vec<Vec<usize>>);

impl<B: Backend> ModuleVisitor<B> for ParamShapes {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.0.push(tensor.dims().to_vec());
    }
}

fn param_shapes<B: Backend>(model: &TextprintModel<B>) -> Vec<Vec<usize>> {
    let mut shapes = ParamShapes::default();
    model.visit(&mut shapes);
    shapes.0
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CheckpointError {
    let path = path.to_path_buf();
    move |source| CheckpointError::Io { path, source }
}

impl<B: Backend> CheckpointWriter<TextprintModel<B>> for CheckpointStore {
    fn write(&self, model: &TextprintModel<B>) -> anyhow::Result<()> {
        self.save(model)?;
        Ok(())
    }
}
