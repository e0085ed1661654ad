//! In-process background removal with a U²-Net style salient-object model.
//!
//! The model predicts a foreground saliency map at a fixed square resolution.
//! The map is min-max normalized, scaled back to the source size and written
//! into the alpha channel of the output PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbaImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::BackgroundError;

/// Side length of the square model input.
pub const MODEL_INPUT_SIZE: u32 = 320;

/// ImageNet per-channel mean (RGB).
const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel std (RGB).
const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Produces a foreground mask for an image.
///
/// Called from the blocking thread pool.
pub trait Segmenter: Send + Sync {
    /// Return a grayscale mask with the same dimensions as `image`;
    /// 255 is foreground.
    fn predict_mask(&self, image: &DynamicImage) -> Result<GrayImage, BackgroundError>;
}

/// Local removal path. Never fails: any error yields the input unchanged.
#[derive(Clone)]
pub struct LocalRemover {
    segmenter: Arc<dyn Segmenter>,
}

impl LocalRemover {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Remove the background, returning PNG bytes, or the original bytes if
    /// segmentation is unavailable or fails.
    pub async fn remove(&self, image: &[u8]) -> Vec<u8> {
        let segmenter = Arc::clone(&self.segmenter);
        let input = image.to_vec();

        let result =
            tokio::task::spawn_blocking(move || cut_out(segmenter.as_ref(), &input)).await;

        match result {
            Ok(Ok(png)) => {
                tracing::info!(
                    "Background removed locally ({} -> {} bytes)",
                    image.len(),
                    png.len()
                );
                png
            }
            Ok(Err(e)) => {
                tracing::warn!("Local background removal failed, using original image: {e}");
                image.to_vec()
            }
            Err(e) => {
                tracing::warn!("Local background removal task failed, using original image: {e}");
                image.to_vec()
            }
        }
    }
}

/// Decode, segment, apply the mask and encode as PNG.
fn cut_out(segmenter: &dyn Segmenter, bytes: &[u8]) -> Result<Vec<u8>, BackgroundError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| BackgroundError::Decode(e.to_string()))?;
    let mask = segmenter.predict_mask(&image)?;
    let cutout = apply_alpha(&image, &mask);
    encode_png(cutout)
}

/// Replace the alpha channel of `image` with `mask`.
pub fn apply_alpha(image: &DynamicImage, mask: &GrayImage) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    let mask = if mask.dimensions() == rgba.dimensions() {
        mask.clone()
    } else {
        image::imageops::resize(mask, rgba.width(), rgba.height(), FilterType::Triangle)
    };
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = alpha.0[0];
    }
    rgba
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>, BackgroundError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| BackgroundError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Resize to the model input, convert to RGB, apply ImageNet normalization,
/// and lay out as NCHW.
pub fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let side = MODEL_INPUT_SIZE as usize;
    let rgb = image
        .resize_exact(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel.0[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - NORM_MEAN[c]) / NORM_STD[c];
        }
    }
    tensor
}

/// Turn a raw `side × side` prediction into a mask of `width × height`.
///
/// Values are min-max normalized first; a flat prediction yields an empty
/// (fully transparent) mask.
pub fn prediction_to_mask(
    prediction: &[f32],
    side: u32,
    width: u32,
    height: u32,
) -> Result<GrayImage, BackgroundError> {
    let expected = (side * side) as usize;
    if prediction.len() < expected {
        return Err(BackgroundError::Model(format!(
            "prediction has {} values, expected {expected}",
            prediction.len()
        )));
    }
    let prediction = &prediction[..expected];

    let (min, max) = prediction
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let pixels: Vec<u8> = prediction
        .iter()
        .map(|&v| {
            if range > f32::EPSILON {
                (((v - min) / range) * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();

    let mask = GrayImage::from_raw(side, side, pixels)
        .ok_or_else(|| BackgroundError::Model("prediction buffer size mismatch".to_string()))?;
    Ok(image::imageops::resize(&mask, width, height, FilterType::Triangle))
}

/// U²-Net ONNX segmentation, loaded on first use.
pub struct U2NetSegmenter {
    model_path: PathBuf,
    /// `Session::run` requires `&mut self`.
    session: Mutex<Option<LoadedModel>>,
}

struct LoadedModel {
    session: Session,
    input_name: String,
}

impl U2NetSegmenter {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            session: Mutex::new(None),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn load(model_path: &Path) -> Result<LoadedModel, BackgroundError> {
        if !model_path.exists() {
            return Err(BackgroundError::ModelMissing(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| {
                BackgroundError::Model(format!("Failed to create ONNX session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| BackgroundError::Model(format!("Failed to load ONNX model: {e}")))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input.1".to_string());

        tracing::info!("Loaded segmentation model from {:?} (input: {input_name})", model_path);
        Ok(LoadedModel {
            session,
            input_name,
        })
    }
}

impl Segmenter for U2NetSegmenter {
    fn predict_mask(&self, image: &DynamicImage) -> Result<GrayImage, BackgroundError> {
        let tensor = preprocess(image);
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat: Vec<f32> = tensor.iter().copied().collect();

        let input = Value::from_array((shape, flat))
            .map_err(|e| BackgroundError::Model(format!("Failed to create input tensor: {e}")))?;

        let mut guard = self
            .session
            .lock()
            .map_err(|e| BackgroundError::Model(format!("Session lock poisoned: {e}")))?;
        if guard.is_none() {
            *guard = Some(Self::load(&self.model_path)?);
        }
        let model = guard
            .as_mut()
            .ok_or_else(|| BackgroundError::Model("segmentation model not loaded".to_string()))?;

        let inputs = ort::inputs![model.input_name.as_str() => input];
        let outputs = model
            .session
            .run(inputs)
            .map_err(|e| BackgroundError::Model(format!("ONNX inference failed: {e}")))?;

        // The first output is the fused, full-resolution saliency map.
        let (_, first) = outputs
            .iter()
            .next()
            .ok_or_else(|| BackgroundError::Model("model produced no outputs".to_string()))?;
        let (_, data) = first
            .try_extract_tensor::<f32>()
            .map_err(|e| BackgroundError::Model(format!("Failed to extract prediction: {e}")))?;

        prediction_to_mask(data, MODEL_INPUT_SIZE, image.width(), image.height())
    }
}
