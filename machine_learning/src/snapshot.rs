//! Saving and restoring a `Sequential`'s parameters as a `safetensors` file.
//!
//! Every dense layer `i` is stored as two F32 tensors, `layers.{i}.weight` with shape
//! `[n_in, n_out]` and `layers.{i}.bias` with shape `[n_out]`. The file's metadata records the
//! layer dims as a JSON list of `[n_in, n_out]` pairs, checked against the receiving model.

use std::{collections::HashMap, fs, path::Path};

use log::info;
use safetensors::{Dtype, SafeTensors, serialize_to_file, tensor::TensorView};

use crate::{
    MlErr, Result,
    arch::{Model, Sequential, layers::Layer},
};

const FORMAT_KEY: &str = "format";
const FORMAT: &str = "p300-learner";
const ARCHITECTURE_KEY: &str = "architecture";

/// Writes `params` into a snapshot at `path`.
///
/// # Arguments
/// * `path` - Where to write the snapshot, overwriting any existing file.
/// * `model` - The model the parameters belong to.
/// * `params` - The model's parameters.
pub fn save(path: &Path, model: &Sequential, params: &[f32]) -> Result<()> {
    let mut tensors = Vec::with_capacity(2 * model.layers().len());

    for (i, (layer, layer_params)) in model.layer_params(params)?.into_iter().enumerate() {
        let Layer::Dense(dense) = layer;
        let (n, m) = dense.dim();
        let (w_raw, b_raw) = layer_params.split_at(n * m);

        tensors.push((
            weight_name(i),
            TensorView::new(Dtype::F32, vec![n, m], bytemuck::cast_slice(w_raw))?,
        ));
        tensors.push((
            bias_name(i),
            TensorView::new(Dtype::F32, vec![m], bytemuck::cast_slice(b_raw))?,
        ));
    }

    let metadata = HashMap::from([
        (FORMAT_KEY.to_string(), FORMAT.to_string()),
        (
            ARCHITECTURE_KEY.to_string(),
            serde_json::to_string(&architecture(model))?,
        ),
    ]);

    serialize_to_file(tensors, &Some(metadata), path)?;
    info!("saved {} parameters to {}", params.len(), path.display());
    Ok(())
}

/// Reads a snapshot written by [`save`] for the given model.
///
/// # Returns
/// The model's parameters, or an error if the file can't be read or any tensor is missing or
/// doesn't match the model's layers.
pub fn load(path: &Path, model: &Sequential) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    let params = decode(&bytes, model)?;
    info!("loaded {} parameters from {}", params.len(), path.display());
    Ok(params)
}

/// Decodes an in-memory snapshot for the given model.
pub fn decode(bytes: &[u8], model: &Sequential) -> Result<Vec<f32>> {
    let (_, metadata) = SafeTensors::read_metadata(bytes)?;
    let metadata = metadata.metadata().as_ref();
    let format = metadata
        .and_then(|m| m.get(FORMAT_KEY))
        .map(String::as_str);

    if format != Some(FORMAT) {
        return Err(MlErr::Snapshot(format!(
            "expected format {FORMAT:?}, found {format:?}"
        )));
    }

    let raw = metadata
        .and_then(|m| m.get(ARCHITECTURE_KEY))
        .ok_or_else(|| MlErr::Snapshot(format!("missing {ARCHITECTURE_KEY:?} metadata")))?;
    let saved: Vec<[usize; 2]> = serde_json::from_str(raw)?;
    let expected = architecture(model);

    if saved != expected {
        return Err(MlErr::Snapshot(format!(
            "snapshot holds layers {saved:?}, the model has {expected:?}"
        )));
    }

    let tensors = SafeTensors::deserialize(bytes)?;
    let mut params = Vec::with_capacity(model.size());

    for (i, layer) in model.layers().iter().enumerate() {
        let Layer::Dense(dense) = layer;
        let (n, m) = dense.dim();

        read_tensor(&tensors, &weight_name(i), &[n, m], &mut params)?;
        read_tensor(&tensors, &bias_name(i), &[m], &mut params)?;
    }

    if tensors.len() != 2 * model.layers().len() {
        return Err(MlErr::Snapshot(format!(
            "snapshot holds {} tensors, the model has {} layers",
            tensors.len(),
            model.layers().len()
        )));
    }

    Ok(params)
}

fn read_tensor(
    tensors: &SafeTensors<'_>,
    name: &str,
    shape: &[usize],
    out: &mut Vec<f32>,
) -> Result<()> {
    let tensor = tensors
        .tensor(name)
        .map_err(|e| MlErr::Snapshot(format!("{name}: {e}")))?;

    if tensor.dtype() != Dtype::F32 {
        return Err(MlErr::Snapshot(format!(
            "{name}: expected F32, found {:?}",
            tensor.dtype()
        )));
    }

    if tensor.shape() != shape {
        return Err(MlErr::Snapshot(format!(
            "{name}: expected shape {shape:?}, found {:?}",
            tensor.shape()
        )));
    }

    out.extend(
        tensor
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
    );

    Ok(())
}

/// The `[n_in, n_out]` dims of every layer, in order.
fn architecture(model: &Sequential) -> Vec<[usize; 2]> {
    model
        .layers()
        .iter()
        .map(|layer| {
            let (n, m) = layer.dim();
            [n, m]
        })
        .collect()
}

fn weight_name(layer: usize) -> String {
    format!("layers.{layer}.weight")
}

fn bias_name(layer: usize) -> String {
    format!("layers.{layer}.bias")
}
