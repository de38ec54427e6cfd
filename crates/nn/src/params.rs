use anyhow::{anyhow, bail, ensure, Result};
use ndarray::{Array1, Array2};
use reversi_weights::{NamedTensor, Topology};
use tch::{nn, Device, Kind, Tensor};

/// Copy a tensor of any shape into a flat `Vec<f32>` (row-major)
pub(crate) fn tensor_to_vec(tensor: &Tensor) -> Vec<f32> {
    let tensor = tensor
        .to_device(Device::Cpu)
        .to_kind(Kind::Float)
        .contiguous();
    let len = tensor.numel();
    let mut vec = vec![0.0f32; len];
    tensor.copy_data(&mut vec, len);
    vec
}

/// Copy variables out in `topology` order
///
/// `var_for` maps a block name to the variable holding it.
pub(crate) fn export_vars(
    vs: &nn::VarStore,
    topology: &Topology,
    var_for: impl Fn(&str) -> &str,
) -> Result<Vec<NamedTensor>> {
    let vars = vs.variables();
    topology
        .specs()
        .iter()
        .map(|spec| -> Result<NamedTensor> {
            let var_name = var_for(&spec.name);
            let var = vars
                .get(var_name)
                .ok_or_else(|| anyhow!("Missing parameter {var_name} for block {}", spec.name))?;
            let values = tensor_to_vec(var);
            let tensor = match spec.shape.as_slice() {
                &[rows, cols] => {
                    NamedTensor::matrix(&spec.name, Array2::from_shape_vec((rows, cols), values)?)
                }
                &[_] => NamedTensor::vector(&spec.name, Array1::from_vec(values)),
                other => bail!("Unsupported shape {other:?} for {}", spec.name),
            };
            Ok(tensor)
        })
        .collect()
}

/// Overwrite variables from exported tensors
///
/// Everything is checked before the first copy, so a rejected set leaves
/// the store unchanged.
pub(crate) fn import_vars(
    vs: &nn::VarStore,
    topology: &Topology,
    tensors: &[NamedTensor],
    var_for: impl Fn(&str) -> &str,
) -> Result<()> {
    topology.check(tensors)?;

    let mut vars = vs.variables();
    for tensor in tensors {
        let var_name = var_for(&tensor.name);
        ensure!(vars.contains_key(var_name), "Missing parameter {var_name}");
    }

    let device = vs.device();
    tch::no_grad(|| {
        for tensor in tensors {
            let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
            let src = Tensor::from_slice(&tensor.data.to_vec())
                .view(shape.as_slice())
                .to_device(device);
            if let Some(var) = vars.get_mut(var_for(&tensor.name)) {
                var.copy_(&src);
            }
        }
    });
    Ok(())
}

/// Row-major `[n, 64]` mask with 1.0 at the cells set in each bitmask
pub(crate) fn legal_mask_rows(masks: impl Iterator<Item = u64>, cells: usize) -> Vec<f32> {
    masks
        .flat_map(|mask| {
            (0..cells).map(move |cell| {
                if mask & (1u64 << (63 - cell)) != 0 {
                    1.0f32
                } else {
                    0.0
                }
            })
        })
        .collect()
}
