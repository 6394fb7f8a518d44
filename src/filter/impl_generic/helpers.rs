//! Tensor <-> host buffer conversions.
//!
//! Design math and the recursive filter run on host `f64` buffers; tensors are
//! only touched at the API boundary. These helpers use `to_vec()`/`from_slice()`
//! so they work for any Runtime.

use crate::error::{FilterError, FilterResult};
use numr::dtype::DType;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Read a floating point tensor into an `f64` buffer (row-major).
pub fn tensor_to_f64<R: Runtime>(tensor: &Tensor<R>, arg: &'static str) -> FilterResult<Vec<f64>> {
    let contig = tensor.contiguous();
    match contig.dtype() {
        DType::F64 => Ok(contig.to_vec()),
        DType::F32 => {
            let data: Vec<f32> = contig.to_vec();
            Ok(data.into_iter().map(f64::from).collect())
        }
        dtype => Err(FilterError::invalid(
            arg,
            format!("unsupported dtype {:?}, expected F32 or F64", dtype),
        )),
    }
}

/// Write an `f64` buffer into a tensor of the requested dtype.
pub fn f64_to_tensor<R: Runtime>(
    data: &[f64],
    shape: &[usize],
    dtype: DType,
    device: &R::Device,
) -> FilterResult<Tensor<R>> {
    match dtype {
        DType::F64 => Ok(Tensor::<R>::from_slice(data, shape, device)),
        DType::F32 => {
            let narrowed: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            Ok(Tensor::<R>::from_slice(&narrowed, shape, device))
        }
        _ => Err(FilterError::invalid(
            "dtype",
            format!("unsupported dtype {:?}, expected F32 or F64", dtype),
        )),
    }
}

/// Rows of a `[n]` or `[rows, n]` tensor.
///
/// A 1-D tensor is returned as a single row.
pub fn tensor_rows<R: Runtime>(
    tensor: &Tensor<R>,
    arg: &'static str,
) -> FilterResult<Vec<Vec<f64>>> {
    let data = tensor_to_f64(tensor, arg)?;
    match tensor.ndim() {
        1 => Ok(vec![data]),
        2 => {
            let width = tensor.shape()[1];
            if width == 0 {
                return Ok(vec![Vec::new(); tensor.shape()[0]]);
            }
            Ok(data.chunks(width).map(<[f64]>::to_vec).collect())
        }
        n => Err(FilterError::invalid(
            arg,
            format!("expected a 1-D or 2-D tensor, got {}-D", n),
        )),
    }
}
