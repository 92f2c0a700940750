//! NumPy I/O for product dataset arrays.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array4;
use ndarray_npy::{ReadNpyExt, ReadableElement, WriteNpyExt};

use crate::error::{DataError, Result};

/// Read a `(T, H, W, C)` frame stack from a `.npy` file.
///
/// Accepts `f32` or `f64` arrays, the latter converted to `f32`.
pub fn read_frames_npy<P: AsRef<Path>>(path: P) -> Result<Array4<f32>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    match Array4::<f32>::read_npy(reader) {
        Ok(arr) => Ok(arr),
        Err(e) => {
            let reader = BufReader::new(File::open(path.as_ref())?);
            let arr_f64 = Array4::<f64>::read_npy(reader).map_err(|_| {
                DataError::FormatError(format!(
                    "Failed to read frames from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
            Ok(arr_f64.mapv(|x| x as f32))
        }
    }
}

/// Read a `(T, H, W, K)` annotation mask stack from a `.npy` file.
///
/// Accepts `i64`, `i32`, `i16` or `u8` arrays, widened to `i64`.
pub fn read_annotations_npy<P: AsRef<Path>>(path: P) -> Result<Array4<i64>> {
    let path = path.as_ref();
    if let Some(arr) = try_read_npy4::<i64>(path)? {
        return Ok(arr);
    }
    if let Some(arr) = try_read_npy4::<i32>(path)? {
        return Ok(arr.mapv(i64::from));
    }
    if let Some(arr) = try_read_npy4::<i16>(path)? {
        return Ok(arr.mapv(i64::from));
    }
    if let Some(arr) = try_read_npy4::<u8>(path)? {
        return Ok(arr.mapv(i64::from));
    }
    Err(DataError::FormatError(format!(
        "Failed to read annotations from {}: not a 4-D int64, int32, int16 or uint8 array",
        path.display()
    )))
}

/// `None` when the file holds another element type or rank.
fn try_read_npy4<A: ReadableElement>(path: &Path) -> Result<Option<Array4<A>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(Array4::<A>::read_npy(reader).ok())
}

/// Write a 4-D array to a `.npy` file.
pub fn write_npy4<A, P>(path: P, array: &Array4<A>) -> Result<()>
where
    A: ndarray_npy::WritableElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    array
        .write_npy(file)
        .map_err(|e| DataError::FormatError(format!("Failed to write {}: {}", path.as_ref().display(), e)))
}
