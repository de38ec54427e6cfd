use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::codec::{read_tensors_with, write_tensors};
use crate::error::Result;
use crate::tensor::NamedTensor;
use crate::topology::Topology;

/// Save tensors to a weight file
///
/// The data is written to `<path>.tmp`, flushed and synced, then renamed over
/// `path`. If any step fails the temporary file is removed, so `path` either
/// holds a complete file or is left as it was.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use reversi_weights::{save_weights, NamedTensor};
///
/// let tensors = vec![
///     NamedTensor::matrix("W1", array![[0.5, -0.5]]),
///     NamedTensor::vector("b1", array![0.0]),
/// ];
/// save_weights("weights.txt", &tensors).unwrap();
/// ```
pub fn save_weights<P: AsRef<Path>>(path: P, tensors: &[NamedTensor]) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_path(path);

    let result = write_file(&tmp, tensors).and_then(|()| fs::rename(&tmp, path).map_err(Into::into));
    if let Err(e) = result {
        warn!("Failed to save weights to {}: {e}", path.display());
        if tmp.exists() {
            fs::remove_file(&tmp).ok();
        }
        return Err(e);
    }

    info!("Saved {} tensors to {}", tensors.len(), path.display());
    Ok(())
}

fn write_file(path: &Path, tensors: &[NamedTensor]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_tensors(&mut writer, tensors)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("weights"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load a weight file that must match `topology` exactly
pub fn load_weights<P: AsRef<Path>>(path: P, topology: &Topology) -> Result<Vec<NamedTensor>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let tensors = read_tensors_with(reader, topology)?;
    info!("Loaded {} tensors from {}", tensors.len(), path.display());
    Ok(tensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeightFileError;
    use crate::topology::TensorSpec;
    use ndarray::{Array1, Array2};

    fn sample() -> (Vec<NamedTensor>, Topology) {
        let w = Array2::from_shape_fn((4, 3), |(r, c)| (r as f32 - c as f32) / 7.0);
        let b = Array1::from_shape_fn(4, |i| i as f32 * 0.1 - 0.15);
        (
            vec![NamedTensor::matrix("W1", w), NamedTensor::vector("b1", b)],
            Topology::new(vec![TensorSpec::matrix("W1", 4, 3), TensorSpec::vector("b1", 4)]),
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.txt");
        let (tensors, topology) = sample();

        save_weights(&path, &tensors).unwrap();
        let loaded = load_weights(&path, &topology).unwrap();

        assert_eq!(loaded, tensors);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.txt");
        fs::write(&path, "stale").unwrap();
        let (tensors, topology) = sample();

        save_weights(&path, &tensors).unwrap();
        assert_eq!(load_weights(&path, &topology).unwrap(), tensors);
    }

    #[test]
    fn test_failed_save_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("weights.txt");
        let (tensors, _) = sample();

        let err = save_weights(&path, &tensors).unwrap_err();
        assert!(matches!(err, WeightFileError::Io(_)));
        assert!(!path.exists());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_, topology) = sample();
        let err = load_weights(dir.path().join("nope.txt"), &topology).unwrap_err();
        assert!(matches!(err, WeightFileError::Io(_)));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/a/b/weights.txt"));
        assert_eq!(tmp, PathBuf::from("/a/b/weights.txt.tmp"));
    }
}
