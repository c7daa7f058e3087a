mod iterator;

use ndarray::{ArrayD, IxDyn};
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::Path;

/// 写一个只含一个 u8 数组的 npz
fn write_u8_npz(path: &Path, key: &str, shape: &[usize], fill: impl Fn(usize) -> u8) {
    let len = shape.iter().product();
    let data = (0..len).map(fill).collect::<Vec<_>>();
    let array = ArrayD::from_shape_vec(IxDyn(shape), data).unwrap();
    let mut writer = NpzWriter::new(File::create(path).unwrap());
    writer.add_array(key, &array).unwrap();
    writer.finish().unwrap();
}
