use crate::data::{BatchSource, ImageDataset, Sample, SerialIterator};
use crate::tensor::Tensor;
use std::collections::HashSet;

/// 第 i 张图像的所有像素都等于 i
fn indexed_dataset(n: usize) -> ImageDataset {
    let per_image = 3 * 2 * 2;
    let data = (0..n * per_image)
        .map(|i| (i / per_image) as f32)
        .collect::<Vec<_>>();
    ImageDataset::from_tensor(Tensor::new(&data, &[n, 3, 2, 2])).unwrap()
}

fn ids(batch: &[Sample]) -> Vec<usize> {
    batch.iter().map(|s| s.data().to_vec()[0] as usize).collect()
}

#[test]
fn test_epoch_is_a_permutation() {
    let mut iter = SerialIterator::new(indexed_dataset(6), 3, 7).unwrap();
    let mut seen = ids(&iter.next_batch().unwrap());
    assert!(!iter.is_new_epoch());
    seen.extend(ids(&iter.next_batch().unwrap()));
    assert!(iter.is_new_epoch());
    assert_eq!(iter.epoch(), 1);
    assert_eq!(seen.iter().copied().collect::<HashSet<_>>().len(), 6);
}

#[test]
fn test_batch_crossing_epoch_boundary() {
    let mut iter = SerialIterator::new(indexed_dataset(5), 4, 1).unwrap();
    let first = ids(&iter.next_batch().unwrap());
    let second = ids(&iter.next_batch().unwrap());
    assert_eq!(second.len(), 4);
    assert!(iter.is_new_epoch());

    // 第二个批次的第一个样本是上一轮剩下的唯一一个
    let remaining: HashSet<usize> = (0..5).filter(|i| !first.contains(i)).collect();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.contains(&second[0]));
    // 其余三个来自新一轮的排列，互不重复
    assert_eq!(second[1..].iter().collect::<HashSet<_>>().len(), 3);
}

#[test]
fn test_same_seed_same_order() {
    let mut a = SerialIterator::new(indexed_dataset(8), 8, 3).unwrap();
    let mut b = SerialIterator::new(indexed_dataset(8), 8, 3).unwrap();
    for _ in 0..3 {
        assert_eq!(ids(&a.next_batch().unwrap()), ids(&b.next_batch().unwrap()));
    }
}

#[test]
fn test_with_ids() {
    let mut iter = SerialIterator::new(indexed_dataset(3), 3, 0)
        .unwrap()
        .with_ids(true);
    for sample in iter.next_batch().unwrap() {
        let Sample::WithId(data, id) = sample else {
            panic!("样本应带有编号");
        };
        assert_eq!(data.to_vec()[0] as usize, id);
    }
}

#[test]
fn test_zero_batch_size_rejected() {
    assert!(SerialIterator::new(indexed_dataset(3), 0, 0).is_err());
}
