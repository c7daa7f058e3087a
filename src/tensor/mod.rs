/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 张量（Tensor）：基于 ndarray 的 f32 多维数组，始终保持标准（行优先、连续）内存布局。
 *                 随机初始化一律显式传入 rng，库内不使用任何全局随机状态。
 */

use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use serde::{Deserialize, Serialize};

mod conv;
mod ops;
mod property;
mod reduce;
mod shape;

pub use conv::ConvGeometry;
pub use property::broadcast_shape;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量。`data`的长度必须和`shape`中所有元素的乘积相等，
    /// 形状为`[]`时表示0阶标量，此时`data`长度须为1。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let expected = shape.iter().product::<usize>();
        assert!(
            data.len() == expected,
            "数据长度{}与形状{:?}不符（需要{}个元素）",
            data.len(),
            shape,
            expected
        );
        let data = ArrayD::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap();
        Tensor { data }
    }

    /// 0阶标量
    pub fn scalar(value: f32) -> Tensor {
        Tensor::new(&[value], &[])
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor {
            data: ArrayD::ones(IxDyn(shape)),
        }
    }

    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// 从 ndarray 数组构造；非标准布局的数组会被整理成标准布局
    pub fn from_array(data: ArrayD<f32>) -> Tensor {
        Tensor {
            data: into_standard_layout(data),
        }
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller 变换）
    pub fn normal_with_rng<R: Rng + ?Sized>(
        mean: f32,
        std_dev: f32,
        shape: &[usize],
        rng: &mut R,
    ) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            // 取(0, 1]，避免ln(0)
            let u1: f32 = 1.0 - rng.r#gen::<f32>();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }

    /// 创建一个在[min, max]闭区间均匀分布的随机张量
    pub fn uniform_with_rng<R: Rng + ?Sized>(
        min: f32,
        max: f32,
        shape: &[usize],
        rng: &mut R,
    ) -> Tensor {
        let data = (0..shape.iter().product::<usize>())
            .map(|_| rng.gen_range(min..=max))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }
}

pub(crate) fn into_standard_layout(data: ArrayD<f32>) -> ArrayD<f32> {
    if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    }
}
