use crate::tensor::Tensor;

impl Tensor {
    /// 对每个元素施加`f`，返回新张量
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor::from_array(self.data.mapv(f))
    }

    pub fn exp(&self) -> Tensor {
        self.map(f32::exp)
    }

    pub fn ln(&self) -> Tensor {
        self.map(f32::ln)
    }

    pub fn sqrt(&self) -> Tensor {
        self.map(f32::sqrt)
    }

    pub fn tanh(&self) -> Tensor {
        self.map(f32::tanh)
    }

    pub fn sigmoid(&self) -> Tensor {
        self.map(|x| {
            if x >= 0.0 {
                1.0 / (1.0 + (-x).exp())
            } else {
                let e = x.exp();
                e / (1.0 + e)
            }
        })
    }

    /// softplus(x) = ln(1 + e^x)，写成 max(x, 0) + ln(1 + e^{-|x|}) 以免大数溢出
    pub fn softplus(&self) -> Tensor {
        self.map(|x| x.max(0.0) + (-x.abs()).exp().ln_1p())
    }

    pub fn clip(&self, min: f32, max: f32) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }

    /// 逐元素取值：`x > 0`为1，否则为`negative`
    pub fn positive_mask(&self, negative: f32) -> Tensor {
        self.map(|x| if x > 0.0 { 1.0 } else { negative })
    }
}
