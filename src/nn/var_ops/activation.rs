/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 逐元素的激活与数学函数
 */

use crate::nn::nodes::Op;
use crate::nn::var::Var;

pub trait VarActivationOps {
    fn relu(&self) -> Var;
    fn leaky_relu(&self, negative_slope: f32) -> Var;
    fn tanh(&self) -> Var;
    fn sigmoid(&self) -> Var;
    /// ln(1 + e^x)，数值稳定
    fn softplus(&self) -> Var;
    fn exp(&self) -> Var;
    fn ln(&self) -> Var;
    fn sqrt(&self) -> Var;
    fn square(&self) -> Var;
}

impl VarActivationOps for Var {
    fn relu(&self) -> Var {
        self.leaky_relu(0.0)
    }

    fn leaky_relu(&self, negative_slope: f32) -> Var {
        let value = self
            .value_ref()
            .map(|x| if x > 0.0 { x } else { negative_slope * x });
        self.from_op(Op::PiecewiseLinear(self.clone(), negative_slope), value)
    }

    fn tanh(&self) -> Var {
        let value = self.value_ref().tanh();
        self.from_op(Op::Tanh(self.clone()), value)
    }

    fn sigmoid(&self) -> Var {
        let value = self.value_ref().sigmoid();
        self.from_op(Op::Sigmoid(self.clone()), value)
    }

    fn softplus(&self) -> Var {
        let value = self.value_ref().softplus();
        self.from_op(Op::Softplus(self.clone()), value)
    }

    fn exp(&self) -> Var {
        let value = self.value_ref().exp();
        self.from_op(Op::Exp(self.clone()), value)
    }

    fn ln(&self) -> Var {
        let value = self.value_ref().ln();
        self.from_op(Op::Ln(self.clone()), value)
    }

    fn sqrt(&self) -> Var {
        let value = self.value_ref().sqrt();
        self.from_op(Op::Sqrt(self.clone()), value)
    }

    fn square(&self) -> Var {
        let value = {
            let v = self.value_ref();
            &*v * &*v
        };
        self.from_op(Op::Mul(self.clone(), self.clone()), value)
    }
}
