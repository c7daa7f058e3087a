/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 对抗损失与 L2 损失
 *
 * softplus(x) = max(x, 0) + ln(1 + exp(−|x|))，对任何有限输入都不会溢出
 */

use crate::nn::{Graph, GraphError, Var, VarActivationOps, VarShapeOps};
use crate::tensor::Tensor;

/// 判别器把`y`判为“真”的损失：mean(softplus(−y))
pub fn adversarial_real_loss(y: &Var) -> Var {
    (-y).softplus().mean()
}

/// 判别器把`y`判为“假”的损失：mean(softplus(y))
pub fn adversarial_fake_loss(y: &Var) -> Var {
    y.softplus().mean()
}

/// mean((a − target)²)
pub fn l2_loss(a: &Var, target: f32) -> Result<Var, GraphError> {
    if a.shape().iter().product::<usize>() == 0 {
        return Err(GraphError::InvalidOperation("l2_loss 的输入不能为空".to_string()));
    }
    Ok(a.add_scalar(-target).square().mean())
}

/// DRAGAN 梯度惩罚：λ · mean((‖∇ₓD(x̃)‖₂ − 1)²)
///
/// 扰动点 x̃ = x + 0.5 · noise · std(x)，std 为批次内逐元素的总体标准差，
/// `noise`与`x_real`同形状（通常取自 U[-1, 1]）。范数对第0维以外的所有维求，
/// 返回值带有计算图，反向传播会经过`critic`的二阶导。
pub fn gradient_penalty<F>(
    graph: &Graph,
    x_real: &Tensor,
    noise: &Tensor,
    lambda: f32,
    critic: F,
) -> Result<Var, GraphError>
where
    F: FnOnce(&Var) -> Result<Var, GraphError>,
{
    if noise.shape() != x_real.shape() || x_real.dimension() < 2 {
        return Err(GraphError::ShapeMismatch {
            expected: x_real.shape().to_vec(),
            got: noise.shape().to_vec(),
            message: "梯度惩罚的扰动噪声须与至少2阶的真样本同形状".to_string(),
        });
    }
    let std = x_real.std_axis0_keepdims();
    let x_perturbed = graph.input_with_grad(&(x_real + &(noise * &std) * 0.5));
    let y_perturbed = critic(&x_perturbed)?;
    let grads = graph.grad(&[y_perturbed], &[x_perturbed], true)?;
    let axes = (1..x_real.dimension()).collect::<Vec<_>>();
    let norm = grads[0].square().sum_axes_keepdims(&axes)?.sqrt();
    Ok(l2_loss(&norm, 1.0)?.scale(lambda))
}
