/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : 残差上/下采样块
 *
 * ResBlockUp:   主路 BN → ReLU → 最近邻×2 → Conv3x3 → BN → ReLU → Conv3x3；
 *               捷径 最近邻×2 → Conv3x3；两路相加
 * ResBlockDown: 主路 BN → ReLU → Conv3x3(步长1) → BN → ReLU → Conv4x4(步长2)；
 *               捷径 Conv4x4(步长2)；两路相加
 */

use super::{Activation, BatchNorm, Conv2d, Layer, RunningStats};
use crate::nn::{Graph, GraphError, Init, Var, VarShapeOps};

pub struct ResBlockUp {
    bn0: BatchNorm,
    c0: Conv2d,
    bn1: BatchNorm,
    c1: Conv2d,
    shortcut: Conv2d,
}

impl ResBlockUp {
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            bn0: BatchNorm::new(graph, in_channels, true, &format!("{name}_bn0"))?,
            c0: Conv2d::new(graph, in_channels, out_channels, 3, 1, 1, init.clone(), &format!("{name}_c0"))?,
            bn1: BatchNorm::new(graph, out_channels, true, &format!("{name}_bn1"))?,
            c1: Conv2d::new(graph, out_channels, out_channels, 3, 1, 1, init.clone(), &format!("{name}_c1"))?,
            shortcut: Conv2d::new(graph, in_channels, out_channels, 3, 1, 1, init, &format!("{name}_cs"))?,
        })
    }
}

impl Layer for ResBlockUp {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = Activation::Relu.forward(&self.bn0.forward(x)?)?;
        let h = self.c0.forward(&h.upsample_nearest2d(2)?)?;
        let h = Activation::Relu.forward(&self.bn1.forward(&h)?)?;
        let h = self.c1.forward(&h)?;
        let skip = self.shortcut.forward(&x.upsample_nearest2d(2)?)?;
        h.try_add(&skip)
    }

    fn named_parameters(&self) -> Vec<(String, Var)> {
        [
            self.bn0.named_parameters(),
            self.c0.named_parameters(),
            self.bn1.named_parameters(),
            self.c1.named_parameters(),
            self.shortcut.named_parameters(),
        ]
        .concat()
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        [self.bn0.named_statistics(), self.bn1.named_statistics()].concat()
    }
}

pub struct ResBlockDown {
    bn0: BatchNorm,
    c0: Conv2d,
    bn1: BatchNorm,
    c1: Conv2d,
    shortcut: Conv2d,
}

impl ResBlockDown {
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            bn0: BatchNorm::new(graph, in_channels, true, &format!("{name}_bn0"))?,
            c0: Conv2d::new(graph, in_channels, out_channels, 3, 1, 1, init.clone(), &format!("{name}_c0"))?,
            bn1: BatchNorm::new(graph, out_channels, true, &format!("{name}_bn1"))?,
            c1: Conv2d::new(graph, out_channels, out_channels, 4, 2, 1, init.clone(), &format!("{name}_c1"))?,
            shortcut: Conv2d::new(graph, in_channels, out_channels, 4, 2, 1, init, &format!("{name}_cs"))?,
        })
    }
}

impl Layer for ResBlockDown {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = Activation::Relu.forward(&self.bn0.forward(x)?)?;
        let h = self.c0.forward(&h)?;
        let h = Activation::Relu.forward(&self.bn1.forward(&h)?)?;
        let h = self.c1.forward(&h)?;
        let skip = self.shortcut.forward(x)?;
        h.try_add(&skip)
    }

    fn named_parameters(&self) -> Vec<(String, Var)> {
        [
            self.bn0.named_parameters(),
            self.c0.named_parameters(),
            self.bn1.named_parameters(),
            self.c1.named_parameters(),
            self.shortcut.named_parameters(),
        ]
        .concat()
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        [self.bn0.named_statistics(), self.bn1.named_statistics()].concat()
    }
}
