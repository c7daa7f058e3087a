/*
 * @Author       : 老董
 * @Date         : 2026-03-12
 * @Description  : 本模块提供把生成图像拼成网格并保存的功能。
 *                 在本模块中，不严谨地说：
 *                 1. 图像张量指形状为[N, 3, H, W]、像素取值在[0, 255]的 RGB 图像批次；
 *                 2. 网络输出（tanh 值域[-1, 1]）须先经`Vision::to_pixels`换算。
 */

use crate::tensor::Tensor;
use image::{Rgb, RgbImage};
use std::path::Path;
use thiserror::Error;


#[derive(Debug, Error)]
pub enum VisionError {
    #[error("图像张量形状错误：期望{expected}，实际{got:?}")]
    InvalidShape { expected: String, got: Vec<usize> },

    #[error("{rows}×{cols}的网格需要{}张图像，实际为{count}", .rows * .cols)]
    GridSize {
        rows: usize,
        cols: usize,
        count: usize,
    },

    #[error("图像读写失败：{0}")]
    Image(#[from] image::ImageError),
}

pub struct Vision;

impl Vision {
    /// 把[-1, 1]的网络输出换算到[0, 255]的像素值
    pub fn to_pixels(images: &Tensor) -> Tensor {
        (images * 127.5 + 127.5).clip(0.0, 255.0)
    }

    /// 把`rows * cols`张[3, H, W]图像按行优先拼成一张 RGB 图像
    /// * `images` - 形状[rows * cols, 3, H, W]，像素值在[0, 255]（小数部分截断）
    pub fn tile_grid(images: &Tensor, rows: usize, cols: usize) -> Result<RgbImage, VisionError> {
        let shape = images.shape();
        if shape.len() != 4 || shape[1] != 3 {
            return Err(VisionError::InvalidShape {
                expected: "[N, 3, H, W]".to_string(),
                got: shape.to_vec(),
            });
        }
        let (count, height, width) = (shape[0], shape[2], shape[3]);
        if count != rows * cols || count == 0 {
            return Err(VisionError::GridSize { rows, cols, count });
        }

        let view = images.view();
        let mut grid = RgbImage::new((cols * width) as u32, (rows * height) as u32);
        for n in 0..count {
            let (row, col) = (n / cols, n % cols);
            for y in 0..height {
                for x in 0..width {
                    let pixel = [0, 1, 2].map(|c| view[[n, c, y, x]].clamp(0.0, 255.0) as u8);
                    grid.put_pixel(
                        (col * width + x) as u32,
                        (row * height + y) as u32,
                        Rgb(pixel),
                    );
                }
            }
        }
        Ok(grid)
    }

    /// 保存图像，格式由扩展名决定；父目录不存在时自动创建
    pub fn save_image(image: &RgbImage, path: impl AsRef<Path>) -> Result<(), VisionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
        image.save(path)?;
        Ok(())
    }
}
