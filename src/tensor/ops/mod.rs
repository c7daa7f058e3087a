/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 张量的四则运算（含与纯数的运算）、复合赋值、矩阵乘法与逐元素函数。
 *                 两个张量间的运算支持 NumPy 风格的广播（broadcasting）。
 */

mod arithmetic;
mod assign;
mod elementwise;
mod mat_mul;
