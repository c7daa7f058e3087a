/*
 * @Author       : 老董
 * @Date         : 2026-03-13
 * @Description  : 把多个 npz 图像文件合并成一个
 */

use clap::Parser;
use only_gan::data::combine_npz;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "combine_npz")]
#[command(about = "沿第0维拼接多个 npz 中的4阶图像数组")]
struct Cli {
    /// 输出文件
    #[arg(short, long)]
    output: PathBuf,

    /// 输入文件
    #[arg(short, long, num_args = 1.., required = true)]
    sources: Vec<PathBuf>,

    /// 只处理前若干个输入，负数表示全部
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    lim: i64,

    /// 覆盖已存在的输出文件
    #[arg(short, long)]
    force: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    let cli = Cli::parse();

    match combine_npz(&cli.output, &cli.sources, cli.lim, cli.force) {
        Ok(summary) => {
            info!(
                "已写入{}：{} {:?} ({})",
                cli.output.display(),
                summary.key,
                summary.shape,
                summary.dtype
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
