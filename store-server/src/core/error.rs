use thiserror::Error;

/// 服务器启动/运行期错误
///
/// 请求内的错误走 [`crate::utils::AppError`]；这里只覆盖启动失败
/// (端口被占用、工作目录不可写) 和运行循环的意外退出。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

/// 服务器生命周期的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
