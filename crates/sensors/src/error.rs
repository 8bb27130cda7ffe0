//! Sensor wrapper 错误类型

use contracts::ContractError;
use thiserror::Error;

/// Sensor wrapper 错误
#[derive(Debug, Error)]
pub enum SensorError {
    /// 传感器生成失败 (来自仿真器)
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// 图像/点云解码失败
    #[error("failed to decode {sensor}: {message}")]
    Decode {
        /// 数据种类 (e.g., "point cloud")
        sensor: &'static str,
        /// 错误消息
        message: String,
    },
}

impl SensorError {
    pub fn decode(sensor: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            sensor,
            message: message.into(),
        }
    }
}

/// Sensors Result 类型别名
pub type Result<T> = std::result::Result<T, SensorError>;
