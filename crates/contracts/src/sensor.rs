//! SensorPacket - Event Source 输出
//!
//! 传感器回调携带的原始数据包结构。

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// 传感器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Collision,
    LaneInvasion,
    Gnss,
    Camera,
    Lidar,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::LaneInvasion => "lane_invasion",
            Self::Gnss => "gnss",
            Self::Camera => "camera",
            Self::Lidar => "lidar",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传感器数据包
///
/// 由仿真器在自己的投递线程上，每次事件调用一次处理函数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPacket {
    /// 传感器 ID
    pub sensor_id: String,

    /// 传感器类型
    pub sensor_type: SensorType,

    /// 仿真时间戳 (seconds)
    pub timestamp: f64,

    /// 仿真帧序号
    pub frame: u64,

    /// 数据载荷 (零拷贝)
    pub payload: SensorPayload,
}

/// 传感器数据载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// 碰撞事件
    Collision(CollisionEvent),

    /// 压线事件
    LaneInvasion(LaneInvasionEvent),

    /// GNSS 数据
    Gnss(GnssData),

    /// 图像数据 (RGB/Depth/SemanticSeg)
    Image(ImageData),

    /// LiDAR 点云
    PointCloud(PointCloudData),
}

/// 碰撞事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// 被撞 actor 的 type_id (e.g., "vehicle.audi.tt")
    pub other_actor: String,

    /// 法向冲量 (N·s)
    pub normal_impulse: Vector3,
}

/// 压线事件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaneInvasionEvent {
    /// 本次越过的车道线
    pub crossed_markings: Vec<LaneMarkingType>,
}

/// 车道线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneMarkingType {
    Other,
    Broken,
    Solid,
    SolidSolid,
    SolidBroken,
    BrokenSolid,
    BrokenBroken,
    BottsDots,
    Grass,
    Curb,
    #[serde(rename = "NONE")]
    None,
}

impl fmt::Display for LaneMarkingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Other => "Other",
            Self::Broken => "Broken",
            Self::Solid => "Solid",
            Self::SolidSolid => "SolidSolid",
            Self::SolidBroken => "SolidBroken",
            Self::BrokenSolid => "BrokenSolid",
            Self::BrokenBroken => "BrokenBroken",
            Self::BottsDots => "BottsDots",
            Self::Grass => "Grass",
            Self::Curb => "Curb",
            Self::None => "NONE",
        };
        f.write_str(s)
    }
}

/// GNSS 数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssData {
    /// 纬度 (度)
    pub latitude: f64,

    /// 经度 (度)
    pub longitude: f64,

    /// 高度 (米)
    pub altitude: f64,
}

/// 图像数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素格式
    pub format: ImageFormat,

    /// 原始像素数据
    pub data: Bytes,
}

/// 图像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Rgba8,
    Bgra8,
}

impl ImageFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// 图像颜色转换 (深度图/语义分割)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorConverter {
    #[default]
    Raw,
    Depth,
    LogarithmicDepth,
    CityScapesPalette,
}

/// LiDAR 点云数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloudData {
    /// 点数量
    pub num_points: u32,

    /// 每点字节数 (通常 16: x,y,z,intensity)
    pub point_stride: u32,

    /// 点云数据 (f32 x, y, z, intensity)
    pub data: Bytes,
}

/// 每个 LiDAR 点的字节数
pub const LIDAR_POINT_STRIDE: u32 = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_marking_display_matches_server_names() {
        assert_eq!(LaneMarkingType::Broken.to_string(), "Broken");
        assert_eq!(LaneMarkingType::SolidBroken.to_string(), "SolidBroken");
        assert_eq!(LaneMarkingType::None.to_string(), "NONE");
    }

    #[test]
    fn test_sensor_type_serde() {
        let json = serde_json::to_string(&SensorType::LaneInvasion).unwrap();
        assert_eq!(json, "\"lane_invasion\"");
        assert_eq!(SensorType::LaneInvasion.to_string(), "lane_invasion");
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(ImageFormat::Bgra8.bytes_per_pixel(), 4);
        assert_eq!(ImageFormat::Rgb8.bytes_per_pixel(), 3);
    }
}
