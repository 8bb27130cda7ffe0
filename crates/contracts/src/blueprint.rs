//! ClientBlueprint - Config Loader 输出
//!
//! 描述完整的客户端配置：仿真器连接、显示、车辆、驾驶 agent、录制、模拟世界。

use serde::{Deserialize, Serialize};

use crate::{AgentKind, Behavior, Transform};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的客户端配置蓝图
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 仿真器连接
    #[serde(default)]
    pub client: ClientConfig,

    /// 显示窗口
    #[serde(default)]
    pub display: DisplayConfig,

    /// 玩家车辆
    #[serde(default)]
    pub vehicle: VehicleConfig,

    /// 驾驶 agent
    #[serde(default)]
    pub agent: AgentConfig,

    /// 帧录制
    #[serde(default)]
    pub recording: RecordingConfig,

    /// 进程内模拟世界
    #[serde(default)]
    pub world: MockWorldConfig,
}

/// 仿真器连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 服务器地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 服务器端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 连接超时 (秒)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: f64,

    /// 等待仿真步进的超时 (秒)，超时后跳过并重试
    #[serde(default = "default_tick_timeout")]
    pub tick_timeout_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
            tick_timeout_secs: default_tick_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2000
}

fn default_connect_timeout() -> f64 {
    4.0
}

fn default_tick_timeout() -> f64 {
    10.0
}

/// 显示配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// 帧率上限
    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps_cap: default_fps_cap(),
        }
    }
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps_cap() -> u32 {
    60
}

/// 玩家车辆配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// 蓝图过滤 (e.g., "vehicle.*")
    #[serde(default = "default_filter")]
    pub filter: String,

    /// 相机 gamma 校正
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// actor role_name 属性
    #[serde(default = "default_role_name")]
    pub role_name: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            gamma: default_gamma(),
            role_name: default_role_name(),
        }
    }
}

fn default_filter() -> String {
    "vehicle.*".to_string()
}

fn default_gamma() -> f64 {
    2.2
}

fn default_role_name() -> String {
    "hero".to_string()
}

/// 驾驶 agent 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub kind: AgentKind,

    #[serde(default)]
    pub behavior: Behavior,

    /// 到达终点后重新规划路线
    #[serde(default, rename = "loop")]
    pub loop_route: bool,

    /// 随机种子 (可选)
    #[serde(default)]
    pub seed: Option<u64>,

    /// 剩余路点少于该值时视为到达 (循环模式)
    #[serde(default = "default_min_waypoints")]
    pub min_waypoints: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kind: AgentKind::default(),
            behavior: Behavior::default(),
            loop_route: false,
            seed: None,
            min_waypoints: default_min_waypoints(),
        }
    }
}

fn default_min_waypoints() -> usize {
    21
}

/// 录制配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// 启动时即开始录制
    #[serde(default)]
    pub enabled: bool,

    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// 录制队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_output_dir(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_output_dir() -> String {
    "_out".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

/// 进程内模拟世界配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockWorldConfig {
    /// 地图名称
    #[serde(default = "default_map_name")]
    pub map_name: String,

    /// 为 false 时模拟地图数据缺失
    #[serde(default = "default_true")]
    pub map_available: bool,

    /// 出生点；未设置时在地图上均匀生成
    #[serde(default)]
    pub spawn_points: Option<Vec<Transform>>,

    /// 交通车辆数量
    #[serde(default = "default_traffic_vehicles")]
    pub traffic_vehicles: usize,

    /// 仿真步进频率 (Hz)
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// 道路限速 (km/h)
    #[serde(default = "default_speed_limit")]
    pub speed_limit_kmh: f64,

    /// 每 N 帧触发一次碰撞事件，0 表示关闭
    #[serde(default)]
    pub collision_interval_frames: u64,

    /// 每 N 帧触发一次压线事件，0 表示关闭
    #[serde(default)]
    pub lane_invasion_interval_frames: u64,
}

impl Default for MockWorldConfig {
    fn default() -> Self {
        Self {
            map_name: default_map_name(),
            map_available: true,
            spawn_points: None,
            traffic_vehicles: default_traffic_vehicles(),
            tick_hz: default_tick_hz(),
            speed_limit_kmh: default_speed_limit(),
            collision_interval_frames: 0,
            lane_invasion_interval_frames: 0,
        }
    }
}

fn default_map_name() -> String {
    "Town10HD_Opt".to_string()
}

fn default_true() -> bool {
    true
}

fn default_traffic_vehicles() -> usize {
    6
}

fn default_tick_hz() -> f64 {
    20.0
}

fn default_speed_limit() -> f64 {
    30.0
}
