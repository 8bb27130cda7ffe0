//! 配置校验模块
//!
//! 校验规则：
//! - 连接参数：host 非空，port > 0，超时为正
//! - 显示尺寸与帧率上限 > 0
//! - 车辆过滤非空，gamma 为正
//! - min_waypoints > 0
//! - 录制目录非空，队列容量 > 0
//! - 出生点坐标有限，tick_hz > 0

use contracts::{ClientBlueprint, ContractError};

/// 校验 ClientBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    validate_client(blueprint)?;
    validate_display(blueprint)?;
    validate_vehicle(blueprint)?;
    validate_agent(blueprint)?;
    validate_recording(blueprint)?;
    validate_world(blueprint)?;
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("must be a positive number, got {value}"),
        ));
    }
    Ok(())
}

/// 校验连接配置
fn validate_client(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    let client = &blueprint.client;
    if client.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "client.host",
            "host cannot be empty",
        ));
    }
    if client.port == 0 {
        return Err(ContractError::config_validation(
            "client.port",
            "port must be > 0",
        ));
    }
    positive("client.connect_timeout_secs", client.connect_timeout_secs)?;
    positive("client.tick_timeout_secs", client.tick_timeout_secs)?;
    Ok(())
}

/// 校验显示配置
fn validate_display(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    let display = &blueprint.display;
    if display.width == 0 || display.height == 0 {
        return Err(ContractError::config_validation(
            "display.width / display.height",
            format!(
                "dimensions must be > 0, got {}x{}",
                display.width, display.height
            ),
        ));
    }
    if display.fps_cap == 0 {
        return Err(ContractError::config_validation(
            "display.fps_cap",
            "fps_cap must be > 0",
        ));
    }
    Ok(())
}

/// 校验车辆配置
fn validate_vehicle(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    if blueprint.vehicle.filter.trim().is_empty() {
        return Err(ContractError::config_validation(
            "vehicle.filter",
            "actor filter cannot be empty",
        ));
    }
    positive("vehicle.gamma", blueprint.vehicle.gamma)?;
    Ok(())
}

/// 校验 agent 配置
fn validate_agent(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    if blueprint.agent.min_waypoints == 0 {
        return Err(ContractError::config_validation(
            "agent.min_waypoints",
            "min_waypoints must be > 0",
        ));
    }
    Ok(())
}

/// 校验录制配置
fn validate_recording(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    let recording = &blueprint.recording;
    if recording.output_dir.trim().is_empty() {
        return Err(ContractError::config_validation(
            "recording.output_dir",
            "output_dir cannot be empty",
        ));
    }
    if recording.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "recording.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验模拟世界配置
fn validate_world(blueprint: &ClientBlueprint) -> Result<(), ContractError> {
    let world = &blueprint.world;
    positive("world.tick_hz", world.tick_hz)?;
    positive("world.speed_limit_kmh", world.speed_limit_kmh)?;

    if let Some(points) = &world.spawn_points {
        for (idx, point) in points.iter().enumerate() {
            let l = point.location;
            let r = point.rotation;
            let all_finite = [l.x, l.y, l.z, r.pitch, r.yaw, r.roll]
                .iter()
                .all(|v| v.is_finite());
            if !all_finite {
                return Err(ContractError::config_validation(
                    format!("world.spawn_points[{idx}]"),
                    "spawn point coordinates must be finite",
                ));
            }
        }
    }
    Ok(())
}
