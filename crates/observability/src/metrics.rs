//! 渲染循环指标收集模块
//!
//! 每帧记录帧耗时、服务器时钟与等待超时，并在内存中聚合会话摘要。

use metrics::{counter, gauge, histogram};

/// 记录一帧的合成+呈现耗时
pub fn record_frame_time_ms(ms: f64) {
    histogram!("carla_hud_frame_time_ms").record(ms);
}

/// 记录已呈现的帧及客户端帧率
pub fn record_frame_presented(client_fps: f64) {
    gauge!("carla_hud_client_fps").set(client_fps);
}

/// 记录服务器时钟（来自 world tick 回调）
pub fn record_server_clock(server_fps: f64, frame: u64) {
    gauge!("carla_hud_server_fps").set(server_fps);
    gauge!("carla_hud_server_frame").set(frame as f64);
}

/// 记录一次 wait_for_tick 超时
pub fn record_tick_timeout() {
    counter!("carla_hud_tick_timeouts_total").increment(1);
}

/// 记录渲染循环状态切换
pub fn record_loop_state(state: &'static str) {
    counter!("carla_hud_loop_transitions_total", "state" => state).increment(1);
}

/// 渲染循环指标聚合器
///
/// 在内存中聚合指标，退出时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LoopMetricsAggregator {
    /// 总帧数
    pub total_frames: u64,

    /// tick 超时次数
    pub tick_timeouts: u64,

    /// 帧耗时统计 (毫秒)
    pub frame_time_stats: RunningStats,

    /// 服务器帧率统计
    pub server_fps_stats: RunningStats,
}

impl LoopMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧并同步导出到 metrics
    pub fn record_frame(&mut self, frame_time_ms: f64, server_fps: f64) {
        self.total_frames += 1;
        self.frame_time_stats.push(frame_time_ms);
        if server_fps.is_finite() && server_fps > 0.0 {
            self.server_fps_stats.push(server_fps);
        }
        record_frame_time_ms(frame_time_ms);
    }

    pub fn record_tick_timeout(&mut self) {
        self.tick_timeouts += 1;
        record_tick_timeout();
    }

    /// 生成摘要报告
    pub fn summary(&self) -> LoopSummary {
        LoopSummary {
            total_frames: self.total_frames,
            tick_timeouts: self.tick_timeouts,
            frame_time_ms: StatsSummary::from(&self.frame_time_stats),
            server_fps: StatsSummary::from(&self.server_fps_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 会话摘要
#[derive(Debug, Clone, Default)]
pub struct LoopSummary {
    pub total_frames: u64,
    pub tick_timeouts: u64,
    pub frame_time_ms: StatsSummary,
    pub server_fps: StatsSummary,
}

impl std::fmt::Display for LoopSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Frames rendered: {}", self.total_frames)?;
        writeln!(f, "Tick timeouts: {}", self.tick_timeouts)?;
        writeln!(f, "Frame time (ms): {}", self.frame_time_ms)?;
        writeln!(f, "Server FPS: {}", self.server_fps)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_skips_unknown_server_fps() {
        let mut aggregator = LoopMetricsAggregator::new();
        aggregator.record_frame(16.0, 0.0);
        aggregator.record_frame(18.0, 20.0);
        aggregator.record_tick_timeout();

        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.tick_timeouts, 1);
        assert_eq!(summary.server_fps.count, 1);
        assert!((summary.frame_time_ms.mean - 17.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = LoopMetricsAggregator::new();
        let empty = format!("{}", aggregator.summary());
        assert!(empty.contains("Frames rendered: 0"));
        assert!(empty.contains("Server FPS: N/A"));

        aggregator.record_frame(10.0, 30.0);
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("min=10.000"));
    }
}
