//! 核心工具函数

/// 获取当前Unix时间戳（毫秒，浮点）
///
/// 颜色循环以它为相位，保留亚毫秒精度。
pub fn current_timestamp_ms_f64() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
        * 1000.0
}
