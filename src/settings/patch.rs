//! 部分参数表
//!
//! 预设覆盖和启动时的初始覆盖都用 `SettingsPatch` 表示，
//! 序列化格式是以反射名称（camelCase）为键的映射：
//!
//! ```toml
//! rootNum = 1024
//! autoClearView = true
//! color = [1.0, 0.5, 0.0, 0.2]
//! ```

use super::{ParamValue, SettingKey, Settings};
use crate::core::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 部分参数表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, ParamValue>",
    into = "BTreeMap<String, ParamValue>"
)]
pub struct SettingsPatch {
    entries: BTreeMap<SettingKey, ParamValue>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加一个覆盖项
    pub fn with(mut self, key: SettingKey, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: SettingKey, value: impl Into<ParamValue>) {
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: SettingKey) -> Option<ParamValue> {
        self.entries.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, ParamValue)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// 把覆盖项写入 `settings`
    ///
    /// 全部项先在副本上校验，任何一项失败时 `settings` 保持不变。
    pub fn apply_to(&self, settings: &mut Settings) -> SettingsResult<()> {
        let next = self.merged_onto(settings)?;
        *settings = next;
        Ok(())
    }

    /// 以 `baseline` 的副本为基础合并，返回新的完整参数表
    pub fn merged_onto(&self, baseline: &Settings) -> SettingsResult<Settings> {
        let mut next = *baseline;
        for (key, value) in self.iter() {
            next.set(key, value)?;
        }
        Ok(next)
    }
}

impl FromIterator<(SettingKey, ParamValue)> for SettingsPatch {
    fn from_iter<I: IntoIterator<Item = (SettingKey, ParamValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, ParamValue>> for SettingsPatch {
    type Error = SettingsError;

    fn try_from(raw: BTreeMap<String, ParamValue>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(name, value)| Ok((name.parse::<SettingKey>()?, value)))
            .collect()
    }
}

impl From<SettingsPatch> for BTreeMap<String, ParamValue> {
    fn from(patch: SettingsPatch) -> Self {
        patch
            .entries
            .into_iter()
            .map(|(key, value)| (key.name().to_string(), value))
            .collect()
    }
}
