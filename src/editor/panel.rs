//! 控制面板
//!
//! `ReflectingPanel` 是反射式面板的契约：面板按分区列出可编辑的控件和动作按钮，
//! 用户的编辑以事件形式交回编排器。同一个字段的“值变化”和“编辑完成”是两个独立事件，
//! 只有编辑完成才会触发缓冲区重新分配之类的结构性动作。
//!
//! `ControlPanel` 是无界面也可以驱动的实现，可以用 egui 绘制。

use super::presets::Preset;
use crate::settings::{ParamValue, SettingKey};
use crate::spawn::BallParam;
use std::fmt;
use std::ops::RangeInclusive;

/// 控制动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Clear,
    ClearView,
    ClearFlow,
    /// 球形重生
    Respawn,
    RespawnCamPixels,
    RespawnFlowPixels,
    Reset,
    /// 清除并球形重生
    Restart,
}

impl ControlAction {
    pub const ALL: [ControlAction; 8] = [
        ControlAction::Clear,
        ControlAction::ClearView,
        ControlAction::ClearFlow,
        ControlAction::Respawn,
        ControlAction::RespawnCamPixels,
        ControlAction::RespawnFlowPixels,
        ControlAction::Reset,
        ControlAction::Restart,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Clear => "clear",
            ControlAction::ClearView => "clearView",
            ControlAction::ClearFlow => "clearFlow",
            ControlAction::Respawn => "respawn",
            ControlAction::RespawnCamPixels => "respawnCamPixels",
            ControlAction::RespawnFlowPixels => "respawnFlowPixels",
            ControlAction::Reset => "reset",
            ControlAction::Restart => "restart",
        }
    }
}

/// 面板分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelSection {
    Settings,
    Respawn,
    Controls,
    Presets,
}

impl PanelSection {
    pub fn name(&self) -> &'static str {
        match self {
            PanelSection::Settings => "settings",
            PanelSection::Respawn => "respawn",
            PanelSection::Controls => "controls",
            PanelSection::Presets => "presets",
        }
    }
}

/// 面板上的一个条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelField {
    /// 参数存储中的标量字段
    Setting(SettingKey),
    /// 显示颜色的 RGB（0–255）
    Color,
    /// 显示颜色的不透明度
    Opacity,
    Ball(BallParam),
    CyclingColor,
    Action(ControlAction),
    Preset(Preset),
}

impl PanelField {
    pub fn label(&self) -> &'static str {
        match self {
            PanelField::Setting(key) => key.name(),
            PanelField::Color => "color",
            PanelField::Opacity => "opacity",
            PanelField::Ball(param) => param.name(),
            PanelField::CyclingColor => "cyclingColor",
            PanelField::Action(action) => action.name(),
            PanelField::Preset(preset) => preset.name(),
        }
    }

    /// 拖动控件允许的取值范围，与参数存储的校验一致
    pub fn drag_range(&self) -> Option<RangeInclusive<f64>> {
        match self {
            PanelField::Setting(SettingKey::RootNum) => Some(1.0..=u32::MAX as f64),
            PanelField::Setting(SettingKey::RespawnAmount) | PanelField::Opacity => {
                Some(0.0..=1.0)
            }
            _ => None,
        }
    }
}

impl fmt::Display for PanelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 面板事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    /// 值变化（拖动、输入过程中的每次变化）
    Changed(PanelField, ParamValue),
    /// 编辑完成（松开拖动、输入框失去焦点）
    Finished(PanelField, ParamValue),
    /// 按下动作按钮
    Pressed(PanelField),
}

/// 反射式控制面板
pub trait ReflectingPanel {
    fn add_section(&mut self, section: PanelSection);

    /// 添加可编辑控件
    fn add_control(&mut self, section: PanelSection, field: PanelField, value: ParamValue);

    /// 添加动作按钮
    fn add_action(&mut self, section: PanelSection, field: PanelField);

    /// 用当前值刷新显示，不产生事件
    fn update_display(&mut self, values: &[(PanelField, ParamValue)]);

    /// 取走自上次调用以来的所有事件
    fn take_events(&mut self) -> Vec<PanelEvent>;

    fn set_open(&mut self, open: bool);
}

#[derive(Debug, Clone)]
struct PanelEntry {
    field: PanelField,
    /// 动作按钮没有值
    value: Option<ParamValue>,
}

#[derive(Debug, Clone)]
struct Section {
    section: PanelSection,
    entries: Vec<PanelEntry>,
}

/// 控制面板
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    sections: Vec<Section>,
    events: Vec<PanelEvent>,
    open: bool,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    pub fn value(&self, field: PanelField) -> Option<ParamValue> {
        self.entry(field).and_then(|entry| entry.value)
    }

    pub fn fields(&self, section: PanelSection) -> Vec<PanelField> {
        self.sections
            .iter()
            .filter(|s| s.section == section)
            .flat_map(|s| s.entries.iter().map(|entry| entry.field))
            .collect()
    }

    pub fn sections(&self) -> Vec<PanelSection> {
        self.sections.iter().map(|s| s.section).collect()
    }

    /// 用户修改一个值（仅值变化，不算编辑完成）
    pub fn edit(&mut self, field: PanelField, value: ParamValue) {
        if let Some(entry) = self.entry_mut(field) {
            entry.value = Some(value);
            self.events.push(PanelEvent::Changed(field, value));
        }
    }

    /// 用户结束编辑
    pub fn finish_edit(&mut self, field: PanelField) {
        if let Some(value) = self.value(field) {
            self.events.push(PanelEvent::Finished(field, value));
        }
    }

    /// 切换开关；开关的变化立即算作编辑完成
    pub fn toggle(&mut self, field: PanelField) {
        if let Some(current) = self.value(field).and_then(|v| v.as_toggle()) {
            self.edit(field, (!current).into());
            self.finish_edit(field);
        }
    }

    /// 按下动作按钮
    pub fn press(&mut self, field: PanelField) {
        if self.entry(field).is_some() {
            self.events.push(PanelEvent::Pressed(field));
        }
    }

    fn entry(&self, field: PanelField) -> Option<&PanelEntry> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .find(|entry| entry.field == field)
    }

    fn entry_mut(&mut self, field: PanelField) -> Option<&mut PanelEntry> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.entries.iter_mut())
            .find(|entry| entry.field == field)
    }

    fn push_entry(&mut self, section: PanelSection, entry: PanelEntry) {
        if !self.sections.iter().any(|s| s.section == section) {
            self.add_section(section);
        }
        if let Some(s) = self.sections.iter_mut().find(|s| s.section == section) {
            s.entries.retain(|e| e.field != entry.field);
            s.entries.push(entry);
        }
    }

    /// 用 egui 绘制面板
    pub fn show(&mut self, ctx: &egui::Context) {
        let Self {
            sections,
            events,
            open,
        } = self;

        egui::Window::new("tendrils")
            .open(open)
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for section in sections.iter_mut() {
                        egui::CollapsingHeader::new(section.section.name())
                            .default_open(section.section == PanelSection::Settings)
                            .show(ui, |ui| {
                                for entry in &mut section.entries {
                                    draw_entry(ui, entry, events);
                                }
                            });
                    }
                });
            });
    }
}

fn draw_entry(ui: &mut egui::Ui, entry: &mut PanelEntry, events: &mut Vec<PanelEvent>) {
    let field = entry.field;
    let Some(value) = entry.value else {
        if ui.button(field.label()).clicked() {
            events.push(PanelEvent::Pressed(field));
        }
        return;
    };

    let (response, next) = match value {
        ParamValue::Toggle(mut v) => {
            let response = ui.checkbox(&mut v, field.label());
            if response.changed() {
                // 开关的变化立即算作编辑完成
                entry.value = Some(v.into());
                events.push(PanelEvent::Changed(field, v.into()));
                events.push(PanelEvent::Finished(field, v.into()));
            }
            return;
        }
        ParamValue::Count(mut v) => {
            let response = ui
                .horizontal(|ui| {
                    let mut drag = egui::DragValue::new(&mut v).speed(1.0);
                    if let Some(range) = field.drag_range() {
                        drag = drag.clamp_range(range);
                    }
                    let r = ui.add(drag);
                    ui.label(field.label());
                    r
                })
                .inner;
            (response, ParamValue::Count(v))
        }
        ParamValue::Number(mut v) => {
            let speed = (v.abs() as f64 * 0.01).max(1e-7);
            let response = ui
                .horizontal(|ui| {
                    let mut drag = egui::DragValue::new(&mut v).speed(speed).max_decimals(8);
                    if let Some(range) = field.drag_range() {
                        drag = drag.clamp_range(range);
                    }
                    let r = ui.add(drag);
                    ui.label(field.label());
                    r
                })
                .inner;
            (response, ParamValue::Number(v))
        }
        ParamValue::Rgb(rgb) => {
            let mut normalized = [rgb[0] / 255.0, rgb[1] / 255.0, rgb[2] / 255.0];
            let response = ui
                .horizontal(|ui| {
                    let r = ui.color_edit_button_rgb(&mut normalized);
                    ui.label(field.label());
                    r
                })
                .inner;
            let next = [
                normalized[0] * 255.0,
                normalized[1] * 255.0,
                normalized[2] * 255.0,
            ];
            if response.changed() {
                entry.value = Some(next.into());
                events.push(PanelEvent::Changed(field, next.into()));
                events.push(PanelEvent::Finished(field, next.into()));
            }
            return;
        }
        // 组合值不提供通用控件
        ParamValue::Color(_) | ParamValue::Path(_) => return,
    };

    if response.changed() {
        entry.value = Some(next);
        events.push(PanelEvent::Changed(field, next));
    }
    if response.drag_stopped() || response.lost_focus() {
        events.push(PanelEvent::Finished(field, next));
    }
}

impl ReflectingPanel for ControlPanel {
    fn add_section(&mut self, section: PanelSection) {
        if !self.sections.iter().any(|s| s.section == section) {
            self.sections.push(Section {
                section,
                entries: Vec::new(),
            });
        }
    }

    fn add_control(&mut self, section: PanelSection, field: PanelField, value: ParamValue) {
        self.push_entry(
            section,
            PanelEntry {
                field,
                value: Some(value),
            },
        );
    }

    fn add_action(&mut self, section: PanelSection, field: PanelField) {
        self.push_entry(section, PanelEntry { field, value: None });
    }

    fn update_display(&mut self, values: &[(PanelField, ParamValue)]) {
        for (field, value) in values {
            if let Some(entry) = self.entry_mut(*field) {
                if entry.value.is_some() {
                    entry.value = Some(*value);
                }
            }
        }
    }

    fn take_events(&mut self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_open(&mut self, open: bool) {
        self.open = open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ControlPanel {
        let mut panel = ControlPanel::new();
        panel.add_section(PanelSection::Settings);
        panel.add_control(
            PanelSection::Settings,
            PanelField::Setting(SettingKey::RootNum),
            512u32.into(),
        );
        panel.add_control(
            PanelSection::Settings,
            PanelField::Setting(SettingKey::ShowFlow),
            false.into(),
        );
        panel.add_action(PanelSection::Controls, PanelField::Action(ControlAction::Clear));
        panel
    }

    #[test]
    fn test_edit_and_finish_are_distinct() {
        let mut panel = panel();
        let field = PanelField::Setting(SettingKey::RootNum);

        panel.edit(field, 600u32.into());
        panel.edit(field, 700u32.into());
        assert_eq!(
            panel.take_events(),
            vec![
                PanelEvent::Changed(field, ParamValue::Count(600)),
                PanelEvent::Changed(field, ParamValue::Count(700)),
            ]
        );

        panel.finish_edit(field);
        assert_eq!(
            panel.take_events(),
            vec![PanelEvent::Finished(field, ParamValue::Count(700))]
        );
        assert!(panel.take_events().is_empty());
    }

    #[test]
    fn test_toggle_commits_immediately() {
        let mut panel = panel();
        let field = PanelField::Setting(SettingKey::ShowFlow);
        panel.toggle(field);

        assert_eq!(
            panel.take_events(),
            vec![
                PanelEvent::Changed(field, true.into()),
                PanelEvent::Finished(field, true.into()),
            ]
        );
    }

    #[test]
    fn test_update_display_is_silent() {
        let mut panel = panel();
        let field = PanelField::Setting(SettingKey::RootNum);
        panel.update_display(&[(field, 1024u32.into())]);

        assert_eq!(panel.value(field), Some(ParamValue::Count(1024)));
        assert!(panel.take_events().is_empty());
    }

    #[test]
    fn test_drag_ranges_match_settings() {
        let root = PanelField::Setting(SettingKey::RootNum).drag_range().unwrap();
        assert_eq!(*root.start(), 1.0);
        assert_eq!(*root.end(), u32::MAX as f64);

        let amount = PanelField::Setting(SettingKey::RespawnAmount)
            .drag_range()
            .unwrap();
        assert!(amount.contains(&0.007));
        assert!(!amount.contains(&5.0));
        assert!(PanelField::Setting(SettingKey::TimeStep).drag_range().is_none());
    }

    #[test]
    fn test_actions_and_unknown_fields() {
        let mut panel = panel();
        panel.press(PanelField::Action(ControlAction::Clear));
        panel.press(PanelField::Action(ControlAction::Reset));
        panel.edit(PanelField::Opacity, 0.5f32.into());

        assert_eq!(
            panel.take_events(),
            vec![PanelEvent::Pressed(PanelField::Action(ControlAction::Clear))]
        );
        assert_eq!(
            panel.sections(),
            vec![PanelSection::Settings, PanelSection::Controls]
        );
    }

    #[test]
    fn test_starts_closed() {
        let mut panel = ControlPanel::new();
        assert!(!panel.is_open());
        panel.toggle_open();
        assert!(panel.is_open());
        panel.set_open(false);
        assert!(!panel.is_open());
    }
}
