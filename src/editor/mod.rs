//! 控制面板和预设
//!
//! - `panel`：反射式控制面板
//! - `presets`：预设目录和预设管理器
//! - `context`：egui 集成

pub mod context;
pub mod panel;
pub mod presets;

pub use context::PanelContext;
pub use panel::{ControlAction, ControlPanel, PanelEvent, PanelField, PanelSection, ReflectingPanel};
pub use presets::{Preset, PresetHost, PresetManager, PresetPlan};
