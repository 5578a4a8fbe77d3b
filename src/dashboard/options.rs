//! Visual options chosen in the dashboard's options menu

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IconSize {
    Small,
    #[default]
    Intermediate,
    Large,
}

impl IconSize {
    pub fn pixels(&self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Intermediate => 25,
            IconSize::Large => 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSchema {
    #[default]
    PinkBlue,
    BlackOrange,
}

impl ColorSchema {
    /// Primary and secondary line colours
    pub fn palette(&self) -> [&'static str; 2] {
        match self {
            ColorSchema::PinkBlue => ["#FF69B4", "#1E90FF"],
            ColorSchema::BlackOrange => ["#000000", "#FFA500"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapType {
    #[default]
    Terrain,
    Satellite,
}

/// Renderer options. Only `blinking` reaches into the engine: it switches the
/// motion simulator on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualOptions {
    pub blinking: bool,
    pub draw_lines_selected: bool,
    pub icon_size: IconSize,
    pub color_schema: ColorSchema,
    pub map_type: MapType,
}
