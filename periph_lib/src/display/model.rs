//! Panel models
//!
//! Each supported panel is described by a [`PanelModel`] value. The start up command sequence is
//! the same shape for every panel, only a few of the parameter bytes differ.

use serde::Deserialize;

use super::cmds;

/// How the panel's driving voltage is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VccSource {
    /// Supplied externally.
    External,

    /// Generated by the controller's internal charge pump.
    SwitchCap,
}

/// Start up contrast of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelContrast {
    Fixed(u8),
    ByVcc { external: u8, switch_cap: u8 },
}

/// Geometry and start up settings of one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelModel {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,

    /// SETDISPLAYCLOCKDIV argument.
    pub clock_div: u8,

    /// SETCOMPINS argument.
    pub com_pins: u8,

    pub contrast: PanelContrast,
}

/// Selects one of the known panel models from a parameter file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PanelKind {
    #[serde(rename = "128x64")]
    Panel128x64,
    #[serde(rename = "128x32")]
    Panel128x32,
    #[serde(rename = "96x16")]
    Panel96x16,
}

impl PanelModel {
    pub const SSD1306_128_64: PanelModel = PanelModel {
        name: "SSD1306 128x64",
        width: 128,
        height: 64,
        clock_div: 0x80,
        com_pins: 0x12,
        contrast: PanelContrast::ByVcc { external: 0x9F, switch_cap: 0xCF },
    };

    pub const SSD1306_128_32: PanelModel = PanelModel {
        name: "SSD1306 128x32",
        width: 128,
        height: 32,
        clock_div: 0x80,
        com_pins: 0x02,
        contrast: PanelContrast::Fixed(0x8F),
    };

    pub const SSD1306_96_16: PanelModel = PanelModel {
        name: "SSD1306 96x16",
        width: 96,
        height: 16,
        clock_div: 0x60,
        com_pins: 0x02,
        contrast: PanelContrast::Fixed(0x8F),
    };

    /// Number of 8 pixel tall pages.
    pub fn pages(&self) -> u32 {
        self.height / 8
    }

    /// Commands sent once at start up, before the display is switched on.
    pub fn init_sequence(&self, vcc: VccSource) -> Vec<u8> {
        let external = vcc == VccSource::External;

        let contrast = match self.contrast {
            PanelContrast::Fixed(c) => c,
            PanelContrast::ByVcc { external: e, switch_cap: s } => if external { e } else { s },
        };

        vec![
            cmds::DISPLAYOFF,
            cmds::SETDISPLAYCLOCKDIV, self.clock_div,
            cmds::SETMULTIPLEX, (self.height - 1) as u8,
            cmds::SETDISPLAYOFFSET, 0x00,
            cmds::SETSTARTLINE | 0x00,
            cmds::CHARGEPUMP, if external { 0x10 } else { 0x14 },
            // Horizontal addressing
            cmds::MEMORYMODE, 0x00,
            cmds::SEGREMAP | 0x01,
            cmds::COMSCANDEC,
            cmds::SETCOMPINS, self.com_pins,
            cmds::SETCONTRAST, contrast,
            cmds::SETPRECHARGE, if external { 0x22 } else { 0xF1 },
            cmds::SETVCOMDETECT, 0x40,
            cmds::DISPLAYALLON_RESUME,
            cmds::NORMALDISPLAY,
        ]
    }
}

impl From<PanelKind> for PanelModel {
    fn from(kind: PanelKind) -> Self {
        match kind {
            PanelKind::Panel128x64 => PanelModel::SSD1306_128_64,
            PanelKind::Panel128x32 => PanelModel::SSD1306_128_32,
            PanelKind::Panel96x16 => PanelModel::SSD1306_96_16,
        }
    }
}
