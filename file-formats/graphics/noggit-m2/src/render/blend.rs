//! Blend modes and the fixed-function state they map to

/// Material blend mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub enum BlendMode {
    #[default]
    Opaque,
    AlphaKey,
    Alpha,
    Additive,
    AdditiveAlpha,
    Modulate,
    Modulate2x,
}

impl BlendMode {
    /// Map a raw blend value; unknown values draw opaque
    pub fn from_raw(value: u16) -> Self {
        match value {
            1 => Self::AlphaKey,
            2 => Self::Alpha,
            3 => Self::Additive,
            4 => Self::AdditiveAlpha,
            5 => Self::Modulate,
            6 => Self::Modulate2x,
            _ => Self::Opaque,
        }
    }

    /// Drawn after all opaque geometry
    pub fn is_translucent(self) -> bool {
        !matches!(self, Self::Opaque | Self::AlphaKey)
    }

    /// Blend equation and alpha-test threshold for a pass with `opacity`
    pub fn state(self, opacity: f32) -> (BlendState, Option<f32>) {
        match self {
            Self::Opaque => (BlendState::Disabled, None),
            Self::AlphaKey => (BlendState::Disabled, Some((224.0 / 255.0) * opacity)),
            Self::Alpha => (
                BlendState::Enabled {
                    src: BlendFactor::SrcAlpha,
                    dst: BlendFactor::OneMinusSrcAlpha,
                },
                None,
            ),
            Self::Additive => (
                BlendState::Enabled {
                    src: BlendFactor::SrcAlpha,
                    dst: BlendFactor::One,
                },
                None,
            ),
            Self::AdditiveAlpha => (
                BlendState::Enabled {
                    src: BlendFactor::DstColor,
                    dst: BlendFactor::Zero,
                },
                Some((1.0 / 255.0) * opacity),
            ),
            Self::Modulate => (
                BlendState::Enabled {
                    src: BlendFactor::DstColor,
                    dst: BlendFactor::SrcColor,
                },
                Some((1.0 / 255.0) * opacity),
            ),
            Self::Modulate2x => (
                BlendState::Enabled {
                    src: BlendFactor::DstColor,
                    dst: BlendFactor::One,
                },
                Some((1.0 / 255.0) * opacity),
            ),
        }
    }
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    SrcColor,
    DstColor,
}

/// Blend state handed to the graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendState {
    Disabled,
    Enabled { src: BlendFactor, dst: BlendFactor },
}
