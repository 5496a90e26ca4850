//! Shader id derivation
//!
//! Every render pass ends up with a 16-bit `shader_id` and a [`PixelShader`]
//! combiner. The derivation runs once, after the passes are built and before
//! they are sorted:
//!
//! 1. [`apply_blend_override`] packs per-texture-unit blend values into the
//!    id (or synthesizes the id from the material blend mode).
//! 2. [`collapse_layers`] merges multi-layer materials into combiner ids in
//!    the `0x8000` range and reduces repeated material passes.
//! 3. [`resolve_pixel_shaders`] maps ids to combiners.
//!
//! Bit layout of a synthesized id:
//!
//! | bits | meaning |
//! |------|---------|
//! | `0x8000` | id indexes [`PIXEL_SHADER_TABLE`] |
//! | `0x4000` | single texture / last unit uses coordinate set 1 |
//! | `0x0070` | blend of the first unit |
//! | `0x0007` | blend of the second unit |

use crate::chunks::M2Material;
use crate::error::{LoadError, Result};
use crate::render::pass::RenderPass;

/// Texture combiner selected for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
#[repr(u16)]
pub enum PixelShader {
    #[default]
    Opaque = 0,
    Mod,
    OpaqueMod,
    OpaqueMod2x,
    OpaqueMod2xNA,
    OpaqueOpaque,
    ModMod,
    ModMod2x,
    ModAdd,
    ModMod2xNA,
    ModAddNA,
    ModOpaque,
    OpaqueMod2xNAAlpha,
    OpaqueAddAlpha,
    OpaqueAddAlphaAlpha,
    OpaqueMod2xNAAlphaAdd,
    ModAddAlpha,
    ModAddAlphaAlpha,
    OpaqueAlphaAlpha,
    OpaqueMod2xNAAlpha3s,
    OpaqueAddAlphaWgt,
    ModAddAlphaWgt,
    OpaqueModAddWgt,
    OpaqueMod2xNAAlphaUnshAlpha,
    ModDualCrossfade,
    ModDepth,
    ModMaskedDualCrossfade,
    OpaqueAlpha,
    OpaqueModNAAlpha,
    ModAddNAAlpha,
}

/// Combiners addressed by ids with bit `0x8000` set
pub const PIXEL_SHADER_TABLE: [PixelShader; 26] = [
    PixelShader::OpaqueMod2xNAAlpha,
    PixelShader::OpaqueAddAlpha,
    PixelShader::OpaqueAddAlphaAlpha,
    PixelShader::OpaqueMod2xNAAlphaAdd,
    PixelShader::ModAddAlpha,
    PixelShader::OpaqueAddAlpha,
    PixelShader::ModAddAlpha,
    PixelShader::ModAddAlphaAlpha,
    PixelShader::OpaqueAlphaAlpha,
    PixelShader::OpaqueMod2xNAAlpha3s,
    PixelShader::OpaqueAddAlphaWgt,
    PixelShader::ModAddNAAlpha,
    PixelShader::OpaqueModNAAlpha,
    PixelShader::ModAddAlphaWgt,
    PixelShader::ModAddAlphaWgt,
    PixelShader::OpaqueAddAlphaWgt,
    PixelShader::OpaqueModAddWgt,
    PixelShader::OpaqueMod2xNAAlphaUnshAlpha,
    PixelShader::ModDualCrossfade,
    PixelShader::ModDepth,
    PixelShader::ModAddAlphaAlpha,
    PixelShader::ModMod,
    PixelShader::ModMaskedDualCrossfade,
    PixelShader::OpaqueAlpha,
    PixelShader::OpaqueMod2xNAAlphaUnshAlpha,
    PixelShader::ModDepth,
];

/// Lookup tables the derivation reads
#[derive(Debug, Clone, Copy)]
pub struct ShaderTables<'a> {
    pub materials: &'a [M2Material],
    pub texture_unit_lookup: &'a [u16],
    pub transparency_lookup: &'a [u16],
    pub blend_override: Option<&'a [u16]>,
}

impl ShaderTables<'_> {
    fn material(&self, index: u16) -> Result<&M2Material> {
        self.materials.get(index as usize).ok_or_else(|| {
            LoadError::corrupt(format!(
                "render flag {index} of {}",
                self.materials.len()
            ))
        })
    }

    fn blend(&self, pass: &RenderPass) -> Result<u16> {
        self.material(pass.render_flag_index).map(|m| m.blend_mode)
    }

    fn unlit(&self, pass: &RenderPass) -> Result<bool> {
        self.material(pass.render_flag_index).map(M2Material::is_unlit)
    }

    fn texture_unit(&self, index: usize) -> Result<u16> {
        self.texture_unit_lookup.get(index).copied().ok_or_else(|| {
            LoadError::corrupt(format!(
                "texture unit lookup {index} of {}",
                self.texture_unit_lookup.len()
            ))
        })
    }

    fn transparency(&self, index: u16) -> Result<u16> {
        self.transparency_lookup
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                LoadError::corrupt(format!(
                    "transparency lookup {index} of {}",
                    self.transparency_lookup.len()
                ))
            })
    }

    fn same_transparency(&self, a: &RenderPass, b: &RenderPass) -> Result<bool> {
        Ok(self.transparency(a.transparency_combo_index)?
            == self.transparency(b.transparency_combo_index)?)
    }
}

/// Run the whole derivation over freshly built passes
pub fn derive_shader_ids(passes: &mut [RenderPass], tables: &ShaderTables<'_>) -> Result<()> {
    apply_blend_override(passes, tables)?;
    collapse_layers(passes, tables)?;
    resolve_pixel_shaders(passes)
}

/// Step 1: build each pass's id from blend values
pub fn apply_blend_override(passes: &mut [RenderPass], tables: &ShaderTables<'_>) -> Result<()> {
    for pass in passes.iter_mut() {
        let blend = tables.blend(pass)?;
        let texture_count = usize::from(pass.texture_count);

        let Some(overrides) = tables.blend_override else {
            let mut shader = u16::from(blend != 0);
            if texture_count > 2 {
                shader |= 0x8;
            }
            shader <<= 4;
            if texture_count == 1 {
                shader |= 0x4000;
            }
            pass.shader_id = shader;
            continue;
        };

        let mut unit_values = [0u16; 2];
        let mut shader = 0u16;
        for unit in 0..texture_count {
            let override_index = usize::from(pass.shader_id) + unit;
            let mut value = *overrides.get(override_index).ok_or_else(|| {
                LoadError::corrupt(format!(
                    "blend override {override_index} of {}",
                    overrides.len()
                ))
            })?;
            let coord = tables.texture_unit(usize::from(pass.texture_coord_combo_index) + unit)?;

            if unit == 0 && blend == 0 {
                value = 0;
            }
            if let Some(slot) = unit_values.get_mut(unit) {
                *slot = value;
            }
            if coord == 1 && unit + 1 == texture_count {
                shader |= 0x4000;
            }
        }

        pass.shader_id = shader | unit_values[1] | (unit_values[0] << 4);
    }
    Ok(())
}

/// Progress of the "opaque base + alpha layer" pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseLayer {
    Idle,
    /// A two-texture opaque base with an environment unit was seen
    AwaitingAlpha,
}

/// Progress of the "opaque base + env layer + alpha layer" chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvLayer {
    Idle,
    /// A single-texture opaque base was seen
    AwaitingEnv,
    /// The env layer was merged; an alpha layer may follow
    AwaitingAlpha,
    /// Chain complete; later passes of the material are left alone
    Finished,
}

/// Step 2: merge layered materials into combiner ids
///
/// Transitions, evaluated in this order for each pass that starts a new
/// render flag (`blend`, `tc` = texture count and `unit[n]` =
/// texture-coordinate lookup of the pass's n-th unit):
///
/// | register | state | condition | effect |
/// |---|---|---|---|
/// | base | `AwaitingAlpha` | blend 1 or 2, tc 1, same unlit flag, same texture combo, same transparency | pass `0x8000`, base pass `0x8001` |
/// | base | `AwaitingAlpha` | always afterwards | `Idle` |
/// | base | `Idle` | blend 0, tc 2, id low bits 4 or 6, `unit[0] == 0`, `unit[1] > 2` | `AwaitingAlpha` |
/// | env | `AwaitingEnv` | not (blend 4 or 6, tc 1, `unit[0] > 2`) | base `Idle`, env `Idle` |
/// | env | `AwaitingEnv` | same transparency | pass `0x8000`, base pass `0xE` (blend 6) or `0x8002` (blend 4), `AwaitingAlpha`, next pass |
/// | env | `AwaitingAlpha` | blend not 1/2, or tc not 1, or unlit flags equal, or texture combo low byte differs | base `Idle`, env `Idle` |
/// | env | `AwaitingAlpha` | same transparency | pass `0x8000`, base pass `0x8003` after `0x8002` else `0x8001`, `Finished`, next pass |
/// | env | `AwaitingEnv`/`AwaitingAlpha` | otherwise | `Idle` |
/// | env | `Finished` | always | next pass |
/// | env | any | blend 0, tc 1, `unit[0] == 0` | `AwaitingEnv` |
///
/// Layer-0 passes become the base pass; opaque ones first lose their
/// `0x70` bits. Passes repeating the previous render flag are skipped here
/// and reduced afterwards.
pub fn collapse_layers(passes: &mut [RenderPass], tables: &ShaderTables<'_>) -> Result<()> {
    let mut base_state = BaseLayer::Idle;
    let mut env_state = EnvLayer::Idle;
    let mut base: Option<usize> = None;
    let mut previous_flag: Option<u16> = None;
    let mut needs_reduction = false;

    for index in 0..passes.len() {
        let render_flag = passes[index].render_flag_index;
        if previous_flag == Some(render_flag) {
            needs_reduction = true;
            continue;
        }
        previous_flag = Some(render_flag);

        let blend = tables.blend(&passes[index])?;
        let lower_bits = passes[index].shader_id & 0x7;
        let texture_count = passes[index].texture_count;
        let coord_index = usize::from(passes[index].texture_coord_combo_index);

        if passes[index].material_layer == 0 {
            if texture_count >= 1 && blend == 0 {
                passes[index].shader_id &= 0xFF8F;
            }
            base = Some(index);
        }

        let base_index = match base {
            Some(base_index) => base_index,
            None => {
                log::debug!("Pass {index} precedes any layer-0 pass; using it as the base layer");
                base = Some(index);
                index
            }
        };

        let unlit_matches = tables.unlit(&passes[index])? == tables.unlit(&passes[base_index])?;

        if base_state == BaseLayer::AwaitingAlpha {
            if (blend == 1 || blend == 2)
                && texture_count == 1
                && unlit_matches
                && passes[index].texture_combo_index == passes[base_index].texture_combo_index
                && tables.same_transparency(&passes[index], &passes[base_index])?
            {
                passes[index].shader_id = 0x8000;
                passes[base_index].shader_id = 0x8001;
            }
            base_state = BaseLayer::Idle;
        }

        if blend == 0
            && texture_count == 2
            && (lower_bits == 4 || lower_bits == 6)
            && tables.texture_unit(coord_index)? == 0
            && tables.texture_unit(coord_index + 1)? > 2
        {
            base_state = BaseLayer::AwaitingAlpha;
        }

        match env_state {
            EnvLayer::Idle => {}
            EnvLayer::Finished => continue,
            EnvLayer::AwaitingEnv => {
                let fails = (blend != 4 && blend != 6)
                    || texture_count != 1
                    || tables.texture_unit(coord_index)? <= 2;
                if fails {
                    base_state = BaseLayer::Idle;
                } else if tables.same_transparency(&passes[index], &passes[base_index])? {
                    passes[index].shader_id = 0x8000;
                    passes[base_index].shader_id = if blend == 4 { 0x8002 } else { 0xE };
                    env_state = EnvLayer::AwaitingAlpha;
                    continue;
                }
                env_state = EnvLayer::Idle;
            }
            EnvLayer::AwaitingAlpha => {
                log::debug!("Pass {index} reaches the second alpha-layer merge");
                let fails = (blend != 2 && blend != 1)
                    || texture_count != 1
                    || unlit_matches
                    || (passes[index].texture_combo_index & 0xFF)
                        != (passes[base_index].texture_combo_index & 0xFF);
                if fails {
                    base_state = BaseLayer::Idle;
                } else if tables.same_transparency(&passes[index], &passes[base_index])? {
                    passes[index].shader_id = 0x8000;
                    passes[base_index].shader_id = if passes[base_index].shader_id == 0x8002 {
                        0x8003
                    } else {
                        0x8001
                    };
                    env_state = EnvLayer::Finished;
                    continue;
                }
                env_state = EnvLayer::Idle;
            }
        }

        if blend == 0 && texture_count == 1 && tables.texture_unit(coord_index)? == 0 {
            env_state = EnvLayer::AwaitingEnv;
        }
    }

    if needs_reduction {
        reduce_repeated_passes(passes);
    }
    Ok(())
}

/// Passes repeating the previous render flag take over its shader and
/// geometry
fn reduce_repeated_passes(passes: &mut [RenderPass]) {
    for index in 1..passes.len() {
        let (head, tail) = passes.split_at_mut(index);
        let previous = &head[index - 1];
        let pass = &mut tail[0];
        if pass.render_flag_index != previous.render_flag_index {
            continue;
        }

        pass.shader_id = previous.shader_id;
        pass.texture_count = previous.texture_count;
        pass.texture_combo_index = previous.texture_combo_index;
        pass.texture_coord_combo_index = previous.texture_coord_combo_index;
        pass.index_start = previous.index_start;
        pass.index_count = previous.index_count;
        pass.vertex_start = previous.vertex_start;
        pass.vertex_end = previous.vertex_end;
        pass.duplicate = true;
    }
}

/// Map a shader id to its combiner
pub fn pixel_shader(texture_count: u16, shader_id: u16) -> Result<PixelShader> {
    if shader_id & 0x8000 != 0 {
        let index = usize::from(shader_id & !0x8000);
        return PIXEL_SHADER_TABLE.get(index).copied().ok_or_else(|| {
            LoadError::corrupt(format!("pixel shader table index {index}"))
        });
    }

    let modulated = shader_id & 0x70 != 0;
    if texture_count == 1 {
        return Ok(if modulated {
            PixelShader::Mod
        } else {
            PixelShader::Opaque
        });
    }

    Ok(match (modulated, shader_id & 0x7) {
        (true, 0) => PixelShader::ModOpaque,
        (true, 3) => PixelShader::ModAdd,
        (true, 4) => PixelShader::ModMod2x,
        (true, 6) => PixelShader::ModMod2xNA,
        (true, 7) => PixelShader::ModAddNA,
        (true, _) => PixelShader::ModMod,
        (false, 0) => PixelShader::OpaqueOpaque,
        (false, 3) | (false, 7) => PixelShader::OpaqueAddAlpha,
        (false, 4) => PixelShader::OpaqueMod2x,
        (false, 6) => PixelShader::OpaqueMod2xNA,
        (false, _) => PixelShader::OpaqueMod,
    })
}

/// Step 3: store the combiner of every pass
pub fn resolve_pixel_shaders(passes: &mut [RenderPass]) -> Result<()> {
    for pass in passes.iter_mut() {
        pass.pixel_shader = pixel_shader(pass.texture_count, pass.shader_id)?;
    }
    Ok(())
}
