//! Fixed-function slot counts and device-negotiated capacities.

/// Pixel shader / fixed-function texture stages (`s0..s15`).
pub const MAX_PIXEL_SAMPLERS: usize = 16;

/// Slot used for `D3DDMAPSAMPLER`.
pub const DMAP_SAMPLER_SLOT: usize = MAX_PIXEL_SAMPLERS;

/// Vertex texture samplers (`D3DVERTEXTEXTURESAMPLER0..3`).
pub const MAX_VERTEX_SAMPLERS: usize = 4;

/// Total texture slots: pixel samplers, then the displacement-map sampler, then vertex samplers.
pub const MAX_TEXTURE_SLOTS: usize = MAX_PIXEL_SAMPLERS + 1 + MAX_VERTEX_SAMPLERS;

/// `D3DMAXUSERCLIPPLANES`.
pub const MAX_CLIP_PLANES: usize = 6;

/// Vertex streams addressable by `SetStreamSource`/`SetStreamSourceFreq`.
pub const MAX_STREAMS: usize = 16;

/// The classic D3D9 limit on simultaneously enabled lights.
pub const LEGACY_MAX_ENABLED_LIGHTS: usize = 8;

/// Marks an enabled-light slot that holds no light.
pub const UNUSED_LIGHT_INDEX: u32 = u32::MAX;

/// One vertex per instance step, i.e. no instancing.
pub const DEFAULT_STREAM_FREQ: u32 = 1;

/// Sampler number of the displacement-map sampler.
pub const D3DDMAPSAMPLER: u32 = 256;
/// Sampler number of the first vertex texture sampler.
pub const D3DVERTEXTEXTURESAMPLER0: u32 = 257;

/// `SetStreamSourceFreq` flag marking the stream that carries the instance count.
pub const D3DSTREAMSOURCE_INDEXEDDATA: u32 = 1 << 30;
/// `SetStreamSourceFreq` flag marking per-instance data.
pub const D3DSTREAMSOURCE_INSTANCEDATA: u32 = 2 << 30;

/// Map a D3D9 sampler number to a texture slot index.
///
/// Returns `None` for sampler numbers D3D9 does not define.
pub fn sampler_to_slot(sampler: u32) -> Option<usize> {
    match sampler {
        s if (s as usize) < MAX_PIXEL_SAMPLERS => Some(s as usize),
        D3DDMAPSAMPLER => Some(DMAP_SAMPLER_SLOT),
        s if (D3DVERTEXTEXTURESAMPLER0..D3DVERTEXTEXTURESAMPLER0 + MAX_VERTEX_SAMPLERS as u32)
            .contains(&s) =>
        {
            Some(DMAP_SAMPLER_SLOT + 1 + (s - D3DVERTEXTEXTURESAMPLER0) as usize)
        }
        _ => None,
    }
}

/// Capability-derived sizing for a [`crate::CapturableState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateConfig {
    /// Number of lights the owning device allows to be enabled at once. May exceed
    /// [`LEGACY_MAX_ENABLED_LIGHTS`].
    pub max_enabled_lights: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_enabled_lights: LEGACY_MAX_ENABLED_LIGHTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_numbers_map_to_contiguous_slots() {
        assert_eq!(sampler_to_slot(0), Some(0));
        assert_eq!(sampler_to_slot(15), Some(15));
        assert_eq!(sampler_to_slot(16), None);
        assert_eq!(sampler_to_slot(D3DDMAPSAMPLER), Some(16));
        assert_eq!(sampler_to_slot(D3DVERTEXTEXTURESAMPLER0), Some(17));
        assert_eq!(sampler_to_slot(D3DVERTEXTEXTURESAMPLER0 + 3), Some(20));
        assert_eq!(sampler_to_slot(D3DVERTEXTEXTURESAMPLER0 + 4), None);
        assert_eq!(MAX_TEXTURE_SLOTS, 21);
    }

    #[test]
    fn default_config_uses_legacy_light_limit() {
        assert_eq!(StateConfig::default().max_enabled_lights, 8);
    }
}
