use std::sync::Arc;

use tracing::{debug, trace};

use crate::caps::{
    StateConfig, D3DSTREAMSOURCE_INDEXEDDATA, D3DSTREAMSOURCE_INSTANCEDATA, DEFAULT_STREAM_FREQ,
    MAX_CLIP_PLANES, MAX_STREAMS, MAX_TEXTURE_SLOTS, UNUSED_LIGHT_INDEX,
};
use crate::capture::CaptureFlags;
use crate::clip_plane::ClipPlane;
use crate::error::{Result, StateError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamFreqKind {
    /// Plain per-vertex data.
    Vertex,
    /// The stream driving an instanced draw; `divider` is the instance count.
    IndexedData,
    /// Per-instance data, advanced every `divider` instances.
    InstanceData,
}

/// Decoded `SetStreamSourceFreq` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamFreq {
    pub kind: StreamFreqKind,
    pub divider: u32,
}

impl StreamFreq {
    pub fn decode(raw: u32) -> Self {
        let kind = if raw & D3DSTREAMSOURCE_INSTANCEDATA != 0 {
            StreamFreqKind::InstanceData
        } else if raw & D3DSTREAMSOURCE_INDEXEDDATA != 0 {
            StreamFreqKind::IndexedData
        } else {
            StreamFreqKind::Vertex
        };
        Self {
            kind,
            divider: raw & !(D3DSTREAMSOURCE_INDEXEDDATA | D3DSTREAMSOURCE_INSTANCEDATA),
        }
    }
}

/// Device state that a state block can record and reapply.
///
/// Texture slots hold shared references to the texture resource `T`. Binding clones the `Arc`,
/// unbinding or replacing drops it, and dropping the state releases every bound slot once, in
/// slot order. The resource is torn down by its own `Drop` when the last reference goes away.
///
/// The enabled-light list is sized once from the device's light capability and never resized.
#[derive(Debug)]
pub struct CapturableState<T> {
    textures: [Option<Arc<T>>; MAX_TEXTURE_SLOTS],
    clip_planes: [ClipPlane; MAX_CLIP_PLANES],
    stream_freq: [u32; MAX_STREAMS],
    enabled_light_indices: Vec<u32>,
}

impl<T> CapturableState<T> {
    pub fn new(max_enabled_lights: usize) -> Self {
        trace!(max_enabled_lights, "creating capturable D3D9 state");
        Self {
            textures: std::array::from_fn(|_| None),
            clip_planes: [ClipPlane::ZERO; MAX_CLIP_PLANES],
            stream_freq: [DEFAULT_STREAM_FREQ; MAX_STREAMS],
            enabled_light_indices: vec![UNUSED_LIGHT_INDEX; max_enabled_lights],
        }
    }

    pub fn with_config(config: StateConfig) -> Self {
        Self::new(config.max_enabled_lights)
    }

    // Textures.

    pub fn textures(&self) -> &[Option<Arc<T>>] {
        &self.textures
    }

    pub fn texture(&self, slot: usize) -> Option<&Arc<T>> {
        self.textures.get(slot)?.as_ref()
    }

    pub fn bound_texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }

    /// Bind `texture` to `slot` (or unbind with `None`). Returns whether the slot changed.
    ///
    /// Rebinding the reference already held is a no-op and leaves the strong count untouched.
    /// Otherwise the new reference is acquired before the previous one is released.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= MAX_TEXTURE_SLOTS`.
    pub fn set_texture(&mut self, slot: usize, texture: Option<&Arc<T>>) -> bool {
        let current = &mut self.textures[slot];
        match (current.as_ref(), texture) {
            (None, None) => return false,
            (Some(old), Some(new)) if Arc::ptr_eq(old, new) => return false,
            _ => {}
        }

        let previous = std::mem::replace(current, texture.cloned());
        trace!(
            slot,
            bound = texture.is_some(),
            released = previous.is_some(),
            "texture slot changed"
        );
        drop(previous);
        true
    }

    /// Move the reference out of `slot`, leaving it empty. The strong count is unchanged; the
    /// caller now owns the reference.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= MAX_TEXTURE_SLOTS`.
    pub fn take_texture(&mut self, slot: usize) -> Option<Arc<T>> {
        self.textures[slot].take()
    }

    /// Release every bound texture, in slot order.
    pub fn clear_textures(&mut self) {
        for (slot, texture) in self.textures.iter_mut().enumerate() {
            if let Some(texture) = texture.take() {
                trace!(
                    slot,
                    remaining = Arc::strong_count(&texture) - 1,
                    "releasing texture"
                );
            }
        }
    }

    // Clip planes.

    pub fn clip_planes(&self) -> &[ClipPlane; MAX_CLIP_PLANES] {
        &self.clip_planes
    }

    pub fn clip_planes_mut(&mut self) -> &mut [ClipPlane; MAX_CLIP_PLANES] {
        &mut self.clip_planes
    }

    /// Clip planes laid out for a constant-buffer upload.
    pub fn clip_planes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.clip_planes)
    }

    pub fn clip_plane(&self, index: usize) -> ClipPlane {
        self.clip_planes[index]
    }

    /// # Panics
    ///
    /// Panics if `index >= MAX_CLIP_PLANES`.
    pub fn set_clip_plane(&mut self, index: usize, plane: ClipPlane) -> bool {
        if self.clip_planes[index] == plane {
            return false;
        }
        self.clip_planes[index] = plane;
        true
    }

    // Stream frequencies.

    pub fn stream_freqs(&self) -> &[u32; MAX_STREAMS] {
        &self.stream_freq
    }

    pub fn stream_freq(&self, stream: usize) -> Option<u32> {
        self.stream_freq.get(stream).copied()
    }

    /// Store a raw `SetStreamSourceFreq` value. Values whose divider is zero, including a bare
    /// instancing flag, are rejected so every stream keeps a divisor of at least one.
    pub fn set_stream_freq(&mut self, stream: usize, value: u32) -> Result<bool> {
        let slot = self
            .stream_freq
            .get_mut(stream)
            .ok_or(StateError::StreamOutOfRange { stream })?;
        if StreamFreq::decode(value).divider == 0 {
            return Err(StateError::ZeroStreamFrequency { stream });
        }
        if *slot == value {
            return Ok(false);
        }
        *slot = value;
        Ok(true)
    }

    // Lights.

    pub fn max_enabled_lights(&self) -> usize {
        self.enabled_light_indices.len()
    }

    pub fn enabled_light_indices(&self) -> &[u32] {
        &self.enabled_light_indices
    }

    /// Mutable view of the enabled-light slots. The slice length is fixed; entries must be a
    /// light index or [`UNUSED_LIGHT_INDEX`].
    pub fn enabled_light_indices_mut(&mut self) -> &mut [u32] {
        &mut self.enabled_light_indices
    }

    /// Enabled light indices in slot order.
    pub fn enabled_lights(&self) -> impl Iterator<Item = u32> + '_ {
        self.enabled_light_indices
            .iter()
            .copied()
            .filter(|&index| index != UNUSED_LIGHT_INDEX)
    }

    pub fn is_light_enabled(&self, index: u32) -> bool {
        index != UNUSED_LIGHT_INDEX && self.enabled_light_indices.contains(&index)
    }

    /// Enable light `index`, returning the slot that holds it. Enabling an already enabled light
    /// returns its existing slot.
    pub fn enable_light(&mut self, index: u32) -> Result<usize> {
        if index == UNUSED_LIGHT_INDEX {
            return Err(StateError::InvalidLightIndex(index));
        }
        if let Some(slot) = self.light_slot(index) {
            return Ok(slot);
        }

        let capacity = self.enabled_light_indices.len();
        let Some(slot) = self.light_slot(UNUSED_LIGHT_INDEX) else {
            debug!(index, capacity, "no free enabled-light slot");
            return Err(StateError::LightCapacityExhausted { capacity });
        };
        self.enabled_light_indices[slot] = index;
        Ok(slot)
    }

    /// Disable light `index`. Returns `false` if it was not enabled.
    pub fn disable_light(&mut self, index: u32) -> bool {
        if index == UNUSED_LIGHT_INDEX {
            return false;
        }
        match self.light_slot(index) {
            Some(slot) => {
                self.enabled_light_indices[slot] = UNUSED_LIGHT_INDEX;
                true
            }
            None => false,
        }
    }

    fn light_slot(&self, index: u32) -> Option<usize> {
        self.enabled_light_indices.iter().position(|&i| i == index)
    }

    // Capture / apply.

    /// Copy the groups selected by `flags` from `src`.
    ///
    /// Texture slots follow the [`Self::set_texture`] ownership rules, so slots already holding
    /// the same reference are left alone. Light lists of different capacities copy the common
    /// prefix slot for slot and reset the remaining slots of `self` to [`UNUSED_LIGHT_INDEX`].
    /// Lights enabled in `src` past that prefix are packed into the free slots of `self`; only
    /// those that still do not fit are dropped.
    pub fn capture_from(&mut self, src: &CapturableState<T>, flags: CaptureFlags) {
        if flags.contains(CaptureFlags::TEXTURES) {
            for (slot, texture) in src.textures.iter().enumerate() {
                self.set_texture(slot, texture.as_ref());
            }
        }

        if flags.contains(CaptureFlags::CLIP_PLANES) {
            self.clip_planes = src.clip_planes;
        }

        if flags.contains(CaptureFlags::STREAM_FREQ) {
            self.stream_freq = src.stream_freq;
        }

        if flags.contains(CaptureFlags::LIGHTS) {
            let common = self
                .enabled_light_indices
                .len()
                .min(src.enabled_light_indices.len());
            let (head, tail) = src.enabled_light_indices.split_at(common);
            self.enabled_light_indices[..common].copy_from_slice(head);
            self.enabled_light_indices[common..].fill(UNUSED_LIGHT_INDEX);

            let mut dropped = 0usize;
            for &index in tail.iter().filter(|&&index| index != UNUSED_LIGHT_INDEX) {
                match self.light_slot(UNUSED_LIGHT_INDEX) {
                    Some(slot) => self.enabled_light_indices[slot] = index,
                    None => dropped += 1,
                }
            }
            if dropped != 0 {
                debug!(
                    dropped,
                    capacity = self.enabled_light_indices.len(),
                    "enabled lights do not fit the destination light capacity"
                );
            }
        }
    }
}

impl<T> Default for CapturableState<T> {
    fn default() -> Self {
        Self::with_config(StateConfig::default())
    }
}

impl<T> Clone for CapturableState<T> {
    /// Each bound texture gains one reference for the copy.
    fn clone(&self) -> Self {
        Self {
            textures: self.textures.clone(),
            clip_planes: self.clip_planes,
            stream_freq: self.stream_freq,
            enabled_light_indices: self.enabled_light_indices.clone(),
        }
    }
}

impl<T> Drop for CapturableState<T> {
    fn drop(&mut self) {
        self.clear_textures();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn stream_freq_decodes_instancing_flags() {
        assert_eq!(
            StreamFreq::decode(1),
            StreamFreq {
                kind: StreamFreqKind::Vertex,
                divider: 1
            }
        );
        assert_eq!(
            StreamFreq::decode(D3DSTREAMSOURCE_INDEXEDDATA | 100),
            StreamFreq {
                kind: StreamFreqKind::IndexedData,
                divider: 100
            }
        );
        assert_eq!(
            StreamFreq::decode(D3DSTREAMSOURCE_INSTANCEDATA | 1),
            StreamFreq {
                kind: StreamFreqKind::InstanceData,
                divider: 1
            }
        );
    }

    #[test]
    fn set_stream_freq_keeps_divisor_non_zero() {
        let mut state = CapturableState::<()>::new(0);
        assert_eq!(
            state.set_stream_freq(3, 0),
            Err(StateError::ZeroStreamFrequency { stream: 3 })
        );
        assert_eq!(state.stream_freq(3), Some(1));

        assert_eq!(state.set_stream_freq(3, D3DSTREAMSOURCE_INSTANCEDATA | 1), Ok(true));
        assert_eq!(state.set_stream_freq(3, D3DSTREAMSOURCE_INSTANCEDATA | 1), Ok(false));
        assert_eq!(
            state.set_stream_freq(MAX_STREAMS, 1),
            Err(StateError::StreamOutOfRange {
                stream: MAX_STREAMS
            })
        );
    }

    #[test]
    fn set_stream_freq_rejects_flag_without_divider() {
        let mut state = CapturableState::<()>::new(0);
        assert_eq!(
            state.set_stream_freq(1, D3DSTREAMSOURCE_INSTANCEDATA),
            Err(StateError::ZeroStreamFrequency { stream: 1 })
        );
        assert_eq!(
            state.set_stream_freq(2, D3DSTREAMSOURCE_INDEXEDDATA),
            Err(StateError::ZeroStreamFrequency { stream: 2 })
        );
        assert_eq!(state.stream_freq(1), Some(1));
        assert_eq!(state.stream_freq(2), Some(1));

        assert_eq!(state.set_stream_freq(2, D3DSTREAMSOURCE_INDEXEDDATA | 8), Ok(true));
        assert!(state
            .stream_freqs()
            .iter()
            .all(|&raw| StreamFreq::decode(raw).divider >= 1));
    }

    #[test]
    fn clip_plane_bytes_follow_plane_order() {
        let mut state = CapturableState::<()>::new(0);
        assert!(state.set_clip_plane(1, ClipPlane::new(1.0, 2.0, 3.0, 4.0)));
        assert!(!state.set_clip_plane(1, ClipPlane::new(1.0, 2.0, 3.0, 4.0)));

        let bytes = state.clip_planes_bytes();
        assert_eq!(bytes.len(), MAX_CLIP_PLANES * 16);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats[4..8], [1.0f32, 2.0, 3.0, 4.0]);
        assert!(floats[..4].iter().all(|&f| f == 0.0));
    }

    #[test]
    fn take_texture_transfers_ownership() {
        let tex = Arc::new(());
        let mut state = CapturableState::new(0);
        state.set_texture(2, Some(&tex));
        assert_eq!(Arc::strong_count(&tex), 2);

        let taken = state.take_texture(2).expect("slot was bound");
        assert!(Arc::ptr_eq(&taken, &tex));
        assert_eq!(Arc::strong_count(&tex), 2);
        assert!(state.texture(2).is_none());

        drop(taken);
        assert_eq!(Arc::strong_count(&tex), 1);
    }

    #[test]
    #[should_panic]
    fn set_texture_out_of_range_panics() {
        let tex = Arc::new(());
        let mut state = CapturableState::new(0);
        state.set_texture(MAX_TEXTURE_SLOTS, Some(&tex));
    }
}
