use bitflags::bitflags;

bitflags! {
    /// State groups copied by [`crate::CapturableState::capture_from`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct CaptureFlags: u32 {
        const TEXTURES = 1 << 0;
        const CLIP_PLANES = 1 << 1;
        const STREAM_FREQ = 1 << 2;
        const LIGHTS = 1 << 3;
    }
}
