//! Capturable D3D9 fixed-function state.
//!
//! [`CapturableState`] is the subset of device state that state blocks record and reapply: bound
//! textures, user clip planes, per-stream frequency divisors and the list of enabled lights. The
//! live device state and every stored state block each own one instance.

pub mod caps;
pub mod capture;
pub mod clip_plane;
mod error;
pub mod state;

pub use crate::caps::{StateConfig, LEGACY_MAX_ENABLED_LIGHTS, UNUSED_LIGHT_INDEX};
pub use crate::capture::CaptureFlags;
pub use crate::clip_plane::ClipPlane;
pub use crate::error::{Result, StateError};
pub use crate::state::{CapturableState, StreamFreq, StreamFreqKind};
