use bytemuck::{Pod, Zeroable};

/// User clip plane equation `a*x + b*y + c*z + d*w >= 0`, as passed to `SetClipPlane`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ClipPlane {
    pub coeff: [f32; 4],
}

impl ClipPlane {
    pub const ZERO: Self = Self { coeff: [0.0; 4] };

    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            coeff: [a, b, c, d],
        }
    }
}

impl From<[f32; 4]> for ClipPlane {
    fn from(coeff: [f32; 4]) -> Self {
        Self { coeff }
    }
}
