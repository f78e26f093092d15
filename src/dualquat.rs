use crate::animation::slerp;
use nalgebra_glm as glm;

/// Column lengths below this are treated as a collapsed axis and left alone
const SCALE_EPSILON: f32 = 1.0e-6;

/// Dual quaternion
/// GLM has support in the `GLM_GTX_dual_quaternion` extension but this does not
/// seem to be available in the `nalgebra_glm` implementation. So some
/// functionality is implemented here using `glm::Quat`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualQuat {
    pub real: glm::Quat,
    pub dual: glm::Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self {
            // Real part contains the rotation
            real: glm::quat(0.0, 0.0, 0.0, 1.0),
            // Dual part contains the translation but is also effected by
            // the rotation
            dual: glm::quat(0.0, 0.0, 0.0, 0.0),
        }
    }
}

impl DualQuat {
    /// Creates a unit dual quaternion from a rotation and a translation.
    /// The dual part is `1/2 * t * r` where `t` is the translation as a pure
    /// quaternion.
    #[must_use]
    pub fn new(rotation: &glm::Quat, translation: &glm::Vec3) -> Self {
        let real = glm::quat_normalize(rotation);
        let pure = glm::quat(translation.x, translation.y, translation.z, 0.0);
        Self {
            real,
            dual: (pure * real) * 0.5_f32,
        }
    }
}

/// Conversion to GLSL shader ready mat2x4
impl From<DualQuat> for [[f32; 4]; 2] {
    fn from(dq: DualQuat) -> [[f32; 4]; 2] {
        [
            [dq.real.i, dq.real.j, dq.real.k, dq.real.w],
            [dq.dual.i, dq.dual.j, dq.dual.k, dq.dual.w],
        ]
    }
}

/// Conversion from a column major 4x4 matrix array
impl From<[[f32; 4]; 4]> for DualQuat {
    fn from(arr: [[f32; 4]; 4]) -> Self {
        let m: glm::Mat4 = arr.into();
        from_mat4(&m)
    }
}

#[must_use]
pub fn add(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real + q2.real,
        dual: q1.dual + q2.dual,
    }
}

#[must_use]
pub fn mul(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real * q2.real,
        dual: q1.real * q2.dual + q1.dual * q2.real,
    }
}

#[must_use]
pub fn scale(q: &DualQuat, s: f32) -> DualQuat {
    DualQuat {
        real: q.real * s,
        dual: q.dual * s,
    }
}

#[must_use]
pub fn conjugate(q: &DualQuat) -> DualQuat {
    DualQuat {
        real: q.real.conjugate(),
        dual: q.dual.conjugate(),
    }
}

/// Divides both parts by the length of the real part. A zero length real part
/// can't be fixed so the identity is returned for it.
#[must_use]
pub fn normalize(q: &DualQuat) -> DualQuat {
    let n = q.real.norm();
    if n <= f32::EPSILON {
        return DualQuat::default();
    }
    scale(q, 1.0 / n)
}

/// Returns the rotation and translation held by a unit dual quaternion
#[must_use]
pub fn decompose(q: &DualQuat) -> (glm::Quat, glm::Vec3) {
    let t = (q.dual * q.real.conjugate()) * 2.0_f32;
    (q.real, glm::vec3(t.i, t.j, t.k))
}

/// Converts to a rigid transform matrix
#[must_use]
pub fn to_mat4(q: &DualQuat) -> glm::Mat4 {
    let q = normalize(q);
    let (rotation, translation) = decompose(&q);
    glm::translation(&translation) * glm::quat_to_mat4(&rotation)
}

/// Returns the translation column of a matrix
#[must_use]
pub fn translation_of(m: &glm::Mat4) -> glm::Vec3 {
    glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Splits the upper 3x3 block of a matrix into a rotation and per axis scale.
/// The scale is the length of each column, which is exact for matrices built
/// as `T * R * S`.
#[must_use]
pub fn rotation_and_scale(m: &glm::Mat4) -> (glm::Quat, glm::Vec3) {
    let mut r = glm::mat4_to_mat3(m);
    let s = glm::vec3(
        r.column(0).norm(),
        r.column(1).norm(),
        r.column(2).norm(),
    );
    for (i, len) in s.iter().enumerate() {
        if *len > SCALE_EPSILON {
            r.column_mut(i).unscale_mut(*len);
        }
    }
    (glm::quat_normalize(&glm::mat3_to_quat(&r)), s)
}

/// Converts a rotation and translation matrix. Any scale in the matrix is
/// discarded.
#[must_use]
pub fn from_mat4(m: &glm::Mat4) -> DualQuat {
    let (rotation, _) = rotation_and_scale(m);
    DualQuat::new(&rotation, &translation_of(m))
}

/// Dual quaternion linear blending. Cheap, and good enough for the short
/// spans between keyframes or for skin weights.
#[must_use]
pub fn dlb(q1: &DualQuat, q2: &DualQuat, t: f32) -> DualQuat {
    // Take the shortest path
    let q2 = if q1.real.dot(&q2.real) < 0.0 {
        scale(q2, -1.0)
    } else {
        *q2
    };
    normalize(&add(&scale(q1, 1.0 - t), &scale(&q2, t)))
}

/// Separate interpolation: slerp of the rotation and lerp of the translation
#[must_use]
pub fn sep(q1: &DualQuat, q2: &DualQuat, t: f32) -> DualQuat {
    let (r1, t1) = decompose(q1);
    let (r2, t2) = decompose(q2);
    DualQuat::new(&slerp(&r1, &r2, t), &glm::lerp(&t1, &t2, t))
}

/// Per bone data for dual quaternion skinning. Dual quaternions can only
/// hold rotation and translation, so any scale travels in a separate matrix
/// which also carries the bone offset. The skin shader applies `scale` to
/// the vertex first and then the dual quaternion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkinDualQuat {
    pub dq: DualQuat,
    pub scale: glm::Mat4,
}

impl Default for SkinDualQuat {
    fn default() -> Self {
        Self {
            dq: DualQuat::default(),
            scale: glm::Mat4::identity(),
        }
    }
}

impl SkinDualQuat {
    /// Builds from the animated model space transform of a bone (without the
    /// offset) and the bone offset matrix
    #[must_use]
    pub fn from_parts(transform: &glm::Mat4, offset: &glm::Mat4) -> Self {
        let (rotation, s) = rotation_and_scale(transform);
        Self {
            dq: DualQuat::new(&rotation, &translation_of(transform)),
            scale: glm::scaling(&s) * offset,
        }
    }

    /// Recombines into the equivalent linear blend skinning matrix
    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        to_mat4(&self.dq) * self.scale
    }
}
