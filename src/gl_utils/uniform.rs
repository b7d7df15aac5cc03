//! Typed uniform payloads.
//!
//! A uniform write is decided at the call site: the value carries its own
//! shape, so the backend never has to inspect types at runtime.

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::error::{Error, Result};

/// Every uniform shape the renderer can push.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Bool(bool),
    BVec2([bool; 2]),
    BVec3([bool; 3]),
    BVec4([bool; 4]),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    /// Builds a float scalar or vector from a runtime-sized slice.
    pub fn from_floats(values: &[f32]) -> Result<Self> {
        match *values {
            [x] => Ok(Self::Float(x)),
            [x, y] => Ok(Self::Vec2([x, y])),
            [x, y, z] => Ok(Self::Vec3([x, y, z])),
            [x, y, z, w] => Ok(Self::Vec4([x, y, z, w])),
            _ => Err(Error::InvalidUniformArity(values.len())),
        }
    }

    /// Builds an int scalar or vector from a runtime-sized slice.
    pub fn from_ints(values: &[i32]) -> Result<Self> {
        match *values {
            [x] => Ok(Self::Int(x)),
            [x, y] => Ok(Self::IVec2([x, y])),
            [x, y, z] => Ok(Self::IVec3([x, y, z])),
            [x, y, z, w] => Ok(Self::IVec4([x, y, z, w])),
            _ => Err(Error::InvalidUniformArity(values.len())),
        }
    }

    /// Builds a bool scalar or vector from a runtime-sized slice.
    pub fn from_bools(values: &[bool]) -> Result<Self> {
        match *values {
            [x] => Ok(Self::Bool(x)),
            [x, y] => Ok(Self::BVec2([x, y])),
            [x, y, z] => Ok(Self::BVec3([x, y, z])),
            [x, y, z, w] => Ok(Self::BVec4([x, y, z, w])),
            _ => Err(Error::InvalidUniformArity(values.len())),
        }
    }

    /// Number of scalar components (9 and 16 for the matrices).
    pub fn components(&self) -> usize {
        match self {
            Self::Float(_) | Self::Int(_) | Self::Bool(_) => 1,
            Self::Vec2(_) | Self::IVec2(_) | Self::BVec2(_) => 2,
            Self::Vec3(_) | Self::IVec3(_) | Self::BVec3(_) => 3,
            Self::Vec4(_) | Self::IVec4(_) | Self::BVec4(_) => 4,
            Self::Mat3(_) => 9,
            Self::Mat4(_) => 16,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<[i32; 2]> for UniformValue {
    fn from(value: [i32; 2]) -> Self {
        Self::IVec2(value)
    }
}

impl From<[i32; 3]> for UniformValue {
    fn from(value: [i32; 3]) -> Self {
        Self::IVec3(value)
    }
}

impl From<[i32; 4]> for UniformValue {
    fn from(value: [i32; 4]) -> Self {
        Self::IVec4(value)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(value: Vector2<f32>) -> Self {
        Self::Vec2(value.into())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        Self::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        Self::Vec4(value.into())
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(value: Matrix3<f32>) -> Self {
        Self::Mat3(value)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        Self::Mat4(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_from_floats_picks_vector_width() {
        assert_eq!(UniformValue::from_floats(&[1.0]).unwrap(), UniformValue::Float(1.0));
        assert_eq!(
            UniformValue::from_floats(&[1.0, 2.0, 3.0]).unwrap(),
            UniformValue::Vec3([1.0, 2.0, 3.0])
        );
        assert_eq!(UniformValue::from_floats(&[0.0; 4]).unwrap().components(), 4);
    }

    #[test]
    fn test_unsupported_arity_is_rejected() {
        assert!(matches!(
            UniformValue::from_floats(&[]),
            Err(Error::InvalidUniformArity(0))
        ));
        assert!(matches!(
            UniformValue::from_ints(&[1, 2, 3, 4, 5]),
            Err(Error::InvalidUniformArity(5))
        ));
        assert!(matches!(
            UniformValue::from_bools(&[true; 6]),
            Err(Error::InvalidUniformArity(6))
        ));
    }

    #[test]
    fn test_bool_and_matrix_shapes() {
        assert_eq!(
            UniformValue::from_bools(&[true, false]).unwrap(),
            UniformValue::BVec2([true, false])
        );
        let mat: UniformValue = Matrix4::<f32>::identity().into();
        assert_eq!(mat.components(), 16);
        let normal: UniformValue = Matrix3::<f32>::identity().into();
        assert_eq!(normal.components(), 9);
    }
}
