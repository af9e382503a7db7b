use std::collections::BTreeMap;

use crate::foundation::core::{Color, Image, Mat4, Vec4};
use crate::foundation::error::{ScreenFxError, ScreenFxResult};

/// A single named pass input.
#[derive(Clone, Copy, Debug)]
pub enum ParamValue<'a> {
    Float(f32),
    Vector(Vec4),
    Color(Color),
    Matrix(Mat4),
    Texture(&'a Image),
}

impl ParamValue<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vector(_) => "vector",
            Self::Color(_) => "color",
            Self::Matrix(_) => "matrix",
            Self::Texture(_) => "texture",
        }
    }
}

/// Named parameters handed to a pass. Rebuilt or partially updated before each pass.
///
/// Texture entries borrow their images, so a parameter set never outlives the scratch
/// buffers it points at.
#[derive(Clone, Debug, Default)]
pub struct PassParams<'a> {
    values: BTreeMap<String, ParamValue<'a>>,
}

impl<'a> PassParams<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue<'a>) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn set_float(&mut self, name: impl Into<String>, v: f32) -> &mut Self {
        self.set(name, ParamValue::Float(v))
    }

    pub fn set_vector(&mut self, name: impl Into<String>, v: Vec4) -> &mut Self {
        self.set(name, ParamValue::Vector(v))
    }

    pub fn set_color(&mut self, name: impl Into<String>, v: Color) -> &mut Self {
        self.set(name, ParamValue::Color(v))
    }

    pub fn set_matrix(&mut self, name: impl Into<String>, v: Mat4) -> &mut Self {
        self.set(name, ParamValue::Matrix(v))
    }

    pub fn set_texture(&mut self, name: impl Into<String>, v: &'a Image) -> &mut Self {
        self.set(name, ParamValue::Texture(v))
    }

    /// Builder form of [`PassParams::set_float`].
    pub fn with_float(mut self, name: impl Into<String>, v: f32) -> Self {
        self.set_float(name, v);
        self
    }

    /// Overwrite entries with those of `other`, keeping everything else.
    pub fn merge(&mut self, other: &PassParams<'a>) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), *v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue<'a>> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn float(&self, name: &str) -> ScreenFxResult<f32> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(mismatch(name, "float", other)),
        }
    }

    /// A float parameter, or `default` when unset.
    pub fn float_or(&self, name: &str, default: f32) -> ScreenFxResult<f32> {
        if self.contains(name) {
            self.float(name)
        } else {
            Ok(default)
        }
    }

    pub fn vector(&self, name: &str) -> ScreenFxResult<Vec4> {
        match self.require(name)? {
            ParamValue::Vector(v) => Ok(*v),
            ParamValue::Color(c) => Ok(c.to_vec4()),
            other => Err(mismatch(name, "vector", other)),
        }
    }

    pub fn color(&self, name: &str) -> ScreenFxResult<Vec4> {
        match self.require(name)? {
            ParamValue::Color(c) => Ok(c.to_vec4()),
            ParamValue::Vector(v) => Ok(*v),
            other => Err(mismatch(name, "color", other)),
        }
    }

    pub fn matrix(&self, name: &str) -> ScreenFxResult<Mat4> {
        match self.require(name)? {
            ParamValue::Matrix(m) => Ok(*m),
            other => Err(mismatch(name, "matrix", other)),
        }
    }

    pub fn texture(&self, name: &str) -> ScreenFxResult<&'a Image> {
        match self.require(name)? {
            ParamValue::Texture(t) => Ok(*t),
            other => Err(mismatch(name, "texture", other)),
        }
    }

    fn require(&self, name: &str) -> ScreenFxResult<&ParamValue<'a>> {
        self.values
            .get(name)
            .ok_or_else(|| ScreenFxError::render(format!("missing pass parameter '{name}'")))
    }
}

fn mismatch(name: &str, expected: &str, got: &ParamValue<'_>) -> ScreenFxError {
    ScreenFxError::render(format!(
        "pass parameter '{name}' must be a {expected}, got {}",
        got.kind()
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/program/params.rs"]
mod tests;
