use std::{collections::BTreeMap, sync::Arc};

use glam::Vec3;

use super::{buffer_view::BufferView, document::RawAccessor, error::SceneError};

const KIND: &str = "accessor";

/// Upper bound on the components an accessor without a buffer view may
/// expand to. Such accessors read as zeros and have no data to bound them.
pub const MAX_VIEWLESS_COMPONENTS: usize = 1 << 24;

/// GL component type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl ComponentType {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::Byte),
            5121 => Some(Self::UnsignedByte),
            5122 => Some(Self::Short),
            5123 => Some(Self::UnsignedShort),
            5124 => Some(Self::Int),
            5125 => Some(Self::UnsignedInt),
            5126 => Some(Self::Float),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }

    fn read(self, bytes: &[u8]) -> Option<f32> {
        let value = match self {
            Self::Byte => f32::from(i8::from_le_bytes(bytes.try_into().ok()?)),
            Self::UnsignedByte => f32::from(*bytes.first()?),
            Self::Short => f32::from(i16::from_le_bytes(bytes.try_into().ok()?)),
            Self::UnsignedShort => f32::from(u16::from_le_bytes(bytes.try_into().ok()?)),
            Self::Int => i32::from_le_bytes(bytes.try_into().ok()?) as f32,
            Self::UnsignedInt => u32::from_le_bytes(bytes.try_into().ok()?) as f32,
            Self::Float => f32::from_le_bytes(bytes.try_into().ok()?),
        };
        Some(value)
    }

    fn read_index(self, bytes: &[u8]) -> Option<u32> {
        match self {
            Self::UnsignedByte => bytes.first().map(|value| u32::from(*value)),
            Self::UnsignedShort => Some(u32::from(u16::from_le_bytes(bytes.try_into().ok()?))),
            Self::UnsignedInt => Some(u32::from_le_bytes(bytes.try_into().ok()?)),
            _ => None,
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT2" => Some(Self::Mat2),
            "MAT3" => Some(Self::Mat3),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    /// Number of components per element.
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// Typed view over a buffer view.
#[derive(Debug, Clone)]
pub struct Accessor {
    pub id: String,
    pub buffer_view: Option<String>,
    pub byte_offset: usize,
    pub byte_stride: Option<usize>,
    pub component_type: ComponentType,
    pub count: usize,
    pub kind: ElementKind,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    view: Option<Arc<BufferView>>,
}

impl Accessor {
    pub fn new(
        id: &str,
        raw: &RawAccessor,
        views: &BTreeMap<String, Arc<BufferView>>,
    ) -> Result<Self, SceneError> {
        let component_type = ComponentType::from_gl(raw.component_type).ok_or_else(|| {
            SceneError::unsupported(KIND, id, "componentType", raw.component_type)
        })?;
        let kind = ElementKind::from_name(&raw.kind)
            .ok_or_else(|| SceneError::unsupported(KIND, id, "type", &raw.kind))?;

        let view = match raw.buffer_view.as_ref() {
            Some(reference) => {
                let view_id = reference.id();
                let view = views
                    .get(&view_id)
                    .ok_or_else(|| SceneError::missing(KIND, id, "bufferView", &view_id))?;
                Some(Arc::clone(view))
            }
            None => None,
        };

        let accessor = Self {
            id: id.to_string(),
            buffer_view: view.as_ref().map(|view| view.id.clone()),
            byte_offset: raw.byte_offset,
            byte_stride: raw.byte_stride.filter(|stride| *stride > 0),
            component_type,
            count: raw.count,
            kind,
            min: raw.min.clone(),
            max: raw.max.clone(),
            view,
        };
        accessor.check_bounds()?;
        Ok(accessor)
    }

    /// Components per element.
    pub fn size(&self) -> usize {
        self.kind.components()
    }

    /// Bytes per element when tightly packed.
    pub fn element_size(&self) -> usize {
        self.size() * self.component_type.size()
    }

    /// Distance in bytes between consecutive elements.
    pub fn stride(&self) -> usize {
        self.byte_stride
            .or_else(|| self.view.as_ref().and_then(|view| view.byte_stride))
            .unwrap_or_else(|| self.element_size())
    }

    /// Every element flattened to `count * size()` floats.
    pub fn read_f32(&self) -> Result<Vec<f32>, SceneError> {
        let Some(view) = self.view.as_ref() else {
            return Ok(vec![0.0; self.viewless_components()?]);
        };

        let bytes = view.bytes();
        let component_size = self.component_type.size();
        let stride = self.stride();
        let mut values = Vec::with_capacity(self.count * self.size());

        for element in 0..self.count {
            let base = self.byte_offset + element * stride;
            for component in 0..self.size() {
                let at = base + component * component_size;
                let value = bytes
                    .get(at..at + component_size)
                    .and_then(|slice| self.component_type.read(slice))
                    .ok_or_else(|| self.read_error(element))?;
                values.push(value);
            }
        }

        Ok(values)
    }

    pub fn read_vec3(&self) -> Result<Vec<Vec3>, SceneError> {
        if self.kind != ElementKind::Vec3 {
            return Err(SceneError::unsupported(
                KIND,
                &self.id,
                "type for vec3 read",
                format!("{:?}", self.kind),
            ));
        }

        Ok(self
            .read_f32()?
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .collect())
    }

    /// Decode an index accessor (unsigned byte, short or int scalars).
    pub fn read_indices(&self) -> Result<Vec<u32>, SceneError> {
        if self.kind != ElementKind::Scalar
            || !matches!(
                self.component_type,
                ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
            )
        {
            return Err(SceneError::unsupported(
                KIND,
                &self.id,
                "index layout",
                format!("{:?} {:?}", self.kind, self.component_type),
            ));
        }

        let Some(view) = self.view.as_ref() else {
            return Ok(vec![0; self.viewless_components()? / self.size()]);
        };

        let bytes = view.bytes();
        let component_size = self.component_type.size();
        let stride = self.stride();

        (0..self.count)
            .map(|element| {
                let at = self.byte_offset + element * stride;
                bytes
                    .get(at..at + component_size)
                    .and_then(|slice| self.component_type.read_index(slice))
                    .ok_or_else(|| self.read_error(element))
            })
            .collect()
    }

    /// Zero-filled length of an accessor with no buffer view.
    fn viewless_components(&self) -> Result<usize, SceneError> {
        match self.count.checked_mul(self.size()) {
            Some(total) if total <= MAX_VIEWLESS_COMPONENTS => Ok(total),
            _ => Err(SceneError::out_of_bounds(
                KIND,
                &self.id,
                format!(
                    "{} elements of {} components exceed the limit of {MAX_VIEWLESS_COMPONENTS} \
                     for an accessor without a bufferView",
                    self.count,
                    self.size()
                ),
            )),
        }
    }

    fn check_bounds(&self) -> Result<(), SceneError> {
        let Some(view) = self.view.as_ref() else {
            return self.viewless_components().map(|_| ());
        };
        let Some(last) = self.count.checked_sub(1) else {
            return Ok(());
        };

        let end = last
            .checked_mul(self.stride())
            .and_then(|offset| offset.checked_add(self.byte_offset))
            .and_then(|offset| offset.checked_add(self.element_size()));

        match end {
            Some(end) if end <= view.len() => Ok(()),
            _ => Err(SceneError::out_of_bounds(
                KIND,
                &self.id,
                format!(
                    "{} elements of {} bytes at offset {} exceed bufferView `{}` of {} bytes",
                    self.count,
                    self.element_size(),
                    self.byte_offset,
                    view.id,
                    view.len()
                ),
            )),
        }
    }

    fn read_error(&self, element: usize) -> SceneError {
        SceneError::out_of_bounds(KIND, &self.id, format!("element {element} is outside its view"))
    }
}
