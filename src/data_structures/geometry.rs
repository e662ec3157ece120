//! Vertex attribute buffers and triangle topology.

/// A flat float buffer interpreted in groups of `stride` components.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub stride: u32,
    pub vertices: Vec<f32>,
}

impl Attribute {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.stride.max(1) as usize
    }
}

/// Named vertex attributes, kept in insertion order, plus an optional index
/// buffer.
///
/// An empty index buffer means the geometry is drawn non-indexed as a single
/// triangle (3 vertices).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    attributes: Vec<(String, Attribute)>,
    index: Vec<u16>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the attribute `name`, or overwrite it in place if it exists.
    ///
    /// `vertices.len()` must be a multiple of `stride`; this is only checked in
    /// debug builds.
    pub fn add_attribute(&mut self, name: impl Into<String>, stride: u32, vertices: Vec<f32>) {
        let name = name.into();
        debug_assert!(stride >= 1, "attribute `{name}` has a zero stride");
        debug_assert!(
            stride == 0 || vertices.len() % stride as usize == 0,
            "attribute `{name}` has {} floats which is not a multiple of its stride {stride}",
            vertices.len()
        );
        let attribute = Attribute { stride, vertices };
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name, attribute)),
        }
    }

    /// Builder flavour of [`Geometry::add_attribute`].
    pub fn with_attribute(mut self, name: impl Into<String>, stride: u32, vertices: Vec<f32>) -> Self {
        self.add_attribute(name, stride, vertices);
        self
    }

    /// Replace the index buffer (triangle list).
    pub fn set_index(&mut self, index: Vec<u16>) {
        self.index = index;
    }

    pub fn with_index(mut self, index: Vec<u16>) -> Self {
        self.set_index(index);
        self
    }

    pub fn attributes(&self) -> &[(String, Attribute)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find_map(|(n, attribute)| (n == name).then_some(attribute))
    }

    pub fn index(&self) -> &[u16] {
        &self.index
    }

    pub fn is_indexed(&self) -> bool {
        !self.index.is_empty()
    }

    /// Number of vertices described by the `position` attribute, falling back
    /// to the first attribute when there is none.
    pub fn vertex_count(&self) -> usize {
        self.attribute("position")
            .or_else(|| self.attributes.first().map(|(_, attribute)| attribute))
            .map_or(0, Attribute::vertex_count)
    }
}
