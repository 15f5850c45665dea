//! Indexed triangle mesh shared by every geometry decoder.

use std::collections::BTreeMap;

use tracing::debug;

use crate::util::{BBox3f, Mat4, Vec2, Vec3};

/// Texture role within a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureSlot {
    Albedo,
    Opacity,
    AmbientOcclusion,
}

/// Named material. Two materials with the same name are the same material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub textures: BTreeMap<TextureSlot, String>,
}

impl Material {
    /// Create a material without textures.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: BTreeMap::new(),
        }
    }

    /// Builder-style texture assignment.
    pub fn with_texture(mut self, slot: TextureSlot, file: impl Into<String>) -> Self {
        self.textures.insert(slot, file.into());
        self
    }
}

/// Named object/part boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
}

/// Triangle referencing the mesh buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    pub indices: [u32; 3],
    /// Index into [`GenericMesh::materials`].
    pub material: usize,
    /// Index into [`GenericMesh::sections`].
    pub section: usize,
}

impl Face {
    /// Same triangle with the last two corners swapped.
    #[inline]
    pub fn reversed(self) -> Self {
        let [a, b, c] = self.indices;
        Self {
            indices: [a, c, b],
            ..self
        }
    }

    /// Unit normal of the triangle, zero when degenerate.
    ///
    /// Corners outside `vertices` read as the origin.
    pub fn normal(&self, vertices: &[Vec3]) -> Vec3 {
        let [a, b, c] = self
            .indices
            .map(|i| vertices.get(i as usize).copied().unwrap_or_default());
        (b - a).cross(c - a).normalize_or_zero()
    }
}

/// How normals are produced on export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalMode {
    /// Keep decoded normals.
    #[default]
    Unchanged,
    /// Average face normals per vertex.
    Smooth,
    /// One normal per face; vertices are split.
    Flat,
}

/// Options applied to a mesh right before export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    pub matrix: Mat4,
    pub normal_mode: NormalMode,
    pub invert_normals: bool,
    pub reverse_winding: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            normal_mode: NormalMode::Unchanged,
            invert_normals: false,
            reverse_winding: false,
        }
    }
}

/// Vertex/normal/texcoord buffers plus faces grouped by section and material.
///
/// `normals` and `texcoords` may be shorter than `vertices`; consumers check
/// each index instead of assuming parallel arrays.
#[derive(Clone, Debug, Default)]
pub struct GenericMesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub faces: Vec<Face>,
    pub materials: Vec<Material>,
    pub sections: Vec<Section>,
    /// Options used by [`GenericMesh::export_obj`](crate::geom::GenericMesh::export_obj).
    pub export_options: ExportOptions,
    applied: Option<ExportOptions>,
}

impl GenericMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with export options.
    pub fn with_options(export_options: ExportOptions) -> Self {
        Self {
            export_options,
            ..Self::default()
        }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Add a material, returning the index of the existing one with the
    /// same name if there is one.
    pub fn add_material(&mut self, material: Material) -> usize {
        match self.materials.iter().position(|m| m.name == material.name) {
            Some(i) => i,
            None => {
                self.materials.push(material);
                self.materials.len() - 1
            }
        }
    }

    /// Add a section by name, deduplicated like materials.
    pub fn add_section(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        match self.sections.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                self.sections.push(Section { name });
                self.sections.len() - 1
            }
        }
    }

    /// Material by name.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Mutable material by name.
    pub fn material_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.name == name)
    }

    /// Sections in order of their first face.
    pub fn used_sections(&self) -> Vec<usize> {
        first_appearance(self.faces.iter().map(|f| f.section))
    }

    /// Bounding box of all vertices.
    pub fn bounds(&self) -> BBox3f {
        self.vertices.iter().copied().collect()
    }

    /// Options last applied to the buffers, if any.
    pub fn applied_options(&self) -> Option<&ExportOptions> {
        self.applied.as_ref()
    }

    /// Apply export options to the buffers.
    ///
    /// Normals are recomputed first, then positions and normals are
    /// transformed, then winding is reversed. Applying the options that were
    /// applied last is a no-op.
    pub fn apply_export_options(&mut self, options: &ExportOptions) {
        if self.applied.as_ref() == Some(options) {
            return;
        }

        match options.normal_mode {
            NormalMode::Unchanged => {}
            NormalMode::Smooth => self.recalculate_normals_smooth(),
            NormalMode::Flat => self.recalculate_normals_flat(),
        }

        let m = options.matrix;
        let sign = if options.invert_normals { -1.0 } else { 1.0 };
        for v in &mut self.vertices {
            *v = m.transform_point3(*v);
        }
        for n in &mut self.normals {
            *n = (m.transform_vector3(*n) * sign).normalize_or_zero();
        }
        if options.reverse_winding {
            for f in &mut self.faces {
                *f = f.reversed();
            }
        }

        debug!(mode = ?options.normal_mode, faces = self.faces.len(), "applied export options");
        self.applied = Some(*options);
    }

    /// Split every face into its own three vertices sharing one face normal.
    ///
    /// Texcoords follow the split when every vertex has one; otherwise they
    /// are dropped.
    pub fn recalculate_normals_flat(&mut self) {
        let vertices = std::mem::take(&mut self.vertices);
        let texcoords = std::mem::take(&mut self.texcoords);
        let keep_uvs = texcoords.len() >= vertices.len();

        self.normals.clear();
        self.vertices.reserve(self.faces.len() * 3);
        self.normals.reserve(self.faces.len() * 3);

        for face in &mut self.faces {
            let normal = face.normal(&vertices);
            let base = self.vertices.len() as u32;
            for &i in &face.indices {
                self.vertices.push(vertices.get(i as usize).copied().unwrap_or_default());
                self.normals.push(normal);
                if keep_uvs {
                    self.texcoords.push(texcoords.get(i as usize).copied().unwrap_or_default());
                }
            }
            face.indices = [base, base + 1, base + 2];
        }
    }

    /// Replace normals with the average of adjacent face normals.
    ///
    /// A vertex no face touches gets a zero normal.
    pub fn recalculate_normals_smooth(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len()];
        let mut counts = vec![0u32; self.vertices.len()];

        for face in &self.faces {
            let normal = face.normal(&self.vertices);
            // a corner repeated within one face counts once
            for (k, &i) in face.indices.iter().enumerate() {
                if face.indices[..k].contains(&i) || i as usize >= sums.len() {
                    continue;
                }
                sums[i as usize] += normal;
                counts[i as usize] += 1;
            }
        }

        self.normals = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, n)| {
                if n == 0 {
                    Vec3::ZERO
                } else {
                    (sum / n as f32).normalize_or_zero()
                }
            })
            .collect();
    }

    /// Append `other` under `transform`.
    ///
    /// Face indices are offset by this mesh's vertex count and materials and
    /// sections are matched by name.
    pub fn merge(&mut self, other: &GenericMesh, transform: Mat4) {
        let offset = self.vertices.len() as u32;

        // keep attribute i attached to vertex i when self is only partly covered
        if !other.normals.is_empty() && self.normals.len() < self.vertices.len() {
            self.normals.resize(self.vertices.len(), Vec3::ZERO);
        }
        if !other.texcoords.is_empty() && self.texcoords.len() < self.vertices.len() {
            self.texcoords.resize(self.vertices.len(), Vec2::ZERO);
        }

        self.vertices
            .extend(other.vertices.iter().map(|&v| transform.transform_point3(v)));
        self.normals.extend(
            other
                .normals
                .iter()
                .map(|&n| transform.transform_vector3(n).normalize_or_zero()),
        );
        self.texcoords.extend_from_slice(&other.texcoords);

        let materials: Vec<usize> = other
            .materials
            .iter()
            .map(|m| self.add_material(m.clone()))
            .collect();
        let sections: Vec<usize> = other
            .sections
            .iter()
            .map(|s| self.add_section(s.name.clone()))
            .collect();

        self.faces.extend(other.faces.iter().map(|f| Face {
            indices: f.indices.map(|i| i + offset),
            material: materials[f.material],
            section: sections[f.section],
        }));
    }
}

/// Distinct values in order of first appearance.
pub(crate) fn first_appearance(values: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GenericMesh {
        let mut mesh = GenericMesh::new();
        let material = mesh.add_material(Material::new("mat"));
        let section = mesh.add_section("obj");
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.normals = vec![Vec3::X; 3];
        mesh.texcoords = vec![Vec2::ZERO, Vec2::X, Vec2::Y];
        mesh.faces.push(Face {
            indices: [0, 1, 2],
            material,
            section,
        });
        mesh
    }

    #[test]
    fn test_flat_normals() {
        let mut mesh = triangle();
        mesh.recalculate_normals_flat();

        let expected = (Vec3::X - Vec3::ZERO).cross(Vec3::Y - Vec3::ZERO).normalize();
        assert_eq!(mesh.normals, vec![expected; 3]);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.texcoords.len(), 3);
    }

    #[test]
    fn test_flat_splits_shared_vertices() {
        let mut mesh = triangle();
        mesh.vertices.push(Vec3::new(1.0, 1.0, 0.0));
        mesh.texcoords.push(Vec2::ONE);
        mesh.faces.push(Face {
            indices: [1, 3, 2],
            material: 0,
            section: 0,
        });
        mesh.recalculate_normals_flat();

        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.faces[1].indices, [3, 4, 5]);
        assert_eq!(mesh.texcoords[4], Vec2::ONE);
    }

    #[test]
    fn test_flat_drops_partial_texcoords() {
        let mut mesh = triangle();
        mesh.texcoords.truncate(1);
        mesh.recalculate_normals_flat();
        assert!(mesh.texcoords.is_empty());
    }

    #[test]
    fn test_smooth_normals() {
        let mut mesh = triangle();
        mesh.vertices.push(Vec3::splat(9.0));
        mesh.recalculate_normals_smooth();

        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(mesh.normals[0], Vec3::Z);
        assert_eq!(mesh.normals[3], Vec3::ZERO);
    }

    #[test]
    fn test_export_options_idempotent() {
        let mut mesh = triangle();
        let options = ExportOptions {
            matrix: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            normal_mode: NormalMode::Smooth,
            invert_normals: true,
            reverse_winding: true,
        };

        mesh.apply_export_options(&options);
        let vertices = mesh.vertices.clone();
        let normals = mesh.normals.clone();
        let faces = mesh.faces.clone();

        mesh.apply_export_options(&options);
        assert_eq!(mesh.vertices, vertices);
        assert_eq!(mesh.normals, normals);
        assert_eq!(mesh.faces, faces);
        assert_eq!(mesh.faces[0].indices, [0, 2, 1]);
        assert_eq!(mesh.normals[0], Vec3::NEG_Z);
    }

    #[test]
    fn test_changed_options_reapply() {
        let mut mesh = triangle();
        let shift = ExportOptions {
            matrix: Mat4::from_translation(Vec3::X),
            ..ExportOptions::default()
        };
        mesh.apply_export_options(&shift);
        mesh.apply_export_options(&ExportOptions::default());
        mesh.apply_export_options(&shift);
        assert_eq!(mesh.vertices[0], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_merge() {
        let mut a = triangle();
        let mut b = triangle();
        b.add_material(Material::new("other"));
        b.faces[0].material = 1;

        a.merge(&b, Mat4::from_translation(Vec3::Z));

        assert_eq!(a.vertices.len(), 6);
        assert_eq!(a.vertices[3], Vec3::Z);
        assert_eq!(a.faces[1].indices, [3, 4, 5]);
        assert_eq!(a.materials.len(), 2);
        assert_eq!(a.materials[a.faces[1].material].name, "other");
        assert_eq!(a.sections.len(), 1);
    }

    #[test]
    fn test_merge_into_partial_attributes() {
        let mut a = triangle();
        a.normals.clear();
        a.texcoords.truncate(1);
        let b = triangle();

        a.merge(&b, Mat4::IDENTITY);

        assert_eq!(a.normals.len(), 6);
        assert_eq!(a.normals[2], Vec3::ZERO);
        assert_eq!(a.normals[3], Vec3::X);
        assert_eq!(a.texcoords.len(), 6);
        assert_eq!(a.texcoords[4], Vec2::X);
    }

    #[test]
    fn test_material_dedup_by_name() {
        let mut mesh = GenericMesh::new();
        let a = mesh.add_material(Material::new("m").with_texture(TextureSlot::Albedo, "a.png"));
        let b = mesh.add_material(Material::new("m"));
        assert_eq!(a, b);
        assert_eq!(mesh.materials.len(), 1);
        assert!(mesh.materials[0].textures.contains_key(&TextureSlot::Albedo));
    }

    #[test]
    fn test_bounds() {
        let mesh = triangle();
        let b = mesh.bounds();
        assert_eq!(b.min, Vec3::ZERO);
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
