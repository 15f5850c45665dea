//! Wavefront OBJ/MTL export.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::mesh::{first_appearance, GenericMesh, Material, TextureSlot};
use crate::util::{Result, Vec2, Vec3};

/// Format a float with at most six decimals and no trailing zeros.
pub fn obj_float(value: f32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut s = format!("{:.6}", value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

fn vec3(v: Vec3) -> String {
    format!("{} {} {}", obj_float(v.x), obj_float(v.y), obj_float(v.z))
}

fn vec2(v: Vec2) -> String {
    format!("{} {}", obj_float(v.x), obj_float(v.y))
}

impl GenericMesh {
    /// Corner reference for a face, slashing in only the buffers that have
    /// an entry at `index`.
    fn corner(&self, index: u32) -> String {
        let i = index as usize;
        let n = i + 1;
        match (i < self.texcoords.len(), i < self.normals.len()) {
            (true, true) => format!("{n}/{n}/{n}"),
            (true, false) => format!("{n}/{n}"),
            (false, true) => format!("{n}//{n}"),
            (false, false) => n.to_string(),
        }
    }

    /// Materials in the order faces first use them.
    fn used_materials(&self) -> Vec<&Material> {
        let per_section = self.used_sections().into_iter().flat_map(|section| {
            first_appearance(
                self.faces
                    .iter()
                    .filter(move |f| f.section == section)
                    .map(|f| f.material),
            )
        });
        first_appearance(per_section)
            .into_iter()
            .filter_map(|m| self.materials.get(m))
            .collect()
    }

    /// Write the mesh as OBJ text referencing `mtl_file`.
    ///
    /// Buffers are written as they are; export options are not applied.
    pub fn write_obj<W: Write>(&self, out: &mut W, mtl_file: &str) -> io::Result<()> {
        writeln!(out, "mtllib {}", mtl_file)?;
        for &v in &self.vertices {
            writeln!(out, "v {}", vec3(v))?;
        }
        for &n in &self.normals {
            writeln!(out, "vn {}", vec3(n))?;
        }
        for &t in &self.texcoords {
            writeln!(out, "vt {}", vec2(t))?;
        }

        for section in self.used_sections() {
            let name = self.sections.get(section).map_or("", |s| s.name.as_str());
            writeln!(out, "o {}", name)?;

            let in_section = move || self.faces.iter().filter(move |f| f.section == section);
            for material in first_appearance(in_section().map(|f| f.material)) {
                let name = self.materials.get(material).map_or("", |m| m.name.as_str());
                writeln!(out, "usemtl {}", name)?;
                for face in in_section().filter(|f| f.material == material) {
                    let [a, b, c] = face.indices;
                    writeln!(out, "f {} {} {}", self.corner(a), self.corner(b), self.corner(c))?;
                }
            }
        }
        Ok(())
    }

    /// Write the material library for every material a face uses.
    pub fn write_mtl<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for material in self.used_materials() {
            writeln!(out, "newmtl {}", material.name)?;
            writeln!(out, "Ns 225.000000")?;
            writeln!(out, "Ka 1.000000 1.000000 1.000000")?;
            writeln!(out, "Kd 1.000000 1.000000 1.000000")?;
            writeln!(out, "Ks 0.500000 0.500000 0.500000")?;
            writeln!(out, "Ke 0.000000 0.000000 0.000000")?;
            writeln!(out, "Ni 1.450000")?;
            writeln!(out, "d 1.000000")?;
            writeln!(out, "illum 2")?;
            if let Some(albedo) = material.textures.get(&TextureSlot::Albedo) {
                writeln!(out, "map_Kd {}", albedo)?;
            }
        }
        Ok(())
    }

    /// Apply [`GenericMesh::export_options`] and write `<path>.obj` and
    /// `<path>.mtl`, creating the parent directory if needed.
    pub fn export_obj(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let options = self.export_options;
        self.apply_export_options(&options);

        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let obj_path = path.with_extension("obj");
        let mtl_path = path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut obj = BufWriter::new(File::create(&obj_path)?);
        self.write_obj(&mut obj, &mtl_name)?;
        obj.flush()?;

        let mut mtl = BufWriter::new(File::create(&mtl_path)?);
        self.write_mtl(&mut mtl)?;
        mtl.flush()?;

        info!(path = %obj_path.display(), faces = self.faces.len(), "exported mesh");
        Ok(())
    }
}
