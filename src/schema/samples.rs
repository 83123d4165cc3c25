//! Built-in geometry samples.

use glam::{DMat4, Vec2, Vec3};

use super::{
    FieldSpec, Orientation, Primvar, Purpose, Relationship, Sample, SampleReader, SampleWriter,
    SubdivScheme, Visibility,
};
use crate::util::Result;

const TRANSFORM: FieldSpec = FieldSpec::new("transform").rename("xformOp:transform");
const VISIBILITY: FieldSpec = FieldSpec::new("visibility");
const PURPOSE: FieldSpec = FieldSpec::new("purpose").uniform();

/// Transformable prim.
#[derive(Clone, Debug, PartialEq)]
pub struct XformSample {
    pub transform: DMat4,
    pub visibility: Visibility,
    pub purpose: Purpose,
}

impl Default for XformSample {
    fn default() -> Self {
        Self {
            transform: DMat4::IDENTITY,
            visibility: Visibility::Inherited,
            purpose: Purpose::Default,
        }
    }
}

impl Sample for XformSample {
    fn schema() -> &'static str {
        "Xform"
    }

    fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
        w.value(&TRANSFORM, &self.transform)?;
        w.token(&VISIBILITY, self.visibility)?;
        w.token(&PURPOSE, self.purpose)
    }

    fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
        r.value(&TRANSFORM, &mut self.transform)?;
        r.token(&VISIBILITY, &mut self.visibility)?;
        r.token(&PURPOSE, &mut self.purpose)
    }
}

/// Polygon mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSample {
    pub transform: DMat4,
    pub visibility: Visibility,
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub extent: Vec<Vec3>,
    pub face_vertex_counts: Vec<i32>,
    pub face_vertex_indices: Vec<i32>,
    pub st: Primvar<Vec<Vec2>>,
    pub display_color: Primvar<Vec<Vec3>>,
    pub orientation: Orientation,
    pub subdivision_scheme: SubdivScheme,
    pub material: Relationship,
}

impl Default for MeshSample {
    fn default() -> Self {
        Self {
            transform: DMat4::IDENTITY,
            visibility: Visibility::Inherited,
            points: Vec::new(),
            normals: Vec::new(),
            extent: Vec::new(),
            face_vertex_counts: Vec::new(),
            face_vertex_indices: Vec::new(),
            st: Primvar::default(),
            display_color: Primvar::default(),
            orientation: Orientation::RightHanded,
            subdivision_scheme: SubdivScheme::CatmullClark,
            material: Relationship::default(),
        }
    }
}

impl MeshSample {
    const POINTS: FieldSpec = FieldSpec::new("points");
    const NORMALS: FieldSpec = FieldSpec::new("normals");
    const EXTENT: FieldSpec = FieldSpec::new("extent");
    const FACE_COUNTS: FieldSpec = FieldSpec::new("face_vertex_counts").rename("faceVertexCounts");
    const FACE_INDICES: FieldSpec =
        FieldSpec::new("face_vertex_indices").rename("faceVertexIndices");
    const ST: FieldSpec = FieldSpec::new("st");
    const DISPLAY_COLOR: FieldSpec = FieldSpec::new("display_color").rename("displayColor");
    const ORIENTATION: FieldSpec = FieldSpec::new("orientation").uniform();
    const SUBDIV: FieldSpec = FieldSpec::new("subdivision_scheme")
        .rename("subdivisionScheme")
        .uniform();
    const MATERIAL: FieldSpec = FieldSpec::new("material").rename("binding").namespace("material");

    /// Compute the axis-aligned bounds of `points` into `extent`.
    pub fn update_extent(&mut self) {
        let mut iter = self.points.iter();
        self.extent = match iter.next() {
            Some(first) => {
                let (min, max) = iter.fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
                vec![min, max]
            }
            None => Vec::new(),
        };
    }

    /// Number of triangles after fan triangulation.
    pub fn triangle_count(&self) -> usize {
        self.face_vertex_counts
            .iter()
            .map(|&c| (c.max(2) - 2) as usize)
            .sum()
    }
}

impl Sample for MeshSample {
    fn schema() -> &'static str {
        "Mesh"
    }

    fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
        w.value(&TRANSFORM, &self.transform)?;
        w.token(&VISIBILITY, self.visibility)?;
        w.value(&Self::POINTS, &self.points)?;
        w.value(&Self::NORMALS, &self.normals)?;
        w.value(&Self::EXTENT, &self.extent)?;
        w.value(&Self::FACE_COUNTS, &self.face_vertex_counts)?;
        w.value(&Self::FACE_INDICES, &self.face_vertex_indices)?;
        w.primvar(&Self::ST, &self.st)?;
        w.primvar(&Self::DISPLAY_COLOR, &self.display_color)?;
        w.token(&Self::ORIENTATION, self.orientation)?;
        w.token(&Self::SUBDIV, self.subdivision_scheme)?;
        if !self.material.is_empty() {
            w.relationship(&Self::MATERIAL, &self.material)?;
        }
        Ok(())
    }

    fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
        r.value(&TRANSFORM, &mut self.transform)?;
        r.token(&VISIBILITY, &mut self.visibility)?;
        r.value(&Self::POINTS, &mut self.points)?;
        r.value(&Self::NORMALS, &mut self.normals)?;
        r.value(&Self::EXTENT, &mut self.extent)?;
        r.value(&Self::FACE_COUNTS, &mut self.face_vertex_counts)?;
        r.value(&Self::FACE_INDICES, &mut self.face_vertex_indices)?;
        r.primvar(&Self::ST, &mut self.st)?;
        r.primvar(&Self::DISPLAY_COLOR, &mut self.display_color)?;
        r.token(&Self::ORIENTATION, &mut self.orientation)?;
        r.token(&Self::SUBDIV, &mut self.subdivision_scheme)?;
        r.relationship(&Self::MATERIAL, &mut self.material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_extent() {
        let mut mesh = MeshSample {
            points: vec![Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 0.5)],
            ..Default::default()
        };
        mesh.update_extent();
        assert_eq!(mesh.extent, vec![Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 3.0, 0.5)]);
    }

    #[test]
    fn test_triangle_count() {
        let mesh = MeshSample {
            face_vertex_counts: vec![3, 4, 5],
            ..Default::default()
        };
        assert_eq!(mesh.triangle_count(), 1 + 2 + 3);
    }

    #[test]
    fn test_material_field_name() {
        assert_eq!(MeshSample::MATERIAL.qualified(""), "material:binding");
    }
}
