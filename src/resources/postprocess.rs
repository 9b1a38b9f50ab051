//! Import-time mesh clean-up shared by every format adapter.
//!
//! Adapters run these in order: [`bake_transform`] (when the format has a node
//! hierarchy), [`generate_smooth_normals`] for meshes without normals and
//! finally [`weld_vertices`].

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::data_structures::scene::{Face, Mesh, Vertex};

/// Triangulate a polygon as a fan around its first index.
///
/// Faces with fewer than three indices are returned unchanged so the processor
/// can count and drop them.
pub fn triangulate(face: Face) -> Vec<Face> {
    if face.indices.len() <= 3 {
        return vec![face];
    }
    let first = face.indices[0];
    face.indices
        .windows(2)
        .skip(1)
        .map(|w| Face::triangle(first, w[0], w[1]))
        .collect()
}

/// Convert a triangle strip into individual triangles with consistent winding.
pub fn strip_to_triangles(indices: &[u32]) -> Vec<Face> {
    indices
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1] && w[1] != w[2] && w[0] != w[2])
        .map(|(i, w)| {
            if i % 2 == 0 {
                Face::triangle(w[0], w[1], w[2])
            } else {
                Face::triangle(w[1], w[0], w[2])
            }
        })
        .collect()
}

/// Convert a triangle fan into individual triangles.
pub fn fan_to_triangles(indices: &[u32]) -> Vec<Face> {
    if indices.len() < 3 {
        return Vec::new();
    }
    triangulate(Face::from(indices.to_vec()))
}

/// Apply a node transform to every vertex of `mesh`.
///
/// Normals use the inverse-transpose of the upper 3x3. Mirroring transforms
/// (negative determinant) flip triangle winding so front faces stay front faces.
pub fn bake_transform(mesh: &mut Mesh, transform: &Matrix4<f32>) {
    if *transform == Matrix4::identity() {
        return;
    }
    let linear = Matrix3::from_cols(
        transform.x.truncate(),
        transform.y.truncate(),
        transform.z.truncate(),
    );
    let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);

    for vertex in mesh.vertices.iter_mut() {
        let p = Vector3::from(vertex.position);
        let p = *transform * Vector4::new(p.x, p.y, p.z, 1.0);
        vertex.position = p.truncate().into();
        if let Some(n) = vertex.normal {
            let n = normal_matrix * Vector3::from(n);
            if n.magnitude2() > 0.0 {
                vertex.normal = Some(n.normalize().into());
            }
        }
    }

    if linear.determinant() < 0.0 {
        for face in mesh.faces.iter_mut().filter(|f| f.is_triangle()) {
            face.indices.swap(1, 2);
        }
    }
}

fn position_key(position: [f32; 3]) -> [u32; 3] {
    position.map(|c| if c == 0.0 { 0 } else { c.to_bits() })
}

/// Fill in normals for a mesh that has none.
///
/// Face normals (area weighted) are accumulated per distinct position so that
/// vertices split only by their UVs still shade smoothly. Vertices that belong
/// to no triangle fall back to +Y.
pub fn generate_smooth_normals(mesh: &mut Mesh) {
    let mut accumulated: HashMap<[u32; 3], Vector3<f32>> = HashMap::new();
    let vertex_count = mesh.vertices.len();

    for face in mesh.faces.iter().filter(|f| f.is_triangle()) {
        let [a, b, c] = [face.indices[0], face.indices[1], face.indices[2]].map(|i| i as usize);
        if a >= vertex_count || b >= vertex_count || c >= vertex_count {
            continue;
        }
        let pa = Vector3::from(mesh.vertices[a].position);
        let pb = Vector3::from(mesh.vertices[b].position);
        let pc = Vector3::from(mesh.vertices[c].position);
        let face_normal = (pb - pa).cross(pc - pa);
        for idx in [a, b, c] {
            *accumulated
                .entry(position_key(mesh.vertices[idx].position))
                .or_insert_with(|| Vector3::new(0.0, 0.0, 0.0)) += face_normal;
        }
    }

    for vertex in mesh.vertices.iter_mut() {
        let normal = accumulated
            .get(&position_key(vertex.position))
            .filter(|n| n.magnitude2() > f32::EPSILON * f32::EPSILON)
            .map(|n| n.normalize())
            .unwrap_or_else(Vector3::unit_y);
        vertex.normal = Some(normal.into());
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 3],
    uv: Option<[u32; 2]>,
    normal: Option<[u32; 3]>,
}

impl From<&Vertex> for VertexKey {
    fn from(v: &Vertex) -> Self {
        Self {
            position: position_key(v.position),
            uv: v.uv.map(|uv| uv.map(f32::to_bits)),
            normal: v.normal.map(|n| n.map(f32::to_bits)),
        }
    }
}

/// Merge vertices whose attributes are bit-identical and remap the faces.
///
/// Returns the number of vertices removed.
pub fn weld_vertices(mesh: &mut Mesh) -> usize {
    let mut lookup: HashMap<VertexKey, u32> = HashMap::with_capacity(mesh.vertices.len());
    let mut remap = Vec::with_capacity(mesh.vertices.len());
    let mut welded: Vec<Vertex> = Vec::with_capacity(mesh.vertices.len());

    for vertex in &mesh.vertices {
        let next = welded.len() as u32;
        let idx = *lookup.entry(VertexKey::from(vertex)).or_insert_with(|| {
            welded.push(*vertex);
            next
        });
        remap.push(idx);
    }

    let removed = mesh.vertices.len() - welded.len();
    if removed == 0 {
        return 0;
    }

    for face in mesh.faces.iter_mut() {
        for index in face.indices.iter_mut() {
            // out-of-range indices stay out of range; the processor rejects them
            if let Some(&mapped) = remap.get(*index as usize) {
                *index = mapped;
            } else {
                *index = u32::MAX;
            }
        }
    }
    mesh.vertices = welded;
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            "quad",
            vec![
                Vertex::new([0.0, 0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0]),
            ],
            vec![Face::from(vec![0, 1, 2, 3])],
        )
    }

    #[test]
    fn fan_triangulation() {
        let faces = triangulate(Face::from(vec![0, 1, 2, 3, 4]));
        assert_eq!(
            faces,
            vec![
                Face::triangle(0, 1, 2),
                Face::triangle(0, 2, 3),
                Face::triangle(0, 3, 4)
            ]
        );
        assert_eq!(triangulate(Face::from(vec![7, 8])), vec![Face::from(vec![7, 8])]);
    }

    #[test]
    fn strip_alternates_winding() {
        let faces = strip_to_triangles(&[0, 1, 2, 3]);
        assert_eq!(faces, vec![Face::triangle(0, 1, 2), Face::triangle(2, 1, 3)]);
    }

    #[test]
    fn flat_quad_normals_point_up_z() {
        let mut mesh = quad();
        mesh.faces = triangulate(mesh.faces.remove(0));
        generate_smooth_normals(&mut mesh);
        for v in &mesh.vertices {
            let n = v.normal.unwrap();
            assert!((n[2] - 1.0).abs() < 1e-6, "{n:?}");
        }
    }

    #[test]
    fn welding_merges_duplicates() {
        let mut mesh = Mesh::new(
            "dups",
            vec![
                Vertex::new([0.0, 0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0]),
            ],
            vec![Face::triangle(0, 1, 2), Face::triangle(3, 5, 4)],
        );
        assert_eq!(weld_vertices(&mut mesh), 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces[1], Face::triangle(1, 3, 2));
    }

    #[test]
    fn mirrored_transform_flips_winding() {
        let mut mesh = quad();
        mesh.faces = vec![Face::triangle(0, 1, 2)];
        bake_transform(&mut mesh, &Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0));
        assert_eq!(mesh.vertices[1].position, [-1.0, 0.0, 0.0]);
        assert_eq!(mesh.faces[0], Face::triangle(0, 2, 1));
    }
}
