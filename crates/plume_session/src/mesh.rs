//! Occlusion mesh extraction.

use crate::error::MeshError;
use crate::scene::MeshSource;

/// Which engine passes see a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshVisibility {
    /// Occludes particles as seen from the camera.
    pub camera: bool,
    /// Casts shadows into the lighting pass.
    pub lights: bool,
}

impl Default for MeshVisibility {
    fn default() -> Self {
        Self {
            camera: true,
            lights: true,
        }
    }
}

/// A static triangle mesh copied out of the host scene.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    name: String,
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
    visibility: MeshVisibility,
}

impl TriangleMesh {
    /// Copies and validates host mesh geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] if the arrays are not whole triples or a face
    /// references a vertex that does not exist.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn extract<M: MeshSource + ?Sized>(source: &M) -> Result<Self, MeshError> {
        let positions = source.vertex_positions();
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionArity {
                mesh: source.name().to_string(),
                len: positions.len(),
            });
        }
        let indices = source.triangle_indices();
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexArity {
                mesh: source.name().to_string(),
                len: indices.len(),
            });
        }

        let vertices: Vec<[f32; 3]> = positions
            .chunks_exact(3)
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect();

        let vertex_count = vertices.len();
        let check = |index: i64| -> Result<u32, MeshError> {
            if index < 0 || index as u64 >= vertex_count as u64 {
                return Err(MeshError::IndexOutOfRange {
                    mesh: source.name().to_string(),
                    index,
                    vertex_count,
                });
            }
            Ok(index as u32)
        };
        let faces = indices
            .chunks_exact(3)
            .map(|t| -> Result<[u32; 3], MeshError> {
                Ok([check(t[0])?, check(t[1])?, check(t[2])?])
            })
            .collect::<Result<Vec<_>, MeshError>>()?;

        Ok(Self {
            name: source.name().to_string(),
            vertices,
            faces,
            visibility: MeshVisibility::default(),
        })
    }

    /// Host object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Triangle faces.
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Pass visibility.
    #[must_use]
    pub const fn visibility(&self) -> MeshVisibility {
        self.visibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quad {
        positions: Vec<f64>,
        indices: Vec<i64>,
    }

    impl MeshSource for Quad {
        fn name(&self) -> &str {
            "quad"
        }
        fn vertex_positions(&self) -> Vec<f64> {
            self.positions.clone()
        }
        fn triangle_indices(&self) -> Vec<i64> {
            self.indices.clone()
        }
    }

    fn quad() -> Quad {
        Quad {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn test_extract_quad() {
        let mesh = TriangleMesh::extract(&quad()).unwrap();
        assert_eq!(mesh.name(), "quad");
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.vertices()[2], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.faces(), &[[0u32, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.visibility(), MeshVisibility { camera: true, lights: true });
    }

    #[test]
    fn test_out_of_range_index() {
        let mut bad = quad();
        bad.indices[5] = 4;
        assert_eq!(
            TriangleMesh::extract(&bad).unwrap_err(),
            MeshError::IndexOutOfRange {
                mesh: "quad".to_string(),
                index: 4,
                vertex_count: 4
            }
        );

        bad.indices[5] = -1;
        assert!(matches!(
            TriangleMesh::extract(&bad),
            Err(MeshError::IndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_ragged_arrays() {
        let mut bad = quad();
        bad.positions.pop();
        assert!(matches!(
            TriangleMesh::extract(&bad),
            Err(MeshError::PositionArity { len: 11, .. })
        ));

        let mut bad = quad();
        bad.indices.pop();
        assert!(matches!(
            TriangleMesh::extract(&bad),
            Err(MeshError::IndexArity { len: 5, .. })
        ));
    }
}
