use std::f32::consts::TAU;
use std::path::Path;

use anyhow::{Context, Result};

use super::layout::MeshVertex;

/// Non-indexed triangle list of interleaved position + normal vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
}

impl MeshData {
    /// Parses a raw `3f position + 3f normal` little-endian vertex stream.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let stride = size_of::<MeshVertex>();
        anyhow::ensure!(!bytes.is_empty(), "mesh data is empty");
        anyhow::ensure!(
            bytes.len() % stride == 0,
            "mesh data length {} is not a multiple of the {stride}-byte vertex stride",
            bytes.len()
        );

        let vertices = bytes
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned::<MeshVertex>)
            .collect();

        Ok(Self { vertices })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read mesh {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("invalid mesh {}", path.display()))
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Axis-aligned cube of edge 1 centered at the origin, outward normals.
    pub fn unit_cube() -> Self {
        // (normal, tangent u, tangent v) per face, with u × v = normal.
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];
        const CORNERS: [(f32, f32); 6] = [
            (-0.5, -0.5),
            (0.5, -0.5),
            (0.5, 0.5),
            (-0.5, -0.5),
            (0.5, 0.5),
            (-0.5, 0.5),
        ];

        let mut vertices = Vec::with_capacity(36);
        for (n, u, v) in FACES {
            for (a, b) in CORNERS {
                let position = [
                    n[0] * 0.5 + u[0] * a + v[0] * b,
                    n[1] * 0.5 + u[1] * a + v[1] * b,
                    n[2] * 0.5 + u[2] * a + v[2] * b,
                ];
                vertices.push(MeshVertex { position, normal: n });
            }
        }
        Self { vertices }
    }

    /// Open cylinder along +x from `0` to `length`, normals facing the axis.
    ///
    /// The camera sits inside the tube, so only the inner surface is lit.
    pub fn tube(length: f32, radius: f32, rings: u32, sides: u32) -> Self {
        let rings = rings.max(1);
        let sides = sides.max(3);

        let point = |ring: u32, side: u32| {
            let x = length * ring as f32 / rings as f32;
            let a = TAU * side as f32 / sides as f32;
            let (s, c) = a.sin_cos();
            MeshVertex {
                position: [x, s * radius, c * radius],
                normal: [0.0, -s, -c],
            }
        };

        let mut vertices = Vec::with_capacity((rings * sides * 6) as usize);
        for r in 0..rings {
            for s in 0..sides {
                let p00 = point(r, s);
                let p10 = point(r + 1, s);
                let p01 = point(r, s + 1);
                let p11 = point(r + 1, s + 1);
                vertices.extend_from_slice(&[p00, p01, p11, p00, p11, p10]);
            }
        }
        Self { vertices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interleaved_stream() {
        let cube = MeshData::unit_cube();
        let parsed = MeshData::from_bytes(cube.as_bytes()).unwrap();
        assert_eq!(parsed.vertex_count(), 36);
        assert_eq!(parsed.vertices[7], cube.vertices[7]);
    }

    #[test]
    fn rejects_partial_vertex() {
        assert!(MeshData::from_bytes(&[]).is_err());
        assert!(MeshData::from_bytes(&[0u8; 25]).is_err());
    }

    #[test]
    fn cube_normals_point_outward() {
        for v in MeshData::unit_cube().vertices {
            let d: f32 = (0..3).map(|i| v.position[i] * v.normal[i]).sum();
            assert!((d - 0.5).abs() < 1e-6, "{v:?}");
        }
    }

    #[test]
    fn tube_normals_face_axis() {
        let tube = MeshData::tube(100.0, 5.0, 8, 16);
        assert_eq!(tube.vertex_count(), 8 * 16 * 6);
        for v in &tube.vertices {
            let [x, y, z] = v.position;
            assert!((0.0..=100.0).contains(&x));
            assert!(((y * y + z * z).sqrt() - 5.0).abs() < 1e-4);
            let d = y * v.normal[1] + z * v.normal[2];
            assert!((d + 5.0).abs() < 1e-4);
        }
    }
}
